#![deny(clippy::all, clippy::cargo, clippy::expect_used, clippy::unwrap_used)]
#![deny(clippy::pedantic, clippy::nursery, unsafe_code)]
#![warn(clippy::unimplemented, clippy::redundant_type_annotations)]

//! Sports tournament scheduling: round-robin schedules where every team plays at most twice
//! in each period, searched with SAT and MILP models that minimize the home/away imbalance.

pub mod algo;
pub mod core;
pub mod data;
pub mod model;
pub mod solver;
