mod instance;
mod round_robin;
mod schedule;
pub mod validation;

pub use instance::*;
pub use round_robin::*;
pub use schedule::*;
pub use validation::{check_solution, check_value, validate, SolutionError};
