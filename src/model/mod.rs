//! Constraint models of the sports tournament scheduling problem.
//!
//! Each model owns a backend-neutral [`Formula`] and knows how to turn an assignment of its
//! variables back into a [`Schedule`].

mod direct;
mod formula;
mod permutation;

pub use direct::DirectModel;
pub use formula::*;
pub use permutation::PermutationModel;

use crate::core::{Instance, Schedule};

/// A formulation of the problem together with its solution extractor.
pub trait ScheduleModel {
    /// Returns the formula handed to the solver.
    fn formula(&self) -> &Formula;

    /// Returns the formula for adding constraints between solver calls.
    fn formula_mut(&mut self) -> &mut Formula;

    /// Converts an assignment of the formula's variables into a schedule.
    /// Slots the assignment leaves undetermined hold team 0.
    fn extract(&self, assignment: &Assignment) -> Schedule;
}

/// Optional constraint groups of a model.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ModelOptions {
    /// Adds constraints removing equivalent relabelings of a schedule.
    pub symmetry_breaking: bool,
    /// Adds redundant constraints that strengthen propagation.
    pub implied_constraints: bool,
}

impl ModelOptions {
    #[must_use]
    pub const fn new(symmetry_breaking: bool, implied_constraints: bool) -> Self {
        Self {
            symmetry_breaking,
            implied_constraints,
        }
    }
}

/// The available encodings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Permutes the periods of the round-robin base schedule week by week.
    Permutation,
    /// Assigns a team to every slot of every period and week.
    Direct,
}

impl Encoding {
    /// Builds the model of the instance.
    #[must_use]
    pub fn build(self, instance: &Instance, options: ModelOptions) -> Box<dyn ScheduleModel> {
        match self {
            Self::Permutation => Box::new(PermutationModel::new(instance, options)),
            Self::Direct => Box::new(DirectModel::new(instance, options)),
        }
    }
}

/// Largest number of times a team may play in one period.
pub const PERIOD_CAP: usize = 2;

/// Returns the period cap tightened to `ceil(weeks / periods)`.
#[must_use]
pub fn period_cap(instance: &Instance) -> usize {
    PERIOD_CAP.min(instance.weeks().div_ceil(instance.periods()))
}

/// Returns how often a team must at least play in every period: it plays every week, so the
/// weeks not covered by the cap in the other periods must fall into this one.
#[must_use]
pub fn period_load(instance: &Instance) -> usize {
    let others = period_cap(instance) * (instance.periods() - 1);
    instance.weeks().saturating_sub(others)
}
