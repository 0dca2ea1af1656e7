//! Constraint solving backends.
//!
//! A backend receives a [`Formula`] together with a wall-clock budget and reports whether the
//! formula is satisfiable. Backends able to minimize the objective natively say so through
//! [`ConstraintSolver::minimizes`].

mod cardinality;
#[cfg(feature = "gurobi")]
mod gurobi;
mod sat;

pub use cardinality::*;
#[cfg(feature = "gurobi")]
pub use gurobi::Milp;
pub use sat::Sat;

use crate::model::{Assignment, Formula};
use std::time::Duration;

/// The verdict of one solver call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// The formula is satisfiable. For minimizing backends the assignment is optimal.
    Satisfiable(Assignment),
    Unsatisfiable,
    /// The budget ran out before a verdict.
    Unknown,
}

/// An assignment reported by a backend before its final verdict.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Intermediate {
    /// Time since the solver call started.
    pub elapsed: Duration,
    pub assignment: Assignment,
}

/// Result of one solver call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub status: Status,
    /// Improving assignments in the order they were found.
    pub intermediate: Vec<Intermediate>,
}

impl Outcome {
    #[must_use]
    pub const fn new(status: Status) -> Self {
        Self {
            status,
            intermediate: Vec::new(),
        }
    }
}

/// Abnormal termination of a backend.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("out-of-memory")]
    OutOfMemory,
    #[error("{0}")]
    Crashed(String),
}

/// Solves formulas under a time budget.
pub trait ConstraintSolver {
    /// Returns the name of the backend.
    fn name(&self) -> &'static str;

    /// Returns whether the backend minimizes the objective of the formula on its own.
    /// A satisfiable verdict of such a backend proves optimality.
    fn minimizes(&self) -> bool {
        false
    }

    /// Solves the formula, giving up once `timeout` has elapsed.
    ///
    /// # Errors
    /// - If the backend runs out of memory or fails otherwise.
    fn solve(&mut self, formula: &Formula, timeout: Duration) -> Result<Outcome, SolveError>;
}

/// The available backends.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
    /// CDCL SAT solving of the CNF lowering of the formula.
    Sat {
        at_most_one: AtMostOne,
        at_most_k: AtMostK,
    },
    /// Mixed integer programming with native minimization.
    #[cfg(feature = "gurobi")]
    Milp,
}

impl Backend {
    /// SAT backend with the default cardinality encodings.
    pub const SAT: Self = Self::Sat {
        at_most_one: AtMostOne::Sequential,
        at_most_k: AtMostK::Sequential,
    };

    /// Creates a fresh solver of this backend.
    #[must_use]
    pub fn create(self) -> Box<dyn ConstraintSolver> {
        match self {
            Self::Sat {
                at_most_one,
                at_most_k,
            } => Box::new(Sat::new(at_most_one, at_most_k)),
            #[cfg(feature = "gurobi")]
            Self::Milp => Box::new(Milp),
        }
    }
}
