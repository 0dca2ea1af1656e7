//! Solving configurations and the search driving them.

mod direct;
#[cfg(feature = "gurobi")]
mod milp;
mod optimizer;
mod permutation;

pub use optimizer::*;

use crate::core::Instance;
use crate::model::{Encoding, ModelOptions};
use crate::solver::Backend;
use std::time::Duration;
use tracing::debug;

/// One way of solving an instance: a model, its options and a backend.
pub trait Variant {
    /// Returns the unique name of the variant.
    fn name(&self) -> &'static str;

    /// Returns the instance size from which the variant is not attempted.
    fn instance_limit(&self) -> Option<usize> {
        None
    }

    /// Searches for a schedule of minimal max imbalance within the budget.
    fn solve(&mut self, instance: &Instance, budget: Duration) -> Optimum;
}

/// Every registered variant.
#[allow(unsafe_code)]
#[linkme::distributed_slice]
pub static VARIANTS: [fn() -> Box<dyn Variant>];

/// Returns the registered variants sorted by name.
#[must_use]
pub fn variants() -> Vec<Box<dyn Variant>> {
    let mut variants: Vec<_> = VARIANTS.iter().map(|init| init()).collect();
    variants.sort_unstable_by_key(|variant| variant.name());
    variants
}

/// A variant building one of the encodings and optimizing it with bound tightening.
#[derive(Clone, Copy, Debug)]
pub struct ModelVariant {
    pub name: &'static str,
    pub encoding: Encoding,
    pub options: ModelOptions,
    pub backend: Backend,
    pub instance_limit: Option<usize>,
}

impl ModelVariant {
    /// Creates a variant on the SAT backend with default encodings.
    #[must_use]
    pub const fn new(name: &'static str, encoding: Encoding, options: ModelOptions) -> Self {
        Self {
            name,
            encoding,
            options,
            backend: Backend::SAT,
            instance_limit: None,
        }
    }

    #[must_use]
    pub const fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub const fn with_instance_limit(mut self, limit: usize) -> Self {
        self.instance_limit = Some(limit);
        self
    }
}

impl Variant for ModelVariant {
    fn name(&self) -> &'static str {
        self.name
    }

    fn instance_limit(&self) -> Option<usize> {
        self.instance_limit
    }

    fn solve(&mut self, instance: &Instance, budget: Duration) -> Optimum {
        let mut model = self.encoding.build(instance, self.options);
        let mut solver = self.backend.create();
        debug!(variant = self.name, solver = solver.name(), "Solving");
        BoundTightening::new(budget).optimize(solver.as_mut(), model.as_mut())
    }
}
