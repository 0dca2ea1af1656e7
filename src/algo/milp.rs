//! Variants of the direct encoding minimized natively by Gurobi.

use super::{ModelVariant, Variant};
use crate::model::{Encoding, ModelOptions};
use crate::solver::Backend;

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_MILP: fn() -> Box<dyn Variant> = || {
    let options = ModelOptions::new(false, false);
    let variant = ModelVariant::new("direct-milp", Encoding::Direct, options);
    Box::new(variant.with_backend(Backend::Milp))
};

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_MILP_SYMM: fn() -> Box<dyn Variant> = || {
    let options = ModelOptions::new(true, true);
    let variant = ModelVariant::new("direct-milp-symm", Encoding::Direct, options);
    Box::new(variant.with_backend(Backend::Milp))
};
