//! Variants repairing the round-robin schedule period by period.

use super::{ModelVariant, Variant};
use crate::model::{Encoding, ModelOptions};

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static ROUND_ROBIN_SAT: fn() -> Box<dyn Variant> = || {
    let options = ModelOptions::new(false, false);
    Box::new(ModelVariant::new("round-robin-sat", Encoding::Permutation, options))
};

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static ROUND_ROBIN_SAT_SYMM: fn() -> Box<dyn Variant> = || {
    let options = ModelOptions::new(true, true);
    Box::new(ModelVariant::new("round-robin-sat-symm", Encoding::Permutation, options))
};
