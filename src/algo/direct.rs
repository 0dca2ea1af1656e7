//! Variants of the direct encoding on the SAT backend.

use super::{ModelVariant, Variant};
use crate::model::{Encoding, ModelOptions};
use crate::solver::{AtMostK, AtMostOne, Backend};

const fn direct(name: &'static str, symmetry: bool, implied: bool) -> ModelVariant {
    ModelVariant::new(name, Encoding::Direct, ModelOptions::new(symmetry, implied))
}

const fn sat(at_most_one: AtMostOne, at_most_k: AtMostK) -> Backend {
    Backend::Sat {
        at_most_one,
        at_most_k,
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_SAT: fn() -> Box<dyn Variant> =
    || Box::new(direct("direct-sat", false, false));

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_SAT_SYMM: fn() -> Box<dyn Variant> =
    || Box::new(direct("direct-sat-symm", true, false));

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_SAT_SYMM_IMPLIED: fn() -> Box<dyn Variant> =
    || Box::new(direct("direct-sat-symm-implied", true, true));

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_SAT_HEULE: fn() -> Box<dyn Variant> = || {
    let backend = sat(AtMostOne::Heule, AtMostK::Sequential);
    Box::new(direct("direct-sat-heule", true, false).with_backend(backend))
};

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_SAT_BITWISE: fn() -> Box<dyn Variant> = || {
    let backend = sat(AtMostOne::Bitwise, AtMostK::Sequential);
    Box::new(direct("direct-sat-bitwise", true, false).with_backend(backend))
};

// Pairwise encodings grow too fast beyond ten teams.
#[allow(unsafe_code)]
#[linkme::distributed_slice(super::VARIANTS)]
static DIRECT_SAT_PAIRWISE: fn() -> Box<dyn Variant> = || {
    let backend = sat(AtMostOne::Pairwise, AtMostK::Pairwise);
    let variant = direct("direct-sat-pairwise", true, false).with_backend(backend);
    Box::new(variant.with_instance_limit(12))
};
