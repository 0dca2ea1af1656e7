//! Result files: records, the per-run cache, the battery runner and the classifier.

mod check;
mod record;
mod run;

pub use check::*;
pub use record::*;
pub use run::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;

/// Serializes the value as pretty-printed JSON.
///
/// # Errors
/// - If the value cannot be represented as JSON.
pub fn to_string<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Reads a JSON value from the reader.
///
/// # Errors
/// - If the reader fails or its content does not describe a `T`.
pub fn deserialize<T: DeserializeOwned>(reader: &mut impl Read) -> serde_json::Result<T> {
    serde_json::from_reader(reader)
}
