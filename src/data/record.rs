use crate::algo::{Optimum, Termination};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Diagnostics attached to a result record.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Extras {
    /// Why the solver stopped abnormally, `"out-of-memory"` for memory exhaustion.
    #[serde(default)]
    pub crash_reason: Option<String>,
    /// Seconds from the start of the run to the last improving solution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_last_solution: Option<f64>,
    /// Number of improving solutions found.
    #[serde(default)]
    pub incumbents: usize,
}

/// The outcome of one variant on one instance, as stored in result files.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ResultRecord {
    /// Whole seconds until the verdict, or the timeout when the budget ran out.
    pub time: f64,
    #[serde(default)]
    pub optimal: Option<bool>,
    #[serde(default)]
    pub obj: Option<i64>,
    /// The schedule, kept loosely typed so that files of other tools can be checked.
    #[serde(default)]
    pub sol: Option<Value>,
    #[serde(rename = "_extras", default)]
    pub extras: Extras,
}

impl ResultRecord {
    /// Converts the result of a search into a record.
    ///
    /// # Errors
    /// - If the schedule cannot be serialized.
    pub fn from_optimum(optimum: &Optimum, timeout: Duration) -> serde_json::Result<Self> {
        let time = match optimum.termination {
            Termination::Unknown | Termination::Budget => timeout,
            _ => optimum.elapsed.min(timeout),
        };

        let sol = optimum.schedule.as_ref().map(serde_json::to_value).transpose()?;

        Ok(Self {
            time: seconds(time),
            optimal: Some(optimum.optimal),
            obj: optimum.objective.map(i64::from),
            sol,
            extras: Extras {
                crash_reason: optimum.failure.as_ref().map(ToString::to_string),
                time_to_last_solution: optimum.time_to_last_solution().map(|t| t.as_secs_f64()),
                incumbents: optimum.incumbents.len(),
            },
        })
    }

    /// The record of a variant not attempted on the instance.
    #[must_use]
    pub fn skipped(timeout: Duration) -> Self {
        Self {
            time: seconds(timeout),
            optimal: Some(false),
            ..Self::default()
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn seconds(duration: Duration) -> f64 {
    duration.as_secs() as f64
}
