use super::{ResultCache, ResultRecord};
use crate::core::check_value;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Crash reason recorded when the solver runs out of memory.
pub const OUT_OF_MEMORY: &str = "out-of-memory";

/// Time recorded for failed runs.
pub const FAILURE_TIME: i64 = -1;

/// Objective recorded for failed runs, `2^31 - 1`.
pub const FAILURE_OBJECTIVE: i64 = i32::MAX as i64;

/// Classification of a result record.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Optimal,
    Suboptimal,
    Inconsistent,
    Timeout,
    OutOfMemory,
    Crashed,
}

impl Status {
    /// Returns whether the run produced no acceptable schedule.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::Optimal | Self::Suboptimal)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Optimal => "optimal",
            Self::Suboptimal => "suboptimal",
            Self::Inconsistent => "inconsistent",
            Self::Timeout => "timeout",
            Self::OutOfMemory => "out-of-memory",
            Self::Crashed => "crashed",
        };
        f.write_str(name)
    }
}

/// A classified result as reported in the grid.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StatusRecord {
    pub status: Status,
    pub time: i64,
    pub obj: i64,
}

/// Classified results keyed by variant name, then instance size.
pub type ClassificationGrid = BTreeMap<String, BTreeMap<usize, StatusRecord>>;

/// Classifies a record. The first matching rule wins: out-of-memory, crashed, timeout,
/// inconsistent, suboptimal and finally optimal.
#[must_use]
pub fn classify(record: &ResultRecord, timeout: Duration) -> Status {
    let crash = record.extras.crash_reason.as_deref();
    let solution = record.sol.as_ref().filter(|sol| !sol.is_null());

    match (crash, solution) {
        (Some(OUT_OF_MEMORY), None) => Status::OutOfMemory,
        (Some(_), None) => Status::Crashed,
        (None, None) if record.time >= timeout.as_secs_f64() => Status::Timeout,
        (_, None) => Status::Inconsistent,
        (_, Some(sol)) if check_value(sol).is_err() => Status::Inconsistent,
        _ if record.optimal == Some(true) => Status::Optimal,
        _ => Status::Suboptimal,
    }
}

/// Classifies a record and attaches the reported time and objective.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn status_record(record: &ResultRecord, timeout: Duration) -> StatusRecord {
    let status = classify(record, timeout);
    if status.is_failure() {
        StatusRecord {
            status,
            time: FAILURE_TIME,
            obj: FAILURE_OBJECTIVE,
        }
    } else {
        StatusRecord {
            status,
            time: record.time.floor() as i64,
            obj: record.obj.unwrap_or(FAILURE_OBJECTIVE),
        }
    }
}

/// Adds the records of one instance to the grid.
pub fn classify_results(
    grid: &mut ClassificationGrid,
    teams: usize,
    results: &ResultCache,
    timeout: Duration,
) {
    for (name, record) in results.iter() {
        let row = grid.entry(name.clone()).or_default();
        row.insert(teams, status_record(record, timeout));
    }
}

/// Classifies every `*.json` result file of the directory. The instance size is read from the
/// file name; files without one are skipped.
///
/// # Errors
/// - If the directory or a result file cannot be read.
pub fn check_dir(dir: &Path, timeout: Duration) -> anyhow::Result<ClassificationGrid> {
    let mut grid = ClassificationGrid::new();

    for file in std::fs::read_dir(dir)? {
        let path = file?.path();
        if path.extension() != Some(OsStr::new("json")) {
            continue;
        }

        let teams = match parse_filename(&path) {
            Ok(teams) => teams,
            Err(err) => {
                warn!(path = %path.display(), %err, "Skipping file");
                continue;
            }
        };

        classify_results(&mut grid, teams, &ResultCache::load(&path)?, timeout);
    }

    Ok(grid)
}

/// Reads the instance size from the digits of a file name such as `12.json` or `n12.json`.
fn parse_filename(path: &Path) -> anyhow::Result<usize> {
    static NAME_ERR: &str = "Cannot read instance size from file name";

    let stem = path.file_stem().and_then(OsStr::to_str).ok_or_else(|| anyhow!(NAME_ERR))?;
    let digits: String = stem.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(anyhow!(NAME_ERR));
    }
    Ok(digits.parse()?)
}
