use super::{classify, deserialize, to_string, ResultRecord, Status};
use crate::algo::{variants, Variant};
use crate::core::Instance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Result records of one instance keyed by variant name.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultCache(BTreeMap<String, ResultRecord>);

impl ResultCache {
    /// Reads the records stored at `path`. A missing file is an empty cache.
    ///
    /// # Errors
    /// - If the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.try_exists()? {
            return Ok(Self::default());
        }
        Ok(deserialize(&mut BufReader::new(File::open(path)?))?)
    }

    /// Writes the records to `path`, creating its directory if needed.
    ///
    /// # Errors
    /// - If the directory or the file cannot be written.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        File::create(path)?.write_all(to_string(self)?.as_bytes())?;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, variant: &str) -> Option<&ResultRecord> {
        self.0.get(variant)
    }

    pub fn insert(&mut self, variant: String, record: ResultRecord) {
        self.0.insert(variant, record);
    }

    /// Adds every record of `other`, replacing records of the same variant.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, ResultRecord> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResultCache {
    type Item = (&'a String, &'a ResultRecord);
    type IntoIter = std::collections::btree_map::Iter<'a, String, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Settings of one battery run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Budget of every variant.
    pub timeout: Duration,
    /// When not empty, only these variants run.
    pub only: Vec<String>,
    pub exclude: Vec<String>,
}

impl RunConfig {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            only: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Returns whether the variant takes part in the run.
    #[must_use]
    pub fn selects(&self, variant: &str) -> bool {
        (self.only.is_empty() || self.only.iter().any(|name| name == variant))
            && !self.exclude.iter().any(|name| name == variant)
    }
}

/// Runs every registered variant selected by the configuration on the instance.
///
/// # Errors
/// - If a schedule cannot be converted into a record.
pub fn run(
    instance: &Instance,
    config: &RunConfig,
    cache: &ResultCache,
) -> serde_json::Result<ResultCache> {
    run_variants(instance, config, cache, variants())
}

/// Runs the given variants one after another. Cached records are reused without solving.
///
/// # Errors
/// - If a schedule cannot be converted into a record.
pub fn run_variants(
    instance: &Instance,
    config: &RunConfig,
    cache: &ResultCache,
    variants: impl IntoIterator<Item = Box<dyn Variant>>,
) -> serde_json::Result<ResultCache> {
    let mut results = ResultCache::default();

    for mut variant in variants {
        let name = variant.name();
        if !config.selects(name) {
            continue;
        }

        let record = if let Some(record) = cache.get(name) {
            info!(variant = name, "Using cached result");
            record.clone()
        } else if variant.instance_limit().is_some_and(|limit| instance.teams() >= limit) {
            info!(variant = name, teams = instance.teams(), "Instance too large, skipping");
            ResultRecord::skipped(config.timeout)
        } else {
            info!(variant = name, teams = instance.teams(), "Solving");
            let optimum = variant.solve(instance, config.timeout);
            ResultRecord::from_optimum(&optimum, config.timeout)?
        };

        let status = classify(&record, config.timeout);
        match status {
            Status::OutOfMemory | Status::Crashed => {
                let reason = record.extras.crash_reason.as_deref().unwrap_or_default();
                warn!(variant = name, %status, reason, "Solver failed");
            }
            Status::Inconsistent => warn!(variant = name, "Solution rejected by the validator"),
            _ => info!(variant = name, %status, obj = ?record.obj, time = record.time, "Done"),
        }

        results.insert(name.to_owned(), record);
    }

    Ok(results)
}
