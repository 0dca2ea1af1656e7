use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sts::algo::{self, Variant};
use sts::core::{check_value, round_robin, Instance, SolutionError};
use sts::data::{self, ResultCache, RunConfig};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct VariantName(&'static str);

impl std::fmt::Display for VariantName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ValueEnum for VariantName {
    fn value_variants<'a>() -> &'a [Self] {
        static NAMES: std::sync::LazyLock<Vec<VariantName>> = std::sync::LazyLock::new(|| {
            algo::variants().iter().map(|variant| VariantName(variant.name())).collect()
        });

        NAMES.as_slice()
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.0))
    }
}

/// Application searching for balanced sports tournament schedules.
#[derive(Debug, Parser)]
enum Application {
    /// Run the variant battery on one instance.
    Solve {
        /// The number of teams.
        teams: usize,
        /// Time budget of every variant in seconds.
        #[clap(short, long, default_value = "300")]
        timeout: u64,
        /// Run only these variants.
        #[clap(long, value_delimiter = ',')]
        only: Vec<VariantName>,
        /// Exclude these variants.
        #[clap(short, long, value_delimiter = ',')]
        exclude: Vec<VariantName>,
        /// Directory of the result files. Results are merged into `<DIR>/<teams>.json`.
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Solve again even if the result file already holds a record.
        #[clap(long)]
        no_cache: bool,
    },
    /// Classify every result file of a directory.
    Check {
        /// The input directory.
        input: PathBuf,
        /// The timeout the results were produced with, in seconds.
        #[clap(short, long, default_value = "300")]
        timeout: u64,
    },
    /// Validate a schedule, a result record or a result file.
    Validate { file: PathBuf },
    /// List the registered variants.
    List,
    /// Print the round-robin base schedule.
    Generate { teams: usize },
}

fn names(selection: &[VariantName]) -> Vec<String> {
    selection.iter().map(|name| name.0.to_owned()).collect()
}

fn solve(
    teams: usize,
    config: &RunConfig,
    output: Option<&Path>,
    use_cache: bool,
) -> anyhow::Result<()> {
    let instance = Instance::new(teams)?;
    let path = output.map(|dir| dir.join(format!("{teams}.json")));

    let mut stored = match &path {
        Some(path) => ResultCache::load(path)?,
        None => ResultCache::default(),
    };
    let cache = if use_cache {
        stored.clone()
    } else {
        ResultCache::default()
    };

    let results = data::run(&instance, config, &cache)?;
    println!("{}", data::to_string(&results)?);

    if let Some(path) = path {
        stored.extend(results);
        stored.save(&path)?;
    }
    Ok(())
}

/// Returns the schedules held by the value together with their labels.
fn schedules(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(record) if record.contains_key("sol") => {
            vec![(String::from("sol"), &record["sol"])]
        }
        Value::Object(records) => records
            .iter()
            .filter_map(|(name, record)| record.get("sol").map(|sol| (name.clone(), sol)))
            .filter(|(_, sol)| !sol.is_null())
            .collect(),
        _ => vec![(String::from("schedule"), value)],
    }
}

/// Checks every schedule held by the value, printing one verdict per schedule.
fn validate_value(value: &Value) -> anyhow::Result<()> {
    let schedules = schedules(value);
    if schedules.is_empty() {
        bail!("no schedule to validate");
    }

    let mut invalid = 0_usize;
    for (label, schedule) in schedules {
        match check_value(schedule) {
            Ok(()) => println!("{label}: VALID"),
            Err(errors) => {
                invalid += 1;
                let messages = errors.iter().map(SolutionError::to_string);
                println!("{label}: INVALID");
                messages.for_each(|message| println!("  {message}"));
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} invalid schedule(s)");
    }
    Ok(())
}

fn validate(file: &Path) -> anyhow::Result<()> {
    let value: Value = data::deserialize(&mut BufReader::new(std::fs::File::open(file)?))?;
    validate_value(&value).with_context(|| format!("validating {}", file.display()))
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sts=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match Application::parse() {
        Application::Solve {
            teams,
            timeout,
            only,
            exclude,
            output,
            no_cache,
        } => {
            let config = RunConfig {
                timeout: Duration::from_secs(timeout),
                only: names(&only),
                exclude: names(&exclude),
            };
            solve(teams, &config, output.as_deref(), !no_cache)
        }
        Application::Check { input, timeout } => {
            let grid = data::check_dir(&input, Duration::from_secs(timeout))?;
            println!("{}", data::to_string(&grid)?);
            Ok(())
        }
        Application::Validate { file } => validate(&file),
        Application::List => {
            algo::variants().iter().for_each(|variant| println!("{}", variant.name()));
            Ok(())
        }
        Application::Generate { teams } => {
            let schedule = round_robin(&Instance::new(teams)?);
            print!("{schedule}");
            println!("max imbalance: {}", schedule.max_imbalance());
            Ok(())
        }
    }
}
