//! Independent correctness checks for tournament schedules.
//!
//! The checks never trust the solver that produced a schedule. Structural problems are
//! fatal and reported alone; the combinatorial checks only run on well-shaped input.

use super::Schedule;
use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use serde_json::Value;

/// Plain nested team identifiers indexed by period, then week.
pub type RawSchedule = Vec<Vec<[i64; 2]>>;

/// A problem found in a candidate schedule.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, thiserror::Error)]
pub enum SolutionError {
    #[error("the solution cannot be empty")]
    Empty,
    #[error("the solution is not a nested list of periods, weeks and matches")]
    Malformed,
    #[error("missing team in the solution or team out of range")]
    MissingTeam,
    #[error("the number of teams should be even")]
    OddTeams,
    #[error("the number of periods is not compliant")]
    PeriodCount,
    #[error("the number of weeks is not compliant")]
    WeekCount,
    #[error("there are duplicated matches")]
    DuplicatedMatches,
    #[error("there are missing matches")]
    MissingMatches,
    #[error("there are self-playing teams")]
    SelfPlay,
    #[error("some teams play multiple times in a week")]
    WeeklyRepeat,
    #[error("some teams play more than twice in the period")]
    PeriodCap,
}

impl SolutionError {
    /// Returns whether the error prevents the combinatorial checks from running.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Empty
                | Self::Malformed
                | Self::MissingTeam
                | Self::OddTeams
                | Self::PeriodCount
                | Self::WeekCount
        )
    }
}

/// Validates a typed schedule.
///
/// # Errors
/// - Every violated property, fatal ones first.
pub fn validate(schedule: &Schedule) -> Result<(), Vec<SolutionError>> {
    check_solution(&schedule.to_raw())
}

/// Validates a loosely-typed schedule, such as the `sol` field of a result file.
///
/// The value is descended until lists of `[home, away]` pairs are found; each such list is
/// taken as one period.
///
/// # Errors
/// - [`SolutionError::Malformed`] if the value contains anything but nested integer lists.
/// - Every violated property of the recovered schedule.
pub fn check_value(value: &Value) -> Result<(), Vec<SolutionError>> {
    let periods = collect_periods(value).map_err(|err| vec![err])?;
    check_solution(&periods)
}

/// Validates a schedule given as plain nested team identifiers.
///
/// # Errors
/// - The fatal errors, if the shape of the schedule does not match its number of teams.
/// - Otherwise every combinatorial property the schedule violates.
pub fn check_solution(periods: &[Vec<[i64; 2]>]) -> Result<(), Vec<SolutionError>> {
    let n = fatal_errors(periods)?;
    let mut errors = Vec::new();

    let mut pairs = HashMap::with_capacity(n * n / 2);
    for &[home, away] in periods.iter().flatten() {
        if home != away {
            *pairs.entry((home.min(away), home.max(away))).or_insert(0_usize) += 1;
        }
    }

    if pairs.values().any(|&count| count > 1) {
        errors.push(SolutionError::DuplicatedMatches);
    }

    if pairs.len() != n * (n - 1) / 2 {
        errors.push(SolutionError::MissingMatches);
    }

    if periods.iter().flatten().any(|[home, away]| home == away) {
        errors.push(SolutionError::SelfPlay);
    }

    if weekly_repeats(periods, n - 1) {
        errors.push(SolutionError::WeeklyRepeat);
    }

    if period_overflows(periods) {
        errors.push(SolutionError::PeriodCap);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks the shape of the schedule and returns the number of teams.
fn fatal_errors(periods: &[Vec<[i64; 2]>]) -> Result<usize, Vec<SolutionError>> {
    let teams: HashSet<i64> = periods.iter().flatten().flatten().copied().collect();
    let Some(&max) = teams.iter().max() else {
        return Err(vec![SolutionError::Empty]);
    };

    let mut errors = Vec::new();

    let n = usize::try_from(max).unwrap_or_default();
    if teams.iter().any(|&team| team < 1) || teams.len() != n {
        errors.push(SolutionError::MissingTeam);
    }

    if n % 2 != 0 {
        errors.push(SolutionError::OddTeams);
    }

    if periods.len() != n / 2 {
        errors.push(SolutionError::PeriodCount);
    }

    if periods.iter().any(|weeks| weeks.len() + 1 != n) {
        errors.push(SolutionError::WeekCount);
    }

    if errors.is_empty() {
        Ok(n)
    } else {
        Err(errors)
    }
}

fn weekly_repeats(periods: &[Vec<[i64; 2]>], weeks: usize) -> bool {
    (0..weeks).any(|week| {
        let mut seen = HashSet::new();
        let week = periods.iter().filter_map(|period| period.get(week));
        !week.flatten().all(|&team| seen.insert(team))
    })
}

/// Returns whether some team plays more than twice in the same period.
pub(crate) fn period_overflows(periods: &[Vec<[i64; 2]>]) -> bool {
    periods.iter().any(|weeks| {
        let mut count = HashMap::new();
        for &team in weeks.iter().flatten() {
            *count.entry(team).or_insert(0_usize) += 1;
        }
        count.values().any(|&c| c > 2)
    })
}

fn collect_periods(value: &Value) -> Result<RawSchedule, SolutionError> {
    let Value::Array(items) = value else {
        return Err(SolutionError::Malformed);
    };

    if !items.is_empty() {
        if let Some(period) = items.iter().map(as_match).collect::<Option<Vec<_>>>() {
            return Ok(vec![period]);
        }
    }

    let mut periods = Vec::new();
    for item in items {
        // An empty list inside a schedule is a period or week without matches.
        if item.as_array().is_some_and(Vec::is_empty) {
            return Err(SolutionError::Malformed);
        }
        periods.extend(collect_periods(item)?);
    }
    Ok(periods)
}

fn as_match(value: &Value) -> Option<[i64; 2]> {
    match value.as_array()?.as_slice() {
        [home, away] => Some([home.as_i64()?, away.as_i64()?]),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{round_robin, Instance};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    fn valid_six() -> RawSchedule {
        vec![
            vec![[6, 1], [1, 5], [3, 5], [2, 4], [6, 3]],
            vec![[5, 2], [4, 6], [2, 6], [1, 3], [5, 4]],
            vec![[4, 3], [3, 2], [4, 1], [6, 5], [2, 1]],
        ]
    }

    #[test]
    fn accepts_valid_schedule() {
        assert_eq!(check_solution(&valid_six()), Ok(()));
    }

    #[test]
    fn rejects_duplicated_match() {
        let mut schedule = valid_six();
        // [2, 1] replaced by the reversed [4, 1] from week 3.
        schedule[2][4] = [1, 4];
        let errors = check_solution(&schedule).unwrap_err();
        assert!(errors.contains(&SolutionError::DuplicatedMatches));
        assert!(errors.contains(&SolutionError::MissingMatches));
        assert!(errors.contains(&SolutionError::WeeklyRepeat));
    }

    #[test]
    fn rejects_self_play() {
        let mut schedule = valid_six();
        schedule[0][0] = [6, 6];
        let errors = check_solution(&schedule).unwrap_err();
        assert!(errors.contains(&SolutionError::SelfPlay));
    }

    #[test]
    fn four_teams_cannot_meet_period_cap() {
        // The only round robin on four teams; every split into two periods overloads a team.
        let weeks = [[[1, 4], [2, 3]], [[4, 2], [1, 3]], [[1, 2], [3, 4]]];
        for mask in 0..8_u32 {
            let mut periods = vec![Vec::new(), Vec::new()];
            for (w, week) in weeks.iter().enumerate() {
                let first = usize::from(mask >> w & 1 == 1);
                periods[0].push(week[first]);
                periods[1].push(week[1 - first]);
            }
            assert_eq!(check_solution(&periods), Err(vec![SolutionError::PeriodCap]));
        }
    }

    #[test]
    fn four_teams_duplicated_match_is_reported() {
        let periods = vec![vec![[1, 4], [4, 2], [2, 3]], vec![[2, 3], [1, 3], [3, 4]]];
        let errors = check_solution(&periods).unwrap_err();
        assert!(errors.contains(&SolutionError::DuplicatedMatches));
        assert!(!errors.iter().any(SolutionError::is_fatal));
    }

    #[test]
    fn fatal_errors_stop_semantic_checks() {
        assert_eq!(check_solution(&[]), Err(vec![SolutionError::Empty]));

        let odd = vec![vec![[1, 2], [2, 3]], vec![[3, 1], [1, 2]]];
        assert_eq!(
            check_solution(&odd),
            Err(vec![SolutionError::OddTeams, SolutionError::PeriodCount])
        );

        let mut missing_week = valid_six();
        missing_week[1].pop();
        assert_eq!(check_solution(&missing_week), Err(vec![SolutionError::WeekCount]));

        let mut negative = valid_six();
        negative[0][0] = [-1, 1];
        let errors = check_solution(&negative).unwrap_err();
        assert_eq!(errors[0], SolutionError::MissingTeam);
        assert!(errors.iter().all(SolutionError::is_fatal));
    }

    #[test]
    fn round_robin_without_period_fix_is_rejected() -> anyhow::Result<()> {
        let schedule = round_robin(&Instance::new(6)?);
        assert_eq!(validate(&schedule), Err(vec![SolutionError::PeriodCap]));
        Ok(())
    }

    #[test]
    fn loose_values_are_descended() {
        let value = serde_json::to_value(valid_six()).unwrap_or_default();
        assert_eq!(check_value(&value), Ok(()));

        let wrapped = json!([valid_six()]);
        assert_eq!(check_value(&wrapped), Ok(()));

        assert_eq!(check_value(&json!("N/A")), Err(vec![SolutionError::Malformed]));
        assert_eq!(check_value(&json!([])), Err(vec![SolutionError::Empty]));
        assert_eq!(
            check_value(&json!([[[1, 2], [3]]])),
            Err(vec![SolutionError::Malformed])
        );
    }

    #[test]
    fn empty_periods_and_weeks_are_malformed() {
        let mut extra_period = serde_json::to_value(valid_six()).unwrap_or_default();
        if let Some(periods) = extra_period.as_array_mut() {
            periods.push(json!([]));
        }
        assert_eq!(check_value(&extra_period), Err(vec![SolutionError::Malformed]));

        let mut schedule = serde_json::to_value(valid_six()).unwrap_or_default();
        if let Some(period) = schedule[0].as_array_mut() {
            period.push(json!([]));
        }
        assert_eq!(check_value(&schedule), Err(vec![SolutionError::Malformed]));
        assert_eq!(check_value(&json!([valid_six(), []])), Err(vec![SolutionError::Malformed]));
    }

    #[test]
    fn random_mutations_are_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let mut schedule = valid_six();
            let (p, w) = (rng.gen_range(0..3), rng.gen_range(0..5));
            let (q, v) = (rng.gen_range(0..3), rng.gen_range(0..5));
            if schedule[p][w] == schedule[q][v] {
                continue;
            }
            schedule[p][w] = schedule[q][v];
            assert!(check_solution(&schedule).is_err());
        }
    }

    proptest! {
        #[test]
        fn validation_is_pure(period in 0_usize..3, week in 0_usize..5, home in 0_i64..8, away in 0_i64..8) {
            let mut schedule = valid_six();
            schedule[period][week] = [home, away];
            prop_assert_eq!(check_solution(&schedule), check_solution(&schedule));
        }
    }
}
