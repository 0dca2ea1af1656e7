use super::Team;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

/// A match between two teams with a fixed home/away orientation.
/// Serialized as `[home, away]`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "[Team; 2]", into = "[Team; 2]")]
pub struct Match {
    pub home: Team,
    pub away: Team,
}

impl Match {
    /// Creates a new match.
    #[must_use]
    pub const fn new(home: Team, away: Team) -> Self {
        Self { home, away }
    }

    /// Returns whether the team plays in this match.
    #[must_use]
    pub const fn involves(&self, team: Team) -> bool {
        self.home == team || self.away == team
    }

    /// Returns the teams ordered by identifier, ignoring orientation.
    #[must_use]
    pub fn pair(&self) -> (Team, Team) {
        (self.home.min(self.away), self.home.max(self.away))
    }
}

impl From<[Team; 2]> for Match {
    fn from([home, away]: [Team; 2]) -> Self {
        Self { home, away }
    }
}

impl From<Match> for [Team; 2] {
    fn from(value: Match) -> Self {
        [value.home, value.away]
    }
}

/// A complete tournament schedule indexed by period, then week.
/// Serialized as a nested list of shape `[n/2][n-1][2]`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    periods: Vec<Vec<Match>>,
}

impl Schedule {
    /// Creates a schedule from matches indexed by period, then week.
    #[must_use]
    pub const fn new(periods: Vec<Vec<Match>>) -> Self {
        Self { periods }
    }

    /// Creates a schedule from matches indexed by week, then period.
    #[must_use]
    pub fn from_weeks(weeks: &[Vec<Match>]) -> Self {
        Self::new(transpose(weeks))
    }

    /// Returns the matches indexed by period, then week.
    #[must_use]
    pub fn periods(&self) -> &[Vec<Match>] {
        &self.periods
    }

    /// Returns the matches indexed by week, then period.
    #[must_use]
    pub fn weeks(&self) -> Vec<Vec<Match>> {
        transpose(&self.periods)
    }

    /// Returns the match played in the given period and week (both zero-based).
    #[must_use]
    pub fn get(&self, period: usize, week: usize) -> Option<&Match> {
        self.periods.get(period).and_then(|weeks| weeks.get(week))
    }

    /// Returns the number of teams taking part, twice the number of periods.
    #[must_use]
    pub fn teams(&self) -> usize {
        self.periods.len() * 2
    }

    /// Iterates over all matches in period-major order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> + '_ {
        self.periods.iter().flatten()
    }

    /// Returns `|home - away|` for every team, indexed by `team - 1`.
    /// Teams outside `[1, n]` are ignored.
    #[must_use]
    pub fn imbalances(&self) -> Vec<u32> {
        let mut balance = vec![0_i64; self.teams()];
        for game in self.matches() {
            if let Some(home) = slot(&mut balance, game.home) {
                *home += 1;
            }
            if let Some(away) = slot(&mut balance, game.away) {
                *away -= 1;
            }
        }
        balance
            .into_iter()
            .map(|b| u32::try_from(b.unsigned_abs()).unwrap_or(u32::MAX))
            .collect()
    }

    /// Returns the objective value: the largest home/away imbalance of any team.
    #[must_use]
    pub fn max_imbalance(&self) -> u32 {
        self.imbalances().into_iter().max().unwrap_or_default()
    }

    /// Converts the schedule into plain nested team identifiers.
    #[must_use]
    pub fn to_raw(&self) -> Vec<Vec<[i64; 2]>> {
        self.periods
            .iter()
            .map(|weeks| {
                let raw = weeks.iter().map(|m| [i64::from(m.home), i64::from(m.away)]);
                raw.collect()
            })
            .collect()
    }
}

fn slot(balance: &mut [i64], team: Team) -> Option<&mut i64> {
    let index = usize::try_from(team).ok()?.checked_sub(1)?;
    balance.get_mut(index)
}

fn transpose(rows: &[Vec<Match>]) -> Vec<Vec<Match>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or_default();
    (0..width)
        .map(|column| rows.iter().filter_map(|row| row.get(column).copied()).collect())
        .collect()
}

impl Display for Schedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for (period, weeks) in self.periods.iter().enumerate() {
            write!(f, "P{:<2}", period + 1)?;
            for game in weeks {
                write!(f, " {:>3}-{:<3}", game.home, game.away)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
