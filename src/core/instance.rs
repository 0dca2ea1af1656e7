use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Team identifier. Teams are numbered from 1 to `n`.
pub type Team = u32;

/// Reasons an instance size is rejected before any model is built.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InstanceError {
    #[error("the number of teams must be even, got {0}")]
    Odd(usize),
    #[error("the number of teams must be at least 4, got {0}")]
    TooSmall(usize),
}

/// An instance of the sports tournament scheduling problem.
/// It is fully described by the even number of teams.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Instance {
    teams: usize,
}

impl Instance {
    /// Creates a new instance with `teams` teams.
    ///
    /// # Errors
    /// - If `teams` is odd.
    /// - If `teams` is smaller than 4.
    pub const fn new(teams: usize) -> Result<Self, InstanceError> {
        if teams % 2 != 0 {
            Err(InstanceError::Odd(teams))
        } else if teams < 4 {
            Err(InstanceError::TooSmall(teams))
        } else {
            Ok(Self { teams })
        }
    }

    /// Returns the number of teams.
    #[must_use]
    pub const fn teams(&self) -> usize {
        self.teams
    }

    /// Returns the number of weeks, `n - 1`.
    #[must_use]
    pub const fn weeks(&self) -> usize {
        self.teams - 1
    }

    /// Returns the number of periods, `n / 2`.
    #[must_use]
    pub const fn periods(&self) -> usize {
        self.teams / 2
    }

    /// Zero-based team indices.
    #[must_use]
    pub const fn team_indices(&self) -> Range<usize> {
        0..self.teams
    }

    /// Zero-based week indices.
    #[must_use]
    pub const fn week_indices(&self) -> Range<usize> {
        0..self.weeks()
    }

    /// Zero-based period indices.
    #[must_use]
    pub const fn period_indices(&self) -> Range<usize> {
        0..self.periods()
    }
}

impl TryFrom<usize> for Instance {
    type Error = InstanceError;

    fn try_from(teams: usize) -> Result<Self, Self::Error> {
        Self::new(teams)
    }
}

impl From<Instance> for usize {
    fn from(instance: Instance) -> Self {
        instance.teams
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.teams)
    }
}
