use super::{Instance, Match, Schedule, Team};

/// Orients the match between two teams with the parity rule:
/// the smaller team plays home when the sum of both identifiers is even.
#[must_use]
pub const fn parity_match(first: Team, second: Team) -> Match {
    let (low, high) = if first < second {
        (first, second)
    } else {
        (second, first)
    };

    if (low + high) % 2 == 0 {
        Match::new(low, high)
    } else {
        Match::new(high, low)
    }
}

/// Generates the round-robin base schedule with the circle method.
///
/// Team 1 stays fixed while the other teams rotate by one position after each week.
/// In week `w` the team at position `p` of the circle meets the team at position `n - 1 - p`,
/// and the match is placed in period `p`. Every pair of teams meets exactly once and every team
/// plays once a week, but a team may appear more than twice in the same period.
#[must_use]
pub fn round_robin(instance: &Instance) -> Schedule {
    let n = instance.teams();
    let mut circle: Vec<Team> = (1..).take(n).collect();
    let mut weeks = Vec::with_capacity(instance.weeks());

    for _ in instance.week_indices() {
        let week = instance
            .period_indices()
            .map(|p| parity_match(circle[p], circle[n - 1 - p]))
            .collect();
        weeks.push(week);

        circle[1..].rotate_right(1);
    }

    Schedule::from_weeks(&weeks)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::validation::period_overflows;
    use ahash::{HashSet, HashSetExt};
    use proptest::prelude::*;

    #[test]
    fn round_robin_six_teams() -> anyhow::Result<()> {
        let schedule = round_robin(&Instance::new(6)?);
        let weeks = schedule.weeks();
        assert_eq!(weeks[0], vec![Match::new(6, 1), Match::new(5, 2), Match::new(4, 3)]);
        assert_eq!(weeks[1], vec![Match::new(1, 5), Match::new(4, 6), Match::new(3, 2)]);
        assert_eq!(weeks[4], vec![Match::new(2, 1), Match::new(6, 3), Match::new(5, 4)]);
        Ok(())
    }

    #[test]
    fn parity_rule_orients_matches() {
        assert_eq!(parity_match(1, 3), Match::new(1, 3));
        assert_eq!(parity_match(3, 1), Match::new(1, 3));
        assert_eq!(parity_match(1, 2), Match::new(2, 1));
        assert_eq!(parity_match(6, 5), Match::new(6, 5));
    }

    #[test]
    fn base_schedule_may_break_period_cap() -> anyhow::Result<()> {
        let schedule = round_robin(&Instance::new(8)?);
        assert!(period_overflows(&schedule.to_raw()));
        Ok(())
    }

    proptest! {
        #[test]
        fn every_pair_meets_once_and_weeks_are_perfect(half in 2_usize..12) {
            let instance = Instance::new(half * 2).unwrap();
            let schedule = round_robin(&instance);
            let n = instance.teams();

            prop_assert_eq!(schedule.periods().len(), instance.periods());
            let mut pairs = HashSet::new();
            for week in schedule.weeks() {
                let mut seen = HashSet::new();
                for game in &week {
                    prop_assert_ne!(game.home, game.away);
                    prop_assert!(seen.insert(game.home));
                    prop_assert!(seen.insert(game.away));
                    prop_assert!(pairs.insert(game.pair()));
                }
                prop_assert_eq!(seen.len(), n);
            }
            prop_assert_eq!(pairs.len(), n * (n - 1) / 2);
        }

        #[test]
        fn parity_rule_balances_every_team(half in 2_usize..12) {
            let schedule = round_robin(&Instance::new(half * 2).unwrap());
            prop_assert_eq!(schedule.max_imbalance(), 1);
        }
    }
}
