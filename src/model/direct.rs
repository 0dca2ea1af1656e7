use super::{
    period_cap, period_load, Assignment, Formula, Lit, ModelOptions, Objective, ScheduleModel,
};
use crate::core::{Instance, Match, Schedule, Team};
use tracing::debug;

const HOME: usize = 0;
const AWAY: usize = 1;

/// Places a team in every slot of the schedule.
///
/// `slots[p][w][s][t]` is true when team `t + 1` plays in period `p` of week `w` on side `s`
/// (home or away). `games[p][w][i][j]` channels the ordered match `i + 1` against `j + 1`.
#[derive(Clone, Debug)]
pub struct DirectModel {
    slots: Vec<Vec<[Vec<Lit>; 2]>>,
    formula: Formula,
}

impl DirectModel {
    #[must_use]
    pub fn new(instance: &Instance, options: ModelOptions) -> Self {
        let n = instance.teams();
        let mut formula = Formula::new();

        let mut slots: Vec<Vec<[Vec<Lit>; 2]>> = Vec::with_capacity(instance.periods());
        for _ in instance.period_indices() {
            let weeks = instance.week_indices().map(|_| {
                let mut side = || -> Vec<Lit> {
                    formula.new_vars(n).into_iter().map(Lit::from).collect()
                };
                [side(), side()]
            });
            slots.push(weeks.collect());
        }

        let mut games = Vec::with_capacity(instance.periods());
        for weeks in &slots {
            let mut period = Vec::with_capacity(instance.weeks());
            for [home, away] in weeks {
                let mut pairs = vec![vec![None; n]; n];
                for i in 0..n {
                    for j in (0..n).filter(|&j| j != i) {
                        let game = formula.new_var().lit();
                        formula.and_gate(game, home[i], away[j]);
                        pairs[i][j] = Some(game);
                    }
                }
                period.push(pairs);
            }
            games.push(period);
        }

        for weeks in &slots {
            for [home, away] in weeks {
                formula.exactly_one(home.clone());
                formula.exactly_one(away.clone());
                for (&h, &a) in home.iter().zip(away) {
                    formula.clause([!h, !a]);
                }
            }
        }

        for w in instance.week_indices() {
            for t in instance.team_indices() {
                let appearances = slots
                    .iter()
                    .flat_map(|weeks| [weeks[w][HOME][t], weeks[w][AWAY][t]]);
                formula.exactly_one(appearances.collect());
            }
        }

        for i in 0..n {
            for j in i + 1..n {
                let meetings = games
                    .iter()
                    .flatten()
                    .flat_map(|pairs| [pairs[i][j], pairs[j][i]]);
                formula.exactly_one(meetings.flatten().collect());
            }
        }

        let cap = period_cap(instance);
        let load = period_load(instance);
        for weeks in &slots {
            for t in instance.team_indices() {
                let appearances: Vec<Lit> = weeks
                    .iter()
                    .flat_map(|sides| [sides[HOME][t], sides[AWAY][t]])
                    .collect();
                if options.implied_constraints && load > 0 {
                    formula.at_least(appearances.clone(), load);
                }
                formula.at_most(appearances, cap);
            }
        }

        if options.implied_constraints {
            for pairs in games.iter().flatten() {
                formula.exactly_one(pairs.iter().flatten().flatten().copied().collect());
            }
        }

        if options.symmetry_breaking {
            break_symmetries(&mut formula, instance, &slots);
        }

        let home = instance
            .team_indices()
            .map(|t| slots.iter().flatten().map(|sides| sides[HOME][t]).collect())
            .collect();
        formula.set_objective(Objective::MaxImbalance {
            home,
            games: instance.weeks(),
        });

        debug!(
            vars = formula.vars(),
            constraints = formula.constraints().len(),
            "Built direct model"
        );

        Self { slots, formula }
    }
}

/// Relabels teams so that week 1 reads `1-(n/2+1), 2-(n/2+2), ...` and orders the remaining
/// weeks by their home teams.
fn break_symmetries(formula: &mut Formula, instance: &Instance, slots: &[Vec<[Vec<Lit>; 2]>]) {
    for (p, weeks) in slots.iter().enumerate() {
        formula.clause([weeks[0][HOME][p]]);
        formula.clause([weeks[0][AWAY][instance.periods() + p]]);
    }

    let order: Vec<Vec<Vec<Lit>>> = instance
        .week_indices()
        .skip(1)
        .map(|w| slots.iter().map(|weeks| order_lits(formula, &weeks[w][HOME])).collect())
        .collect();

    for pair in order.windows(2) {
        lex_leq(formula, &pair[0], &pair[1]);
    }
}

/// Returns the order encoding of a one-hot value: element `k` is true when the value is at
/// least `k`. The first element is always true and the last always false.
fn order_lits(formula: &mut Formula, one_hot: &[Lit]) -> Vec<Lit> {
    let truth = formula.truth();
    let mut order = vec![truth];
    for k in 1..one_hot.len() {
        let at_least = formula.new_var().lit();
        formula.or_gate(at_least, &one_hot[k..]);
        order.push(at_least);
    }
    order.push(!truth);
    order
}

/// Requires the order-encoded vector `a` to be lexicographically not greater than `b`.
fn lex_leq(formula: &mut Formula, a: &[Vec<Lit>], b: &[Vec<Lit>]) {
    // `equal` holds while every earlier position is equal.
    let width = a.len().min(b.len());
    let mut equal = formula.truth();
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let values = x.len().min(y.len());
        for k in 1..values {
            formula.clause([!equal, !x[k], y[k]]);
        }

        if i + 1 == width {
            break;
        }

        let less = formula.new_var().lit();
        for k in 0..values - 1 {
            formula.clause([!less, !x[k], y[k + 1]]);
        }

        let next = formula.new_var().lit();
        formula.clause([!equal, less, next]);
        equal = next;
    }
}

fn decode(assignment: &Assignment, one_hot: &[Lit]) -> Team {
    let team = one_hot.iter().position(|&lit| assignment.value(lit));
    team.and_then(|t| Team::try_from(t + 1).ok()).unwrap_or_default()
}

impl ScheduleModel for DirectModel {
    fn formula(&self) -> &Formula {
        &self.formula
    }

    fn formula_mut(&mut self) -> &mut Formula {
        &mut self.formula
    }

    fn extract(&self, assignment: &Assignment) -> Schedule {
        let periods = self.slots.iter().map(|weeks| {
            let games = weeks.iter().map(|[home, away]| {
                Match::new(decode(assignment, home), decode(assignment, away))
            });
            games.collect()
        });
        Schedule::new(periods.collect())
    }
}
