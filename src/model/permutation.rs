use super::{
    period_cap, period_load, Assignment, Formula, Lit, ModelOptions, Objective, ScheduleModel,
};
use crate::core::{round_robin, Instance, Match, Schedule, Team};
use tracing::debug;

/// Repairs the period cap of the round-robin base schedule.
///
/// The matches of every week stay fixed together with their home/away orientation; the model only
/// chooses which period each match is played in. `route[p][w][q]` is true when the match
/// generated in period `p` of week `w` moves to period `q`.
#[derive(Clone, Debug)]
pub struct PermutationModel {
    base: Schedule,
    route: Vec<Vec<Vec<Lit>>>,
    formula: Formula,
}

impl PermutationModel {
    /// Builds the model on top of the circle-method schedule of the instance.
    #[must_use]
    pub fn new(instance: &Instance, options: ModelOptions) -> Self {
        let base = round_robin(instance);
        let mut formula = Formula::new();

        let mut route = Vec::with_capacity(instance.periods());
        for _ in instance.period_indices() {
            let weeks = instance.week_indices().map(|_| {
                let targets = formula.new_vars(instance.periods());
                targets.into_iter().map(Lit::from).collect::<Vec<_>>()
            });
            route.push(weeks.collect::<Vec<_>>());
        }

        for w in instance.week_indices() {
            for p in instance.period_indices() {
                formula.exactly_one(route[p][w].clone());
            }
            for q in instance.period_indices() {
                formula.exactly_one(instance.period_indices().map(|p| route[p][w][q]).collect());
            }
        }

        let cap = period_cap(instance);
        let load = period_load(instance);
        for team in (1..).take(instance.teams()) {
            for q in instance.period_indices() {
                let lits = routes_of(&base, &route, team, q);
                if options.implied_constraints && load > 0 {
                    formula.at_least(lits.clone(), load);
                }
                formula.at_most(lits, cap);
            }
        }

        if options.symmetry_breaking {
            for p in instance.period_indices() {
                formula.clause([route[p][0][p]]);
            }
        }

        formula.set_objective(Objective::Constant(base.max_imbalance()));

        debug!(
            vars = formula.vars(),
            constraints = formula.constraints().len(),
            "Built permutation model"
        );

        Self {
            base,
            route,
            formula,
        }
    }
}

/// Collects the routing literals sending a match of `team` to period `target`.
fn routes_of(base: &Schedule, route: &[Vec<Vec<Lit>>], team: Team, target: usize) -> Vec<Lit> {
    let mut lits = Vec::new();
    for (weeks, route) in base.periods().iter().zip(route) {
        for (game, route) in weeks.iter().zip(route) {
            if game.involves(team) {
                lits.push(route[target]);
            }
        }
    }
    lits
}

impl ScheduleModel for PermutationModel {
    fn formula(&self) -> &Formula {
        &self.formula
    }

    fn formula_mut(&mut self) -> &mut Formula {
        &mut self.formula
    }

    fn extract(&self, assignment: &Assignment) -> Schedule {
        let base = self.base.periods();
        let weeks = base.first().map_or(0, Vec::len);
        let mut periods = vec![vec![Match::new(0, 0); weeks]; base.len()];

        for (games, route) in base.iter().zip(&self.route) {
            for (w, (&game, targets)) in games.iter().zip(route).enumerate() {
                let Some(q) = targets.iter().position(|&lit| assignment.value(lit)) else {
                    continue;
                };
                if let Some(slot) = periods.get_mut(q).and_then(|weeks| weeks.get_mut(w)) {
                    *slot = game;
                }
            }
        }

        Schedule::new(periods)
    }
}
