use crate::core::Schedule;
use crate::model::{ScheduleModel, IMBALANCE_FLOOR};
use crate::solver::{ConstraintSolver, SolveError, Status};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// An improving solution found during the search.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Incumbent {
    pub objective: u32,
    /// Time since the search started.
    pub elapsed: Duration,
}

/// Why the search stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Termination {
    /// The incumbent reached the objective floor.
    Floor,
    /// No schedule better than the incumbent exists.
    Proven,
    /// The model has no solution at all.
    Infeasible,
    /// The solver gave up before a verdict.
    Unknown,
    /// The budget ran out between solver calls.
    Budget,
    /// The solver failed.
    Crashed,
}

/// Result of minimizing the max imbalance of one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Optimum {
    pub schedule: Option<Schedule>,
    pub objective: Option<u32>,
    /// Whether the objective is proven minimal.
    pub optimal: bool,
    pub termination: Termination,
    /// Improving solutions in the order they were found.
    pub incumbents: Vec<Incumbent>,
    pub elapsed: Duration,
    pub failure: Option<SolveError>,
}

impl Optimum {
    /// Returns whether the search ended with a proof: optimality or infeasibility.
    #[must_use]
    pub const fn is_proven(&self) -> bool {
        matches!(
            self.termination,
            Termination::Floor | Termination::Proven | Termination::Infeasible
        )
    }

    /// Returns the time at which the last incumbent was found.
    #[must_use]
    pub fn time_to_last_solution(&self) -> Option<Duration> {
        self.incumbents.last().map(|incumbent| incumbent.elapsed)
    }
}

/// Anytime minimization of the max imbalance under a wall-clock budget.
///
/// Backends without native minimization are called repeatedly, each time with the objective
/// bounded strictly below the incumbent, until the bound becomes unsatisfiable, the floor is
/// reached or the budget runs out. Minimizing backends are called once.
#[derive(Clone, Copy, Debug)]
pub struct BoundTightening {
    budget: Duration,
}

struct Search {
    start: Instant,
    best: Option<(Schedule, u32)>,
    incumbents: Vec<Incumbent>,
}

impl Search {
    /// Records the schedule if it beats the incumbent.
    fn offer(&mut self, schedule: Schedule, elapsed: Duration) -> bool {
        let objective = schedule.max_imbalance();
        if self.best.as_ref().is_some_and(|(_, best)| objective >= *best) {
            warn!(objective, "Solver returned a schedule that does not improve the bound");
            return false;
        }

        info!(objective, elapsed = elapsed.as_secs_f64(), "New incumbent");
        self.incumbents.push(Incumbent { objective, elapsed });
        self.best = Some((schedule, objective));
        true
    }

    fn finish(self, termination: Termination, failure: Option<SolveError>) -> Optimum {
        let optimal = match termination {
            Termination::Floor | Termination::Proven => self.best.is_some(),
            _ => false,
        };
        let (schedule, objective) = self.best.unzip();
        Optimum {
            schedule,
            objective,
            optimal,
            termination,
            incumbents: self.incumbents,
            elapsed: self.start.elapsed(),
            failure,
        }
    }
}

impl BoundTightening {
    #[must_use]
    pub const fn new(budget: Duration) -> Self {
        Self { budget }
    }

    /// Minimizes the objective of the model with the solver.
    ///
    /// Solver failures end the search; the incumbent found before the failure is kept.
    pub fn optimize(
        &self,
        solver: &mut dyn ConstraintSolver,
        model: &mut dyn ScheduleModel,
    ) -> Optimum {
        let mut search = Search {
            start: Instant::now(),
            best: None,
            incumbents: Vec::new(),
        };

        loop {
            if let Some((_, best)) = &search.best {
                debug!(bound = best - 1, "Tightening objective bound");
                model.formula_mut().bound_max_imbalance(best - 1);
            }

            let remaining = self.budget.saturating_sub(search.start.elapsed());
            if remaining.is_zero() {
                return search.finish(Termination::Budget, None);
            }

            let call = search.start.elapsed();
            let outcome = match solver.solve(model.formula(), remaining) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(solver = solver.name(), %err, "Solver failed");
                    return search.finish(Termination::Crashed, Some(err));
                }
            };

            match outcome.status {
                Status::Satisfiable(assignment) => {
                    let schedule = model.extract(&assignment);
                    if !search.offer(schedule, search.start.elapsed()) {
                        return search.finish(Termination::Unknown, None);
                    }
                    if solver.minimizes() {
                        return search.finish(Termination::Proven, None);
                    }
                    if search.best.as_ref().is_some_and(|(_, best)| *best <= IMBALANCE_FLOOR) {
                        return search.finish(Termination::Floor, None);
                    }
                }
                Status::Unsatisfiable if search.best.is_some() => {
                    return search.finish(Termination::Proven, None);
                }
                Status::Unsatisfiable => return search.finish(Termination::Infeasible, None),
                Status::Unknown => {
                    if let Some(last) = outcome.intermediate.into_iter().last() {
                        let schedule = model.extract(&last.assignment);
                        search.offer(schedule, call + last.elapsed);
                    }
                    return search.finish(Termination::Unknown, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{round_robin, Instance, Match};
    use crate::model::{Assignment, Formula, Objective, Var};
    use crate::solver::{Intermediate, Outcome};
    use std::collections::VecDeque;

    /// A model whose schedule is selected by the index of the first true variable.
    struct Scripted {
        schedules: Vec<Schedule>,
        vars: Vec<Var>,
        formula: Formula,
    }

    impl Scripted {
        fn new(schedules: Vec<Schedule>) -> Self {
            let mut formula = Formula::new();
            let vars = formula.new_vars(schedules.len());
            Self {
                schedules,
                vars,
                formula,
            }
        }

        fn pick(&self, index: usize) -> Assignment {
            let mut values = vec![false; self.vars.len()];
            values[self.vars[index].index()] = true;
            Assignment::new(values)
        }
    }

    impl ScheduleModel for Scripted {
        fn formula(&self) -> &Formula {
            &self.formula
        }

        fn formula_mut(&mut self) -> &mut Formula {
            &mut self.formula
        }

        fn extract(&self, assignment: &Assignment) -> Schedule {
            let index = self.vars.iter().position(|&var| assignment.value(var.lit()));
            self.schedules[index.unwrap_or_default()].clone()
        }
    }

    /// A solver replaying canned outcomes and recording the bounds it was called with.
    struct Replay {
        outcomes: VecDeque<Result<Outcome, SolveError>>,
        minimizes: bool,
        calls: usize,
    }

    impl Replay {
        fn new(outcomes: Vec<Result<Outcome, SolveError>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                minimizes: false,
                calls: 0,
            }
        }
    }

    impl ConstraintSolver for Replay {
        fn name(&self) -> &'static str {
            "replay"
        }

        fn minimizes(&self) -> bool {
            self.minimizes
        }

        fn solve(&mut self, _: &Formula, _: Duration) -> Result<Outcome, SolveError> {
            self.calls += 1;
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Ok(Outcome::new(Status::Unknown)))
        }
    }

    /// Schedules with max imbalance 5, 3 and 1.
    fn ladder() -> anyhow::Result<Vec<Schedule>> {
        let base = round_robin(&Instance::new(6)?);
        let flip = |schedule: &Schedule, games: &[(usize, usize)]| {
            let mut periods = schedule.periods().to_vec();
            for &(p, w) in games {
                let game = periods[p][w];
                periods[p][w] = Match::new(game.away, game.home);
            }
            Schedule::new(periods)
        };
        let worse = flip(&base, &[(0, 1)]);
        let worst = flip(&base, &[(0, 1), (0, 3)]);
        Ok(vec![worst, worse, base])
    }

    fn optimizer() -> BoundTightening {
        BoundTightening::new(Duration::from_secs(60))
    }

    fn sat(model: &Scripted, index: usize) -> Result<Outcome, SolveError> {
        Ok(Outcome::new(Status::Satisfiable(model.pick(index))))
    }

    #[test]
    fn ladder_objectives() -> anyhow::Result<()> {
        let objectives: Vec<u32> = ladder()?.iter().map(Schedule::max_imbalance).collect();
        assert_eq!(objectives, vec![5, 3, 1]);
        Ok(())
    }

    #[test]
    fn tightening_stops_at_the_floor() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        model.formula.set_objective(Objective::Constant(0));
        let mut solver = Replay::new(vec![sat(&model, 0), sat(&model, 1), sat(&model, 2)]);

        let optimum = optimizer().optimize(&mut solver, &mut model);
        assert_eq!(optimum.termination, Termination::Floor);
        assert_eq!(optimum.objective, Some(1));
        assert!(optimum.optimal);
        assert_eq!(solver.calls, 3);

        let objectives: Vec<u32> = optimum.incumbents.iter().map(|i| i.objective).collect();
        assert_eq!(objectives, vec![5, 3, 1]);
        assert!(optimum.incumbents.windows(2).all(|w| w[0].elapsed <= w[1].elapsed));
        Ok(())
    }

    #[test]
    fn unsatisfiable_bound_proves_the_incumbent() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        let unsat = Ok(Outcome::new(Status::Unsatisfiable));
        let mut solver = Replay::new(vec![sat(&model, 1), unsat]);

        let optimum = optimizer().optimize(&mut solver, &mut model);
        assert_eq!(optimum.termination, Termination::Proven);
        assert!(optimum.optimal && optimum.is_proven());
        assert_eq!(optimum.objective, Some(3));
        assert_eq!(optimum.schedule.as_ref().map(Schedule::max_imbalance), Some(3));
        Ok(())
    }

    #[test]
    fn bounds_are_added_to_the_formula() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        let unsat = Ok(Outcome::new(Status::Unsatisfiable));
        let mut solver = Replay::new(vec![sat(&model, 0), unsat.clone()]);

        optimizer().optimize(&mut solver, &mut model);
        // The constant objective 0 of the empty formula is below every bound.
        assert!(model.formula.constraints().is_empty());

        let mut model = Scripted::new(ladder()?);
        model.formula.set_objective(Objective::Constant(5));
        let mut solver = Replay::new(vec![sat(&model, 0), unsat]);
        optimizer().optimize(&mut solver, &mut model);
        assert_eq!(model.formula.constraints().len(), 1);
        Ok(())
    }

    #[test]
    fn infeasible_model_has_no_optimum() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        let mut solver = Replay::new(vec![Ok(Outcome::new(Status::Unsatisfiable))]);

        let optimum = optimizer().optimize(&mut solver, &mut model);
        assert_eq!(optimum.termination, Termination::Infeasible);
        assert!(!optimum.optimal);
        assert!(optimum.is_proven());
        assert_eq!(optimum.schedule, None);
        Ok(())
    }

    #[test]
    fn timeout_keeps_the_last_intermediate() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        let streamed = Outcome {
            status: Status::Unknown,
            intermediate: vec![
                Intermediate {
                    elapsed: Duration::from_millis(5),
                    assignment: model.pick(2),
                },
                Intermediate {
                    elapsed: Duration::from_millis(9),
                    assignment: model.pick(1),
                },
            ],
        };
        let mut solver = Replay::new(vec![sat(&model, 0), Ok(streamed)]);

        let optimum = optimizer().optimize(&mut solver, &mut model);
        assert_eq!(optimum.termination, Termination::Unknown);
        assert!(!optimum.optimal);
        assert_eq!(optimum.objective, Some(3));
        assert_eq!(optimum.incumbents.len(), 2);
        Ok(())
    }

    #[test]
    fn crash_keeps_the_incumbent() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        let mut solver = Replay::new(vec![sat(&model, 1), Err(SolveError::OutOfMemory)]);

        let optimum = optimizer().optimize(&mut solver, &mut model);
        assert_eq!(optimum.termination, Termination::Crashed);
        assert_eq!(optimum.failure, Some(SolveError::OutOfMemory));
        assert_eq!(optimum.objective, Some(3));
        assert!(!optimum.optimal);
        Ok(())
    }

    #[test]
    fn native_minimization_is_a_single_call() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        let mut solver = Replay::new(vec![sat(&model, 1)]);
        solver.minimizes = true;

        let optimum = optimizer().optimize(&mut solver, &mut model);
        assert_eq!(optimum.termination, Termination::Proven);
        assert!(optimum.optimal);
        assert_eq!(solver.calls, 1);
        Ok(())
    }

    #[test]
    fn exhausted_budget_skips_the_solver() -> anyhow::Result<()> {
        let mut model = Scripted::new(ladder()?);
        let mut solver = Replay::new(Vec::new());

        let optimum = BoundTightening::new(Duration::ZERO).optimize(&mut solver, &mut model);
        assert_eq!(optimum.termination, Termination::Budget);
        assert_eq!(solver.calls, 0);
        Ok(())
    }
}
