use super::{AtMostK, AtMostOne, CnfEncoder, ConstraintSolver, Outcome, SolveError, Status};
use crate::model::{Assignment, Formula};
use splr::{Certificate, Config, SolveIF, Solver, SolverError};
use std::time::Duration;
use tracing::{debug, warn};

/// CDCL SAT solving through splr.
///
/// Every call lowers the whole formula to CNF with the configured cardinality encodings and
/// runs a fresh solver on it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sat {
    at_most_one: AtMostOne,
    at_most_k: AtMostK,
}

impl Sat {
    #[must_use]
    pub const fn new(at_most_one: AtMostOne, at_most_k: AtMostK) -> Self {
        Self {
            at_most_one,
            at_most_k,
        }
    }
}

impl ConstraintSolver for Sat {
    fn name(&self) -> &'static str {
        "splr"
    }

    fn solve(&mut self, formula: &Formula, timeout: Duration) -> Result<Outcome, SolveError> {
        let cnf = CnfEncoder::new(self.at_most_one, self.at_most_k).encode(formula);
        debug!(vars = cnf.vars, clauses = cnf.clauses.len(), "Lowered formula to CNF");

        if cnf.has_empty_clause() {
            return Ok(Outcome::new(Status::Unsatisfiable));
        }
        if timeout.is_zero() {
            return Ok(Outcome::new(Status::Unknown));
        }

        let config = Config {
            c_timeout: timeout.as_secs_f64(),
            quiet_mode: true,
            ..Config::default()
        };

        let result = match Solver::try_from((config, cnf.clauses.as_slice())) {
            Ok(mut solver) => solver.solve(),
            Err(result) => result,
        };

        match result {
            Ok(certificate) => Ok(Outcome::new(status(certificate, formula))),
            // Raised while loading clauses that already refute each other.
            Err(SolverError::EmptyClause | SolverError::Inconsistent) => {
                Ok(Outcome::new(Status::Unsatisfiable))
            }
            Err(SolverError::TimeOut) => Ok(Outcome::new(Status::Unknown)),
            Err(SolverError::OutOfMemory) => Err(SolveError::OutOfMemory),
            Err(err) => Err(SolveError::Crashed(format!("splr failed: {err:?}"))),
        }
    }
}

fn status(certificate: Certificate, formula: &Formula) -> Status {
    match certificate {
        Certificate::SAT(model) => {
            let assignment = Assignment::from_dimacs(&model, formula.vars());
            if !formula.is_satisfied(&assignment) {
                warn!("Model reported by splr violates the formula");
            }
            Status::Satisfiable(assignment)
        }
        Certificate::UNSAT => Status::Unsatisfiable,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{validate, Instance};
    use crate::model::{Encoding, ModelOptions, Var};

    const TIMEOUT: Duration = Duration::from_secs(60);

    #[test]
    fn contradiction_is_unsatisfiable() -> anyhow::Result<()> {
        let mut formula = Formula::new();
        let x = formula.new_var().lit();
        formula.clause([x]);
        formula.clause([!x]);

        let outcome = Sat::default().solve(&formula, TIMEOUT)?;
        assert_eq!(outcome.status, Status::Unsatisfiable);
        Ok(())
    }

    #[test]
    fn conflicting_units_are_unsatisfiable_at_load_time() -> anyhow::Result<()> {
        let mut formula = Formula::new();
        let lits: Vec<_> = formula.new_vars(3).into_iter().map(Var::lit).collect();
        formula.clause([lits[0]]);
        formula.clause([lits[1], lits[2]]);
        formula.clause([!lits[0]]);

        let encodings = [
            (AtMostOne::Sequential, AtMostK::Sequential),
            (AtMostOne::Heule, AtMostK::Pairwise),
        ];
        for (amo, amk) in encodings {
            let outcome = Sat::new(amo, amk).solve(&formula, TIMEOUT)?;
            assert_eq!(outcome.status, Status::Unsatisfiable);
        }
        Ok(())
    }

    #[test]
    fn cardinality_constraints_are_respected() -> anyhow::Result<()> {
        let mut formula = Formula::new();
        let lits: Vec<_> = formula.new_vars(6).into_iter().map(Var::lit).collect();
        formula.exactly(lits.clone(), 2);
        formula.clause([lits[0]]);
        formula.clause([!lits[1]]);

        let encodings = [
            (AtMostOne::Heule, AtMostK::Pairwise),
            (AtMostOne::Bitwise, AtMostK::Sequential),
            (AtMostOne::Pairwise, AtMostK::Pairwise),
        ];
        for (amo, amk) in encodings {
            let outcome = Sat::new(amo, amk).solve(&formula, TIMEOUT)?;
            let Status::Satisfiable(assignment) = outcome.status else {
                anyhow::bail!("expected a model");
            };
            assert!(formula.is_satisfied(&assignment));
            assert_eq!(lits.iter().filter(|&&lit| assignment.value(lit)).count(), 2);
        }
        Ok(())
    }

    #[test]
    fn empty_clause_skips_the_solver() -> anyhow::Result<()> {
        let mut formula = Formula::new();
        let x = formula.new_var().lit();
        formula.at_least(vec![x], 2);
        let outcome = Sat::default().solve(&formula, Duration::ZERO)?;
        assert_eq!(outcome.status, Status::Unsatisfiable);
        Ok(())
    }

    #[test]
    fn permutation_model_of_six_teams_is_solved() -> anyhow::Result<()> {
        let instance = Instance::new(6)?;
        let model = Encoding::Permutation.build(&instance, ModelOptions::new(true, true));

        let outcome = Sat::default().solve(model.formula(), TIMEOUT)?;
        let Status::Satisfiable(assignment) = outcome.status else {
            anyhow::bail!("six teams can be scheduled");
        };
        assert_eq!(validate(&model.extract(&assignment)), Ok(()));
        Ok(())
    }

    #[test]
    fn four_teams_are_infeasible() -> anyhow::Result<()> {
        let instance = Instance::new(4)?;
        for encoding in [Encoding::Permutation, Encoding::Direct] {
            let model = encoding.build(&instance, ModelOptions::default());
            let outcome = Sat::default().solve(model.formula(), TIMEOUT)?;
            assert_eq!(outcome.status, Status::Unsatisfiable);
        }
        Ok(())
    }
}
