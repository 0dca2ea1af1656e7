#![allow(clippy::cast_precision_loss)]
use super::{ConstraintSolver, Intermediate, Outcome, SolveError, Status};
use crate::model::{Assignment, Constraint, Formula, Lit, Objective, IMBALANCE_FLOOR};
use grb::prelude::*;
use std::time::Duration;
use tracing::debug;

/// Gurobi error code for memory exhaustion.
const OUT_OF_MEMORY: i32 = 10001;

/// Mixed integer programming through Gurobi.
///
/// Every literal becomes a binary variable or its complement, every constraint a linear
/// inequality, and the max-imbalance objective is minimized natively.
#[derive(Clone, Copy, Debug, Default)]
pub struct Milp;

impl ConstraintSolver for Milp {
    fn name(&self) -> &'static str {
        "gurobi"
    }

    fn minimizes(&self) -> bool {
        true
    }

    fn solve(&mut self, formula: &Formula, timeout: Duration) -> Result<Outcome, SolveError> {
        if timeout.is_zero() {
            return Ok(Outcome::new(Status::Unknown));
        }
        solve_impl(formula, timeout).map_err(|err| match err {
            grb::Error::FromAPI(_, OUT_OF_MEMORY) => SolveError::OutOfMemory,
            err => SolveError::Crashed(format!("gurobi failed: {err}")),
        })
    }
}

fn create_model(timeout: Duration) -> grb::Result<Model> {
    let mut env = Env::new("")?;
    env.set(param::OutputFlag, 0)?;
    env.set(param::LogToConsole, 0)?;
    env.set(param::TimeLimit, timeout.as_secs_f64())?;
    Model::with_env("sts", env)
}

fn expr(vars: &[Var], lit: Lit) -> Expr {
    let var = vars[lit.var().index()];
    if lit.is_positive() {
        Expr::from(var)
    } else {
        Expr::Constant(1.0) - var
    }
}

fn sum(vars: &[Var], lits: &[Lit]) -> Expr {
    lits.iter().map(|&lit| expr(vars, lit)).grb_sum()
}

#[allow(clippy::useless_conversion)]
fn solve_impl(formula: &Formula, timeout: Duration) -> grb::Result<Outcome> {
    let mut model = create_model(timeout)?;

    let mut vars = Vec::with_capacity(formula.vars());
    for i in 0..formula.vars() {
        vars.push(add_binvar!(model, name: &format!("x_{i}"))?);
    }

    for (i, constraint) in formula.constraints().iter().enumerate() {
        let name = format!("c_{i}");
        match constraint {
            Constraint::Clause(lits) => model.add_constr(&name, c!(sum(&vars, lits) >= 1))?,
            Constraint::AtMost { lits, k } => {
                model.add_constr(&name, c!(sum(&vars, lits) <= *k as f64))?
            }
            Constraint::AtLeast { lits, k } => {
                model.add_constr(&name, c!(sum(&vars, lits) >= *k as f64))?
            }
            Constraint::Exactly { lits, k } => {
                model.add_constr(&name, c!(sum(&vars, lits) == *k as f64))?
            }
        };
    }

    if let Objective::MaxImbalance { home, games } = formula.objective() {
        let games = *games as f64;
        let floor = f64::from(IMBALANCE_FLOOR);
        let z = add_intvar!(model, name: "z", bounds: floor..games)?;
        for (t, lits) in home.iter().enumerate() {
            let twice = 2.0 * sum(&vars, lits);
            model.add_constr(&format!("imbalance_h_{t}"), c!(twice.clone() - games <= z))?;
            model.add_constr(&format!("imbalance_a_{t}"), c!(games - twice <= z))?;
        }
        model.set_objective(z, Minimize)?;
    }

    model.optimize()?;
    let status = model.status()?;
    debug!(?status, "Gurobi finished");

    let solutions = model.get_attr(attr::SolCount)?;
    let assignment = |model: &Model| -> grb::Result<Assignment> {
        let values = model.get_obj_attr_batch(attr::X, vars.iter().copied())?;
        Ok(Assignment::new(values.into_iter().map(|x| x > 0.5).collect()))
    };

    match status {
        grb::Status::Optimal => Ok(Outcome::new(Status::Satisfiable(assignment(&model)?))),
        grb::Status::Infeasible | grb::Status::InfOrUnbd => {
            Ok(Outcome::new(Status::Unsatisfiable))
        }
        _ if solutions > 0 => {
            let elapsed = Duration::from_secs_f64(model.get_attr(attr::Runtime)?.max(0.0));
            let intermediate = Intermediate {
                elapsed,
                assignment: assignment(&model)?,
            };
            Ok(Outcome {
                status: Status::Unknown,
                intermediate: vec![intermediate],
            })
        }
        _ => Ok(Outcome::new(Status::Unknown)),
    }
}
