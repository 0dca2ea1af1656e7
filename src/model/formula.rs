use std::ops::Not;

/// The smallest maximum imbalance a schedule can reach.
/// Every team plays an odd number of matches, so its imbalance is odd.
pub const IMBALANCE_FLOOR: u32 = 1;

/// A boolean decision variable, identified by its zero-based index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Var(u32);

impl Var {
    /// Returns the zero-based index of the variable.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the positive literal of the variable.
    #[must_use]
    pub const fn lit(self) -> Lit {
        Lit {
            var: self,
            positive: true,
        }
    }
}

/// A variable or its negation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Lit {
    #[must_use]
    pub const fn var(self) -> Var {
        self.var
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.positive
    }

    /// Returns the literal in DIMACS notation: one-based, negative when negated.
    #[must_use]
    pub fn to_dimacs(self) -> i32 {
        let value = i32::try_from(self.var.0 + 1).unwrap_or(i32::MAX);
        if self.positive {
            value
        } else {
            -value
        }
    }
}

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self {
        Self {
            var: self.var,
            positive: !self.positive,
        }
    }
}

impl From<Var> for Lit {
    fn from(var: Var) -> Self {
        var.lit()
    }
}

/// A constraint over literals. Cardinality constraints count true literals.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Constraint {
    /// At least one literal is true. The empty clause is unsatisfiable.
    Clause(Vec<Lit>),
    AtMost { lits: Vec<Lit>, k: usize },
    AtLeast { lits: Vec<Lit>, k: usize },
    Exactly { lits: Vec<Lit>, k: usize },
}

impl Constraint {
    /// Returns whether the assignment satisfies the constraint.
    #[must_use]
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        let count = |lits: &[Lit]| lits.iter().filter(|&&lit| assignment.value(lit)).count();
        match self {
            Self::Clause(lits) => lits.iter().any(|&lit| assignment.value(lit)),
            Self::AtMost { lits, k } => count(lits) <= *k,
            Self::AtLeast { lits, k } => count(lits) >= *k,
            Self::Exactly { lits, k } => count(lits) == *k,
        }
    }
}

/// The quantity minimized by the optimizer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Objective {
    /// Largest `|home - away|` over all teams. `home[t]` holds the literals true when team `t`
    /// plays home, and every team plays exactly `games` matches.
    MaxImbalance { home: Vec<Vec<Lit>>, games: usize },
    /// The objective is fixed by the model before solving.
    Constant(u32),
}

/// A backend-neutral satisfiability model: boolean variables, constraints and an objective.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Formula {
    vars: u32,
    constraints: Vec<Constraint>,
    objective: Objective,
    truth: Option<Lit>,
}

impl Default for Formula {
    fn default() -> Self {
        Self::new()
    }
}

impl Formula {
    /// Creates an empty formula with a constant zero objective.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vars: 0,
            constraints: Vec::new(),
            objective: Objective::Constant(0),
            truth: None,
        }
    }

    /// Allocates a fresh variable.
    pub fn new_var(&mut self) -> Var {
        let var = Var(self.vars);
        self.vars += 1;
        var
    }

    /// Allocates `count` fresh variables.
    pub fn new_vars(&mut self, count: usize) -> Vec<Var> {
        (0..count).map(|_| self.new_var()).collect()
    }

    /// Returns a literal fixed to true.
    pub fn truth(&mut self) -> Lit {
        if let Some(lit) = self.truth {
            return lit;
        }
        let lit = self.new_var().lit();
        self.clause([lit]);
        self.truth = Some(lit);
        lit
    }

    /// Returns the number of variables.
    #[must_use]
    pub const fn vars(&self) -> usize {
        self.vars as usize
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub const fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    /// Returns whether the assignment satisfies every constraint.
    #[must_use]
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(assignment))
    }

    /// Requires at least one of the literals to be true.
    pub fn clause(&mut self, lits: impl IntoIterator<Item = Lit>) {
        self.constraints
            .push(Constraint::Clause(lits.into_iter().collect()));
    }

    pub fn at_most(&mut self, lits: Vec<Lit>, k: usize) {
        self.constraints.push(Constraint::AtMost { lits, k });
    }

    pub fn at_least(&mut self, lits: Vec<Lit>, k: usize) {
        self.constraints.push(Constraint::AtLeast { lits, k });
    }

    pub fn exactly(&mut self, lits: Vec<Lit>, k: usize) {
        self.constraints.push(Constraint::Exactly { lits, k });
    }

    pub fn exactly_one(&mut self, lits: Vec<Lit>) {
        self.exactly(lits, 1);
    }

    /// Channels `out <-> (a and b)`.
    pub fn and_gate(&mut self, out: Lit, a: Lit, b: Lit) {
        self.clause([!out, a]);
        self.clause([!out, b]);
        self.clause([out, !a, !b]);
    }

    /// Channels `out <-> (inputs[0] or inputs[1] or ...)`.
    pub fn or_gate(&mut self, out: Lit, inputs: &[Lit]) {
        for &input in inputs {
            self.clause([out, !input]);
        }
        self.clause(std::iter::once(!out).chain(inputs.iter().copied()));
    }

    /// Restricts the objective to values not greater than `bound`.
    pub fn bound_max_imbalance(&mut self, bound: u32) {
        let bound = bound as usize;
        match &self.objective {
            Objective::MaxImbalance { home, games } => {
                let games = *games;
                let most = (games + bound) / 2;
                let least = games.saturating_sub(bound).div_ceil(2);
                let home = home.clone();
                for lits in home {
                    if most < lits.len() {
                        self.at_most(lits.clone(), most);
                    }
                    if least > 0 {
                        self.at_least(lits, least);
                    }
                }
            }
            &Objective::Constant(value) => {
                if value as usize > bound {
                    self.constraints.push(Constraint::Clause(Vec::new()));
                }
            }
        }
    }
}

/// Values bound to the variables of a formula by a solver.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Assignment(Vec<bool>);

impl Assignment {
    #[must_use]
    pub const fn new(values: Vec<bool>) -> Self {
        Self(values)
    }

    /// Reads a model in DIMACS notation. Variables missing from the model are false.
    #[must_use]
    pub fn from_dimacs(model: &[i32], vars: usize) -> Self {
        let mut values = vec![false; vars];
        for &lit in model.iter().filter(|&&lit| lit > 0) {
            if let Some(value) = usize::try_from(lit - 1).ok().and_then(|i| values.get_mut(i)) {
                *value = true;
            }
        }
        Self(values)
    }

    /// Returns the truth value of the literal. Unbound variables are false.
    #[must_use]
    pub fn value(&self, lit: Lit) -> bool {
        let value = self.0.get(lit.var().index()).copied().unwrap_or_default();
        value == lit.is_positive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literals_use_dimacs_numbering() {
        let mut formula = Formula::new();
        let a = formula.new_var();
        let b = formula.new_var();
        assert_eq!(a.lit().to_dimacs(), 1);
        assert_eq!((!b.lit()).to_dimacs(), -2);
        assert_eq!(!!b.lit(), b.lit());
        assert_eq!(formula.vars(), 2);
    }

    #[test]
    fn assignment_reads_dimacs_models() {
        let assignment = Assignment::from_dimacs(&[1, -2, 3], 4);
        let var = |i| Var(i).lit();
        assert!(assignment.value(var(0)));
        assert!(!assignment.value(var(1)));
        assert!(assignment.value(!var(1)));
        assert!(assignment.value(var(2)));
        assert!(!assignment.value(var(3)));
        assert!(!assignment.value(var(9)));
    }

    #[test]
    fn truth_is_allocated_once() {
        let mut formula = Formula::new();
        let first = formula.truth();
        let second = formula.truth();
        assert_eq!(first, second);
        assert_eq!(formula.constraints(), &[Constraint::Clause(vec![first])]);
    }

    #[test]
    fn bounding_imbalance_limits_home_games() {
        let mut formula = Formula::new();
        let home: Vec<Lit> = formula.new_vars(15).into_iter().map(Var::lit).collect();
        formula.set_objective(Objective::MaxImbalance {
            home: vec![home.clone()],
            games: 7,
        });

        formula.bound_max_imbalance(1);
        assert_eq!(
            formula.constraints(),
            &[
                Constraint::AtMost {
                    lits: home.clone(),
                    k: 4
                },
                Constraint::AtLeast { lits: home, k: 3 },
            ]
        );
    }

    #[test]
    fn constraints_count_true_literals() {
        let mut formula = Formula::new();
        let lits: Vec<Lit> = formula.new_vars(3).into_iter().map(Var::lit).collect();
        formula.at_most(lits.clone(), 2);
        formula.at_least(lits.clone(), 1);
        formula.clause([!lits[2]]);

        assert!(formula.is_satisfied(&Assignment::new(vec![true, true, false])));
        assert!(!formula.is_satisfied(&Assignment::new(vec![true, true, true])));
        assert!(!formula.is_satisfied(&Assignment::new(vec![false, false, false])));
        assert!(!formula.is_satisfied(&Assignment::new(vec![false, false, true])));
        assert!(Constraint::Exactly { lits, k: 1 }.is_satisfied(&Assignment::new(vec![false, true])));
    }

    #[test]
    fn bounding_constant_objective() {
        let mut formula = Formula::new();
        formula.set_objective(Objective::Constant(3));
        formula.bound_max_imbalance(3);
        assert!(formula.constraints().is_empty());
        formula.bound_max_imbalance(2);
        assert_eq!(formula.constraints(), &[Constraint::Clause(Vec::new())]);
    }
}
