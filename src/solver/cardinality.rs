use crate::model::{Constraint, Formula, Lit};

/// Encoding of at-most-one constraints in CNF.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AtMostOne {
    /// One binary clause per pair of literals.
    Pairwise,
    /// Sinz sequential counter.
    #[default]
    Sequential,
    /// Binary representation of the index of the true literal.
    Bitwise,
    /// Ladder of pairwise groups of three linked by fresh variables.
    Heule,
}

/// Encoding of at-most-k constraints in CNF, for `k > 1`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AtMostK {
    /// One clause per subset of `k + 1` literals.
    /// Falls back to [`AtMostK::Sequential`] when there are too many subsets.
    Pairwise,
    /// Sinz sequential counter.
    #[default]
    Sequential,
}

/// Largest number of clauses a pairwise at-most-k may produce.
const PAIRWISE_LIMIT: usize = 100_000;

/// Groups handled pairwise at the end of a Heule ladder.
const HEULE_GROUP: usize = 4;

/// A formula in conjunctive normal form with DIMACS literals.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Cnf {
    pub vars: usize,
    pub clauses: Vec<Vec<i32>>,
}

impl Cnf {
    /// Returns whether the formula contains the empty clause.
    #[must_use]
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Vec::is_empty)
    }
}

/// Lowers formulas to CNF.
#[derive(Clone, Debug)]
pub struct CnfEncoder {
    at_most_one: AtMostOne,
    at_most_k: AtMostK,
    cnf: Cnf,
}

impl CnfEncoder {
    #[must_use]
    pub const fn new(at_most_one: AtMostOne, at_most_k: AtMostK) -> Self {
        Self {
            at_most_one,
            at_most_k,
            cnf: Cnf {
                vars: 0,
                clauses: Vec::new(),
            },
        }
    }

    /// Lowers every constraint of the formula. Auxiliary variables follow the formula's own.
    #[must_use]
    pub fn encode(mut self, formula: &Formula) -> Cnf {
        self.cnf.vars = formula.vars();
        for constraint in formula.constraints() {
            match constraint {
                Constraint::Clause(lits) => {
                    let clause = lits.iter().map(|lit| lit.to_dimacs()).collect();
                    self.cnf.clauses.push(clause);
                }
                Constraint::AtMost { lits, k } => self.at_most(&dimacs(lits), *k),
                Constraint::AtLeast { lits, k } => self.at_least(&dimacs(lits), *k),
                Constraint::Exactly { lits, k } => {
                    let lits = dimacs(lits);
                    self.at_most(&lits, *k);
                    self.at_least(&lits, *k);
                }
            }
        }
        self.cnf
    }

    fn fresh(&mut self) -> i32 {
        self.cnf.vars += 1;
        i32::try_from(self.cnf.vars).unwrap_or(i32::MAX)
    }

    fn clause(&mut self, clause: Vec<i32>) {
        self.cnf.clauses.push(clause);
    }

    fn at_most(&mut self, lits: &[i32], k: usize) {
        if k >= lits.len() {
            return;
        }
        match k {
            0 => lits.iter().for_each(|&lit| self.clause(vec![-lit])),
            1 => match self.at_most_one {
                AtMostOne::Pairwise => self.pairwise(lits),
                AtMostOne::Sequential => self.sequential(lits, 1),
                AtMostOne::Bitwise => self.bitwise(lits),
                AtMostOne::Heule => self.heule(lits),
            },
            _ => match self.at_most_k {
                AtMostK::Pairwise if binomial(lits.len(), k + 1) <= PAIRWISE_LIMIT => {
                    self.subsets(lits, k + 1);
                }
                AtMostK::Pairwise | AtMostK::Sequential => self.sequential(lits, k),
            },
        }
    }

    fn at_least(&mut self, lits: &[i32], k: usize) {
        match k {
            0 => {}
            _ if k > lits.len() => self.clause(Vec::new()),
            1 => self.clause(lits.to_vec()),
            _ => {
                let negated: Vec<i32> = lits.iter().map(|&lit| -lit).collect();
                self.at_most(&negated, lits.len() - k);
            }
        }
    }

    fn pairwise(&mut self, lits: &[i32]) {
        for (i, &a) in lits.iter().enumerate() {
            for &b in &lits[i + 1..] {
                self.clause(vec![-a, -b]);
            }
        }
    }

    /// Forbids every subset of `size` literals from being true together.
    fn subsets(&mut self, lits: &[i32], size: usize) {
        let mut indices: Vec<usize> = (0..size).collect();
        loop {
            self.clause(indices.iter().map(|&i| -lits[i]).collect());

            let Some(i) = (0..size).rev().find(|&i| indices[i] < lits.len() - size + i) else {
                return;
            };
            indices[i] += 1;
            for j in i + 1..size {
                indices[j] = indices[j - 1] + 1;
            }
        }
    }

    /// Sinz sequential counter: `count[i][j]` holds when more than `j` of the first `i + 1`
    /// literals are true.
    fn sequential(&mut self, lits: &[i32], k: usize) {
        let n = lits.len();
        let count: Vec<Vec<i32>> = (0..n - 1)
            .map(|_| (0..k).map(|_| self.fresh()).collect())
            .collect();

        self.clause(vec![-lits[0], count[0][0]]);
        for &register in &count[0][1..] {
            self.clause(vec![-register]);
        }

        for i in 1..n - 1 {
            self.clause(vec![-lits[i], count[i][0]]);
            self.clause(vec![-count[i - 1][0], count[i][0]]);
            for j in 1..k {
                self.clause(vec![-lits[i], -count[i - 1][j - 1], count[i][j]]);
                self.clause(vec![-count[i - 1][j], count[i][j]]);
            }
            self.clause(vec![-lits[i], -count[i - 1][k - 1]]);
        }

        self.clause(vec![-lits[n - 1], -count[n - 2][k - 1]]);
    }

    fn bitwise(&mut self, lits: &[i32]) {
        let width = usize::BITS - (lits.len() - 1).leading_zeros();
        let bits: Vec<i32> = (0..width).map(|_| self.fresh()).collect();
        for (i, &lit) in lits.iter().enumerate() {
            for (j, &bit) in bits.iter().enumerate() {
                let set = i >> j & 1 == 1;
                self.clause(vec![-lit, if set { bit } else { -bit }]);
            }
        }
    }

    fn heule(&mut self, lits: &[i32]) {
        let mut rest = lits.to_vec();
        while rest.len() > HEULE_GROUP {
            let link = self.fresh();
            let mut group = rest[..3].to_vec();
            group.push(link);
            self.pairwise(&group);

            rest = std::iter::once(-link).chain(rest[3..].iter().copied()).collect();
        }
        self.pairwise(&rest);
    }
}

fn dimacs(lits: &[Lit]) -> Vec<i32> {
    lits.iter().map(|lit| lit.to_dimacs()).collect()
}

/// Returns `n choose k`, saturating at `usize::MAX`.
fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n.saturating_sub(k));
    (0..k)
        .try_fold(1_usize, |acc, i| Some(acc.checked_mul(n - i)? / (i + 1)))
        .unwrap_or(usize::MAX)
}
