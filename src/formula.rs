/*!
A module to represent conjunctive normal form formula.
*/

use std::{
    collections::HashSet,
    fmt::Display,
    iter::FromIterator,
    num::NonZeroU64,
    ops::{BitOr, Not},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::prelude::*;

mod evaluation;

pub use evaluation::{Evaluate, Evaluation};

#[derive(Debug, Snafu)]
pub enum FormulaError {
    #[snafu(display("Literal {} refers to a variable outside of the formula", literal))]
    UnknownVariable { literal: Literal },
}

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique Boolean variable.
/// Invariant: IDs are handed out once each, in creation order, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU64);

impl Variable {
    /// Creates a variable that is distinct from every other variable of the process.
    pub fn new() -> Self {
        let id = NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed);
        Variable(NonZeroU64::new(id).expect("variable counter wrapped around"))
    }

    pub fn id(&self) -> u64 {
        self.0.get()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.id())
    }
}

impl Not for Variable {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal::new(self, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }
}

impl From<Variable> for Literal {
    fn from(variable: Variable) -> Self {
        Literal::new(variable, true)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

impl BitOr for Literal {
    type Output = Clause;

    fn bitor(self, rhs: Literal) -> Self::Output {
        Clause::new(vec![self, rhs])
    }
}

/// Disjunction of literals.
///
/// Literal order carries no meaning and duplicates are allowed.
/// The empty clause is always false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn unit(literal: Literal) -> Self {
        Self::new(vec![literal])
    }

    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }
}

impl From<Literal> for Clause {
    fn from(literal: Literal) -> Self {
        Clause::unit(literal)
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Clause::new(iter.into_iter().collect())
    }
}

impl BitOr<Literal> for Clause {
    type Output = Clause;

    fn bitor(mut self, rhs: Literal) -> Self::Output {
        self.literals.push(rhs);
        self
    }
}

impl BitOr for Clause {
    type Output = Clause;

    fn bitor(mut self, rhs: Clause) -> Self::Output {
        self.literals.extend(rhs.literals);
        self
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Formula representation in Conjunctive Normal Form
///
/// The formula remembers its variable universe in the order variables were first seen.
/// An open formula (`Cnf::new`) adopts the variables of every clause added to it,
/// a closed one (`Cnf::with_variables`) rejects clauses over foreign variables.
#[derive(Debug, Clone, Default)]
pub struct Cnf {
    variables: Vec<Variable>,
    known: HashSet<Variable>,
    closed: bool,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variables(variables: impl IntoIterator<Item = Variable>) -> Self {
        let mut cnf = Cnf {
            closed: true,
            ..Self::default()
        };
        for variable in variables {
            cnf.declare(variable);
        }
        cnf
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn contains_variable(&self, variable: Variable) -> bool {
        self.known.contains(&variable)
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Adds a variable to the universe without constraining it.
    /// Returns `false` if the variable was already known.
    pub fn declare(&mut self, variable: Variable) -> bool {
        if self.known.insert(variable) {
            self.variables.push(variable);
            true
        } else {
            false
        }
    }

    /// Conjoins a clause to the formula.
    pub fn add_clause(&mut self, clause: Clause) -> Result<(), FormulaError> {
        if self.closed {
            for literal in clause.iter() {
                ensure!(
                    self.known.contains(&literal.variable()),
                    UnknownVariable { literal }
                );
            }
        } else {
            for literal in clause.iter() {
                self.declare(literal.variable());
            }
        }

        self.clauses.push(clause);
        Ok(())
    }

    /// Conjoins every clause, stopping at the first rejected one.
    pub fn extend_clauses(
        &mut self,
        clauses: impl IntoIterator<Item = Clause>,
    ) -> Result<(), FormulaError> {
        for clause in clauses {
            self.add_clause(clause)?;
        }
        Ok(())
    }
}

impl FromIterator<Clause> for Cnf {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        let mut cnf = Cnf::new();
        for clause in iter {
            for literal in clause.iter() {
                cnf.declare(literal.variable());
            }
            cnf.clauses.push(clause);
        }
        cnf
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.variables.len())?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Encodes "exactly one of `variables` is true".
///
/// One fresh auxiliary variable is created per input. At least one auxiliary must hold,
/// and each auxiliary forces its own input true and every other input false.
/// An empty input yields the empty clause.
pub fn exactly_one_of(variables: &[Variable]) -> Vec<Clause> {
    let auxiliaries: Vec<Variable> = variables.iter().map(|_| Variable::new()).collect();

    let mut clauses = Vec::with_capacity(1 + variables.len() * variables.len());
    clauses.push(auxiliaries.iter().map(|&aux| Literal::from(aux)).collect());

    for (&selected, &aux) in variables.iter().zip(auxiliaries.iter()) {
        for &variable in variables {
            clauses.push(!aux | Literal::new(variable, variable == selected));
        }
    }

    clauses
}
