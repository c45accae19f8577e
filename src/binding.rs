/*!
Partial assignments of Boolean values to variables.
*/

use std::{collections::BTreeMap, fmt::Display, iter::FromIterator};

use crate::formula::{Literal, Variable};

/// Maps variables to Boolean values. Unbound variables are undefined.
///
/// Iteration follows variable creation order. `Clone` produces an independent copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    values: BTreeMap<Variable, bool>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binds(&self, variable: Variable) -> bool {
        self.values.contains_key(&variable)
    }

    pub fn get(&self, variable: Variable) -> Option<bool> {
        self.values.get(&variable).copied()
    }

    /// Value of a literal: the value of its variable, negated for a negative literal.
    pub fn value(&self, literal: Literal) -> Option<bool> {
        self.get(literal.variable()).map(|value| value == literal.positive())
    }

    /// Binds the variable of `literal` so that `literal` evaluates to `value`.
    /// Returns the previous value of the variable.
    pub fn set(&mut self, literal: Literal, value: bool) -> Option<bool> {
        self.values.insert(literal.variable(), value == literal.positive())
    }

    /// Makes `literal` true.
    pub fn assign(&mut self, literal: Literal) -> Option<bool> {
        self.set(literal, true)
    }

    pub fn unset(&mut self, variable: Variable) -> Option<bool> {
        self.values.remove(&variable)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, bool)> + '_ {
        self.values.iter().map(|(&variable, &value)| (variable, value))
    }

    /// The literals made true by this binding.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.iter().map(|(variable, value)| Literal::new(variable, value))
    }
}

impl FromIterator<(Variable, bool)> for Binding {
    fn from_iter<T: IntoIterator<Item = (Variable, bool)>>(iter: T) -> Self {
        Binding {
            values: iter.into_iter().collect(),
        }
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Binding of {} variables:", self.values.len())?;
        for (variable, value) in self.iter() {
            write!(f, "\n  {} = {}", variable, value)?;
        }

        Ok(())
    }
}
