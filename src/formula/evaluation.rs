/*!
Three-valued evaluation of literals, clauses and formulas under a partial binding.
*/

use std::ops::{BitAnd, BitOr, Not};

use crate::binding::Binding;

use super::{Clause, Cnf, Literal};

/// Truth value under a partial binding.
///
/// Ordered `False < Undefined < True`, so AND is the minimum and OR the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Evaluation {
    False,
    Undefined,
    True,
}

impl Evaluation {
    pub fn and(self, other: Evaluation) -> Evaluation {
        self.min(other)
    }

    pub fn or(self, other: Evaluation) -> Evaluation {
        self.max(other)
    }
}

impl From<bool> for Evaluation {
    fn from(value: bool) -> Self {
        if value {
            Evaluation::True
        } else {
            Evaluation::False
        }
    }
}

impl From<Option<bool>> for Evaluation {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Evaluation::Undefined, Evaluation::from)
    }
}

impl Not for Evaluation {
    type Output = Evaluation;

    fn not(self) -> Self::Output {
        match self {
            Evaluation::False => Evaluation::True,
            Evaluation::Undefined => Evaluation::Undefined,
            Evaluation::True => Evaluation::False,
        }
    }
}

impl BitAnd for Evaluation {
    type Output = Evaluation;

    fn bitand(self, rhs: Evaluation) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Evaluation {
    type Output = Evaluation;

    fn bitor(self, rhs: Evaluation) -> Self::Output {
        self.or(rhs)
    }
}

pub trait Evaluate {
    fn evaluate(&self, binding: &Binding) -> Evaluation;
}

impl Evaluate for Literal {
    fn evaluate(&self, binding: &Binding) -> Evaluation {
        binding.value(*self).into()
    }
}

impl Evaluate for Clause {
    fn evaluate(&self, binding: &Binding) -> Evaluation {
        self.iter()
            .fold(Evaluation::False, |acc, literal| acc | literal.evaluate(binding))
    }
}

impl Evaluate for Cnf {
    fn evaluate(&self, binding: &Binding) -> Evaluation {
        self.clauses()
            .iter()
            .fold(Evaluation::True, |acc, clause| acc & clause.evaluate(binding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Variable;

    const ALL: [Evaluation; 3] = [Evaluation::False, Evaluation::Undefined, Evaluation::True];

    #[test]
    fn lattice_laws() {
        for &a in &ALL {
            assert_eq!(!!a, a);
            for &b in &ALL {
                assert_eq!(a & b, b & a);
                assert_eq!(a | b, b | a);
                for &c in &ALL {
                    assert_eq!((a & b) & c, a & (b & c));
                    assert_eq!((a | b) | c, a | (b | c));
                }
            }
            assert_eq!(a & Evaluation::False, Evaluation::False);
            assert_eq!(a | Evaluation::True, Evaluation::True);
        }
        assert_eq!(Evaluation::Undefined & Evaluation::True, Evaluation::Undefined);
        assert_eq!(Evaluation::Undefined | Evaluation::False, Evaluation::Undefined);
    }

    #[test]
    fn literal_follows_binding() {
        let variable = Variable::new();
        let literal = Literal::from(variable);
        let mut binding = Binding::new();

        assert_eq!(literal.evaluate(&binding), Evaluation::Undefined);
        binding.set(literal, false);
        assert_eq!(literal.evaluate(&binding), Evaluation::False);
        binding.set(literal, true);
        assert_eq!(literal.evaluate(&binding), Evaluation::True);
    }

    #[test]
    fn negated_literal_negates_evaluation() {
        let literal = Literal::from(Variable::new());
        let bindings = vec![
            Binding::new(),
            vec![(literal.variable(), true)].into_iter().collect(),
            vec![(literal.variable(), false)].into_iter().collect::<Binding>(),
        ];

        for binding in &bindings {
            assert_eq!((!literal).evaluate(binding), !literal.evaluate(binding));
        }
    }

    #[test]
    fn empty_clause_is_false_and_empty_formula_is_true() {
        let variable = Variable::new();
        let bindings: Vec<Binding> = vec![
            Binding::new(),
            vec![(variable, true)].into_iter().collect(),
        ];

        for binding in &bindings {
            assert_eq!(Clause::empty().evaluate(binding), Evaluation::False);
            assert_eq!(Cnf::new().evaluate(binding), Evaluation::True);
        }
    }

    #[test]
    fn clause_evaluation() {
        let x = Variable::new();
        let y = Variable::new();
        let clause = !x | !y;

        let binding: Binding = vec![(x, true), (y, false)].into_iter().collect();
        assert_eq!(clause.evaluate(&binding), Evaluation::True);

        let binding: Binding = vec![(x, true)].into_iter().collect();
        assert_eq!(clause.evaluate(&binding), Evaluation::Undefined);

        let binding: Binding = vec![(x, true), (y, true)].into_iter().collect();
        assert_eq!(clause.evaluate(&binding), Evaluation::False);
    }

    #[test]
    fn formula_evaluation() {
        let v: Vec<_> = (0..5).map(|_| Variable::new()).collect();
        let cnf: Cnf = vec![
            Literal::from(v[0]) | !v[1],
            Clause::unit(v[2].into()),
            Literal::from(v[0]) | !v[3],
            Literal::from(v[0]) | !v[4],
            Literal::from(v[3]) | Literal::from(v[4]),
        ]
        .into_iter()
        .collect();

        let satisfying: Binding = vec![
            (v[0], true),
            (v[1], false),
            (v[2], true),
            (v[3], false),
            (v[4], true),
        ]
        .into_iter()
        .collect();
        assert_eq!(cnf.evaluate(&satisfying), Evaluation::True);

        let falsifying: Binding = vec![(v[0], false), (v[1], false), (v[2], false), (v[3], false)]
            .into_iter()
            .collect();
        assert_eq!(cnf.evaluate(&falsifying), Evaluation::False);

        assert_eq!(cnf.evaluate(&Binding::new()), Evaluation::Undefined);
    }
}
