use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    binding::Binding,
    formula::{Cnf, Variable},
    prelude::*,
};

mod dpll;
mod index;
mod trail;

pub use dpll::{ClauseStatus, Conflict, DpllSolver, SearchStats};
pub use index::{ClauseIdx, ClauseSet, OccurrenceIndex};

#[derive(Debug, Snafu)]
pub enum SolveError {
    #[snafu(display("No binding satisfies the formula"))]
    Unsatisfiable,
    #[snafu(display("Search was cancelled after {} decisions", decisions))]
    Cancelled { decisions: usize },
    #[snafu(display(
        "The starting binding binds {}, which is not a variable of the formula",
        variable
    ))]
    InvalidInput { variable: Variable },
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Assign literals whose negation no longer occurs.
    pub pure_literal_elimination: bool,
    /// Threads used to build the occurrence index of large formulas.
    pub index_workers: usize,
    /// Minimum number of clauses before the index is built in parallel.
    pub parallel_index_threshold: usize,
    /// Bind don't-care variables of the formula to `false` in the returned binding.
    pub complete_model: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            pure_literal_elimination: true,
            index_workers: std::thread::available_parallelism()
                .map(|workers| workers.get())
                .unwrap_or(4),
            parallel_index_threshold: 4096,
            complete_model: true,
        }
    }
}

/// Cooperative cancellation shared between a search and its host.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Finds a binding that extends `starting` and satisfies `formula`.
///
/// Neither argument is modified; the returned binding is a fresh value.
pub fn solve(formula: &Cnf, starting: &Binding) -> Result<Binding, SolveError> {
    solve_with(formula, starting, SolverConfig::default(), CancelFlag::new())
}

pub fn solve_with(
    formula: &Cnf,
    starting: &Binding,
    config: SolverConfig,
    cancel: CancelFlag,
) -> Result<Binding, SolveError> {
    DpllSolver::new(formula, starting, config)?
        .with_cancel_flag(cancel)
        .solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{exactly_one_of, Clause, Evaluate, Evaluation, Literal};

    fn count_true(binding: &Binding, variables: &[Variable]) -> usize {
        variables
            .iter()
            .filter(|&&variable| binding.get(variable) == Some(true))
            .count()
    }

    #[test]
    fn single_positive_literal() {
        let x = Variable::new();
        let cnf: Cnf = vec![Clause::unit(x.into())].into_iter().collect();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(binding.get(x), Some(true));
        assert_eq!(cnf.evaluate(&binding), Evaluation::True);
    }

    #[test]
    fn unit_propagation_forces_negation() {
        let x = Variable::new();
        let y = Variable::new();
        let cnf: Cnf = vec![Literal::from(x) | !y, Clause::unit(!x)]
            .into_iter()
            .collect();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(binding.get(x), Some(false));
        assert_ne!(binding.get(y), Some(true));
        assert_eq!(cnf.evaluate(&binding), Evaluation::True);
    }

    #[test]
    fn conflicting_units_are_unsatisfiable() {
        let x = Variable::new();
        let cnf: Cnf = vec![Clause::unit(x.into()), Clause::unit(!x)]
            .into_iter()
            .collect();

        assert!(matches!(
            solve(&cnf, &Binding::new()),
            Err(SolveError::Unsatisfiable)
        ));
    }

    #[test]
    fn exactly_one_of_four() {
        let variables: Vec<_> = (0..4).map(|_| Variable::new()).collect();
        let cnf: Cnf = exactly_one_of(&variables).into_iter().collect();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(cnf.evaluate(&binding), Evaluation::True);
        assert_eq!(count_true(&binding, &variables), 1);
    }

    #[test]
    fn overlapping_exactly_one_constraints() {
        let v: Vec<_> = (0..4).map(|_| Variable::new()).collect();
        let mut cnf = Cnf::new();
        cnf.extend_clauses(exactly_one_of(&v)).unwrap();
        cnf.extend_clauses(exactly_one_of(&v[2..])).unwrap();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(cnf.evaluate(&binding), Evaluation::True);
        assert_eq!(binding.get(v[0]), Some(false));
        assert_eq!(binding.get(v[1]), Some(false));
        assert_eq!(count_true(&binding, &v[2..]), 1);
    }

    #[test]
    fn twenty_variables_one_of_two_selectors() {
        let x: Vec<_> = (0..20).map(|_| Variable::new()).collect();
        let mut cnf = Cnf::new();
        for &xi in &x[..18] {
            cnf.add_clause(!xi | !x[18]).unwrap();
            cnf.add_clause(!xi | !x[19]).unwrap();
        }
        cnf.add_clause(Literal::from(x[18]) | Literal::from(x[19]))
            .unwrap();
        cnf.add_clause(!x[18] | !x[19]).unwrap();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(cnf.evaluate(&binding), Evaluation::True);
        assert!(x[..18].iter().all(|&xi| binding.get(xi) == Some(false)));
        assert_eq!(count_true(&binding, &x[18..]), 1);
    }

    #[test]
    fn backtracking_example() {
        let v: Vec<_> = (0..5).map(|_| Variable::new()).collect();
        let cnf: Cnf = vec![
            Literal::from(v[0]) | !v[1],
            Clause::unit(v[2].into()),
            Clause::unit(!v[1]),
            Literal::from(v[0]) | Literal::from(v[3]),
            Literal::from(v[0]) | !v[4],
            Literal::from(v[3]) | Literal::from(v[4]),
        ]
        .into_iter()
        .collect();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(cnf.evaluate(&binding), Evaluation::True);
    }

    #[test]
    fn multiple_literals_with_forced_values() {
        let l: Vec<Literal> = (0..5).map(|_| Literal::from(Variable::new())).collect();
        let cnf: Cnf = vec![
            l[0] | l[1],
            l[2] | !l[4],
            l[1] | !l[2],
            !l[0] | l[3],
            Clause::unit(!l[3]),
        ]
        .into_iter()
        .collect();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(cnf.evaluate(&binding), Evaluation::True);
        assert_eq!(binding.value(l[0]), Some(false));
        assert_eq!(binding.value(l[1]), Some(true));
        assert_eq!(binding.value(l[3]), Some(false));
    }

    #[test]
    fn starting_binding_is_respected_and_untouched() {
        let v: Vec<_> = (0..3).map(|_| Variable::new()).collect();
        let cnf: Cnf = exactly_one_of(&v).into_iter().collect();
        let starting: Binding = vec![(v[2], true)].into_iter().collect();

        let binding = solve(&cnf, &starting).unwrap();
        assert_eq!(binding.get(v[2]), Some(true));
        assert_eq!(binding.get(v[0]), Some(false));
        assert_eq!(binding.get(v[1]), Some(false));
        assert_eq!(starting.len(), 1);
    }

    #[test]
    fn starting_binding_can_make_a_formula_unsatisfiable() {
        let x = Variable::new();
        let y = Variable::new();
        let cnf: Cnf = vec![Literal::from(x) | Literal::from(y)].into_iter().collect();
        let starting: Binding = vec![(x, false), (y, false)].into_iter().collect();

        assert!(matches!(
            solve(&cnf, &starting),
            Err(SolveError::Unsatisfiable)
        ));
    }

    #[test]
    fn starting_binding_outside_closed_universe_is_rejected() {
        let x = Variable::new();
        let stranger = Variable::new();
        let mut cnf = Cnf::with_variables(vec![x]);
        cnf.add_clause(Clause::unit(x.into())).unwrap();
        let starting: Binding = vec![(stranger, true)].into_iter().collect();

        match solve(&cnf, &starting) {
            Err(SolveError::InvalidInput { variable }) => assert_eq!(variable, stranger),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn model_covers_every_variable() {
        let v: Vec<_> = (0..3).map(|_| Variable::new()).collect();
        let mut cnf = Cnf::with_variables(v.clone());
        cnf.add_clause(Clause::unit(v[0].into())).unwrap();

        let binding = solve(&cnf, &Binding::new()).unwrap();
        assert_eq!(binding.len(), 3);
        assert_eq!(binding.get(v[1]), Some(false));

        let config = SolverConfig {
            complete_model: false,
            ..SolverConfig::default()
        };
        let partial = solve_with(&cnf, &Binding::new(), config, CancelFlag::new()).unwrap();
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn cancelled_search_is_not_unsatisfiable() {
        let x = Variable::new();
        let y = Variable::new();
        let cnf: Cnf = vec![Literal::from(x) | Literal::from(y), !x | !y]
            .into_iter()
            .collect();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = solve_with(&cnf, &Binding::new(), SolverConfig::default(), cancel);
        assert!(matches!(result, Err(SolveError::Cancelled { decisions: 0 })));
    }

    #[test]
    fn empty_formula_is_satisfiable() {
        let binding = solve(&Cnf::new(), &Binding::new()).unwrap();
        assert!(binding.is_empty());
    }

    #[test]
    fn empty_clause_is_unsatisfiable() {
        let cnf: Cnf = vec![Clause::empty()].into_iter().collect();
        assert!(matches!(
            solve(&cnf, &Binding::new()),
            Err(SolveError::Unsatisfiable)
        ));
    }
}
