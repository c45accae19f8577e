#[macro_use]
extern crate log;

pub mod binding;
pub mod formula;
pub mod parser;
pub mod prelude;
pub mod report;
pub mod solver;

pub use binding::Binding;
pub use formula::{exactly_one_of, Clause, Cnf, Evaluate, Evaluation, Literal, Variable};
pub use solver::{solve, solve_with, CancelFlag, SolveError, SolverConfig};
