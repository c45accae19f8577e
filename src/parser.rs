/*!
Reader for the DIMACS CNF format.

Each DIMACS variable index `i` is mapped to a freshly created [`Variable`], so the
parsed formula can be combined with formulas built in code.
*/

use std::{
    fs::File,
    io::{BufRead, BufReader},
    mem::take,
    path::{Path, PathBuf},
};

use crate::{
    binding::Binding,
    formula::{Clause, Cnf, FormulaError, Literal, Variable},
    prelude::*,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while parsing CNF file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("I/O error occurred while reading CNF input"))]
    ReadError { source: std::io::Error },
    #[snafu(display("Clause '{}' is not terminated by 0", clause))]
    MalformedClause { clause: String },
    #[snafu(display("Invalid literal found in clause '{}'", clause))]
    MalformedLiteral {
        clause: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display(
        "Literal {} is out of range (must be within 1 to {} in absolute value)",
        literal,
        num_variables
    ))]
    LiteralOutOfRange { literal: i64, num_variables: usize },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MalformedProblemDefinition,
    #[snafu(display("Clause rejected by the formula"))]
    InvalidClause { source: FormulaError },
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// A parsed DIMACS formula.
#[derive(Debug, Clone)]
pub struct Dimacs {
    pub cnf: Cnf,
    /// `variables[i]` stands for DIMACS variable `i + 1`.
    pub variables: Vec<Variable>,
}

impl Dimacs {
    /// Looks up the variable of a 1-based DIMACS index.
    pub fn variable(&self, index: usize) -> Option<Variable> {
        index
            .checked_sub(1)
            .and_then(|index| self.variables.get(index).copied())
    }

    /// Renders the binding as a DIMACS solution line, e.g. `v 1 -2 3 0`.
    /// Unbound variables are left out.
    pub fn model_line(&self, binding: &Binding) -> String {
        let mut line = String::from("v");
        for (index, &variable) in self.variables.iter().enumerate() {
            match binding.get(variable) {
                Some(true) => line.push_str(&format!(" {}", index + 1)),
                Some(false) => line.push_str(&format!(" -{}", index + 1)),
                None => (),
            }
        }
        line.push_str(" 0");
        line
    }
}

fn parse_problem_line(line: &str) -> Result<(usize, usize), Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition
    );

    match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) => Ok((num_variables, num_clauses)),
        _ => MalformedProblemDefinition.fail(),
    }
}

fn parse_literal(value: i64, variables: &[Variable]) -> Result<Literal, Error> {
    let index = value.unsigned_abs() as usize;
    ensure!(
        index <= variables.len(),
        LiteralOutOfRange {
            literal: value,
            num_variables: variables.len(),
        }
    );

    Ok(Literal::new(variables[index - 1], value > 0))
}

/// Parses CNF formula from any buffered reader.
/// Clauses may span several lines and end at `0`; a `%` line ends the input.
pub fn parse_reader(reader: impl BufRead) -> Result<Dimacs, Error> {
    let mut lines = reader.lines();

    // skip until we find the problem definition
    let mut problem = None;
    for line in &mut lines {
        let line = line.context(ReadError)?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        problem = Some(parse_problem_line(trimmed)?);
        break;
    }
    let (num_variables, num_clauses) = problem.context(MalformedProblemDefinition)?;

    let variables: Vec<Variable> = (0..num_variables).map(|_| Variable::new()).collect();
    let mut cnf = Cnf::with_variables(variables.iter().copied());

    let mut pending = Vec::new();
    let mut last_line = String::new();
    for line in lines {
        let line = line.context(ReadError)?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            // empty line, comment
            continue;
        }
        if trimmed.starts_with('%') {
            break;
        }

        for token in trimmed.split_whitespace() {
            let value = token
                .parse::<i64>()
                .context(MalformedLiteral { clause: trimmed })?;
            if value == 0 {
                cnf.add_clause(Clause::new(take(&mut pending)))
                    .context(InvalidClause)?;
            } else {
                pending.push(parse_literal(value, &variables)?);
            }
        }
        last_line = trimmed.to_owned();
    }

    ensure!(pending.is_empty(), MalformedClause { clause: last_line });
    ensure!(
        cnf.num_clauses() == num_clauses,
        ClauseCountMismatch {
            found: cnf.num_clauses(),
            expected: num_clauses,
        }
    );

    debug!(
        "Parsed CNF with {} variables and {} clauses",
        num_variables, num_clauses
    );

    Ok(Dimacs { cnf, variables })
}

pub fn parse_str(input: &str) -> Result<Dimacs, Error> {
    parse_reader(input.as_bytes())
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Dimacs, Error> {
    let path = path.as_ref();
    let file = File::open(path).context(IoError {
        path: path.to_owned(),
    })?;

    parse_reader(BufReader::new(file))
}
