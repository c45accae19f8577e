use std::{
    env::{self, args},
    path::Path,
    thread,
    time::Duration,
};

use dpllsat::{
    binding::Binding,
    parser::{self, parse_file},
    prelude::*,
    report::Report,
    solver::{solve_with, CancelFlag, SolveError, SolverConfig},
};
use pretty_env_logger::formatted_builder;

fn usage_string() -> String {
    format!(
        "Usage: {} <command>

command:
    check <file_name> [timeout_ms] - solve the given DIMACS CNF file",
        args().next().unwrap_or_else(|| "dpllsat".to_owned())
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Invalid timeout '{}'", value))]
    InvalidTimeout {
        value: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Solver gave up"))]
    SolverError { source: SolveError },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
}

/// Returns `None` if the formula is unsatisfiable.
fn solve_path(path: &Path, timeout: Option<Duration>) -> Result<Option<String>, Error> {
    let dimacs = parse_file(path).context(ParserError)?;

    let cancel = CancelFlag::new();
    if let Some(timeout) = timeout {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            cancel.cancel();
        });
    }

    match solve_with(&dimacs.cnf, &Binding::new(), SolverConfig::default(), cancel) {
        Ok(binding) => Ok(Some(dimacs.model_line(&binding))),
        Err(SolveError::Unsatisfiable) => Ok(None),
        Err(error) => Err(error).context(SolverError),
    }
}

fn dispatch_command(args: Vec<String>) -> Result<(), Error> {
    match args.get(0).map(|s| s.as_str()) {
        Some("check") => {
            let path = args.get(1).context(MissingArgument)?;
            let timeout = match args.get(2) {
                Some(value) => Some(Duration::from_millis(
                    value.parse::<u64>().context(InvalidTimeout { value })?,
                )),
                None => None,
            };

            if let Some(model) = solve_path(path.as_ref(), timeout)? {
                println!("SAT\n{}", model);
            } else {
                println!("UNSAT");
            }
        }
        Some(name) => UnknownCommand {
            name: name.to_owned(),
        }
        .fail()?,
        None => MissingArgument.fail()?,
    }

    Ok(())
}

/// Used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = if cfg!(debug_assertions) {
    "dpllsat=debug"
} else {
    "dpllsat=warn"
};

fn init_logger() -> Result<(), log::SetLoggerError> {
    let filters = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    formatted_builder().parse_filters(&filters).try_init()
}

fn main() -> Result<(), Report> {
    init_logger()?;

    let mut args = args();

    // drop arg[0]
    args.next();

    let remaining: Vec<_> = args.collect();
    if remaining.is_empty() {
        println!("{}", usage_string());
        return Ok(());
    }

    dispatch_command(remaining)?;

    Ok(())
}
