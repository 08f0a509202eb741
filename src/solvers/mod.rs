//! This module provides the interface to different solvers.
//!
//! The command line solvers ([CbcSolver], [GlpkSolver], [GurobiSolver] and, with the
//! `cplex` feature, [cplex::Cplex]) need to be installed on the system: the problem is
//! written to a temporary .lp file, the solver binary is invoked on it and its solution
//! file is parsed back.
//!
//! [MicrolpSolver] runs in-process and is always available.
//! [AllSolvers] picks the first solver that works on the current machine.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

use crate::lp_format::LpProblem;
use crate::util::tail_lines;

pub use self::auto::*;
pub use self::cbc::*;
pub use self::glpk::*;
pub use self::gurobi::*;
pub use self::native::*;

pub mod auto;
pub mod cbc;
#[cfg(feature = "cplex")]
pub mod cplex;
pub mod glpk;
pub mod gurobi;
pub mod native;

/// Outcome reported by a solver
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    /// A proven optimum was found
    Optimal,
    /// The solver stopped on a limit with a feasible, possibly non optimal, point
    SubOptimal,
    /// No point satisfies the constraints
    Infeasible,
    /// The objective can be improved indefinitely
    Unbounded,
    /// The solver did not report anything usable
    Unknown,
}

impl Status {
    /// Whether the solution carries usable variable values
    pub fn has_solution(self) -> bool {
        matches!(self, Status::Optimal | Status::SubOptimal)
    }
}

/// Raw result of a solver run
#[derive(Debug, Clone)]
pub struct Solution {
    /// Termination status
    pub status: Status,
    /// Objective value, when the solver reports it
    pub objective: Option<f64>,
    /// Value of each variable, by name
    pub results: HashMap<String, f64>,
}

impl Solution {
    /// A solution without objective value
    pub fn new(status: Status, results: HashMap<String, f64>) -> Solution {
        Solution {
            status,
            objective: None,
            results,
        }
    }

    /// Attach the objective value reported by the solver
    pub fn with_objective(self, objective: Option<f64>) -> Solution {
        Solution { objective, ..self }
    }
}

/// Failure to obtain a [Solution] from a solver
#[derive(Error, Debug)]
pub enum SolverError {
    /// The solver binary is missing, or it refused to run (licensing, ...)
    #[error("solver {solver} is unavailable: {reason}")]
    Unavailable {
        /// Command or engine name
        solver: String,
        /// What went wrong
        reason: String,
    },
    /// The solver ran but its output could not be understood
    #[error("incorrect solution format: {0}")]
    InvalidSolution(String),
    /// The problem uses a feature this solver does not handle
    #[error("unsupported by this solver: {0}")]
    Unsupported(String),
    /// Reading or writing the exchange files failed
    #[error("solver i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Anything able to solve an [LpProblem]
pub trait SolverTrait {
    /// Solve the problem, blocking until the solver returns
    fn run<'a, P: LpProblem<'a>>(&self, problem: &'a P) -> Result<Solution, SolverError>;
}

/// Solvers that communicate their result through a solution file
pub trait SolverWithSolutionParsing {
    /// Parse the given solution file, then delete it
    fn read_solution<'a, P: LpProblem<'a>>(
        &self,
        temp_solution_file: &Path,
        problem: Option<&'a P>,
    ) -> Result<Solution, SolverError> {
        let f = File::open(temp_solution_file).map_err(|e| {
            SolverError::InvalidSolution(format!(
                "cannot open {}: {}",
                temp_solution_file.display(),
                e
            ))
        })?;
        let res = self.read_specific_solution(&f, problem)?;
        let _ = fs::remove_file(temp_solution_file);
        Ok(res)
    }
    /// Parse the solver specific solution format
    fn read_specific_solution<'a, P: LpProblem<'a>>(
        &self,
        f: &File,
        problem: Option<&'a P>,
    ) -> Result<Solution, SolverError>;
}

/// A solver invoked as an external program
pub trait SolverProgram {
    /// Executable to run
    fn command_name(&self) -> &str;
    /// Command line arguments, given the problem file and where to write the solution
    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString>;
    /// Solution file chosen by the user instead of a temporary one
    fn preferred_temp_solution_file(&self) -> Option<&Path> {
        None
    }
    /// Some solvers only report the status on their standard output
    fn parse_stdout_status(&self, _stdout: &[u8]) -> Option<Status> {
        None
    }
    /// Extension the solver expects for its solution file
    fn solution_suffix(&self) -> Option<&str> {
        None
    }
    /// Where to copy the solver's standard output
    fn log_file(&self) -> Option<&Path> {
        None
    }
}

impl<T: SolverProgram + SolverWithSolutionParsing> SolverTrait for T {
    fn run<'a, P: LpProblem<'a>>(&self, problem: &'a P) -> Result<Solution, SolverError> {
        let command_name = self.command_name();
        let file_model = problem.to_tmp_file()?;

        // the temporary solution file lives until the solution has been read
        let (solution_path, _temp_solution) = match self.preferred_temp_solution_file() {
            Some(path) => (path.to_path_buf(), None),
            None => {
                let tmp = tempfile::Builder::new()
                    .prefix(problem.name())
                    .suffix(self.solution_suffix().unwrap_or(".sol"))
                    .tempfile()?;
                (tmp.path().to_path_buf(), Some(tmp))
            }
        };

        let arguments = self.arguments(file_model.path(), &solution_path);
        debug!(command = command_name, ?arguments, "running solver");
        let output = Command::new(command_name)
            .args(&arguments)
            .output()
            .map_err(|e| SolverError::Unavailable {
                solver: command_name.to_string(),
                reason: e.to_string(),
            })?;

        debug!("{} output:\n{}", command_name, String::from_utf8_lossy(&output.stdout));
        if let Some(log_file) = self.log_file() {
            fs::write(log_file, &output.stdout)?;
        }

        if !output.status.success() {
            let mut reason = format!("exited with {}", output.status);
            let combined = [output.stdout.as_slice(), output.stderr.as_slice()].concat();
            let details = tail_lines(&combined, 3);
            if !details.is_empty() {
                reason.push_str(": ");
                reason.push_str(&details);
            }
            return Err(SolverError::Unavailable {
                solver: command_name.to_string(),
                reason,
            });
        }

        match self.parse_stdout_status(&output.stdout) {
            Some(status) if !status.has_solution() => {
                warn!(command = command_name, ?status, "solver reported no solution");
                Ok(Solution::new(status, HashMap::new()))
            }
            // the solution file alone does not tell a time limit from an optimum
            Some(status) => {
                let solution = self.read_solution(&solution_path, Some(problem))?;
                Ok(Solution { status, ..solution })
            }
            None => self.read_solution(&solution_path, Some(problem)),
        }
    }
}

/// Configure a time limit
pub trait WithMaxSeconds<T> {
    /// get max seconds
    fn max_seconds(&self) -> Option<u32>;
    /// set max seconds
    fn with_max_seconds(&self, seconds: u32) -> T;
}

/// Configure the number of threads used by large problems
pub trait WithNbThreads<T> {
    /// get thread count
    fn nb_threads(&self) -> Option<u32>;
    /// set thread count
    fn with_nb_threads(&self, threads: u32) -> T;
}

/// Configure the relative MIP gap at which the solver stops
pub trait WithMipGap<T> {
    /// get the relative gap
    fn mip_gap(&self) -> Option<f64>;
    /// set the relative gap. Must be in `[0, 1)`
    fn with_mip_gap(&self, mip_gap: f64) -> Result<T, String>;
}

/// Configure a file receiving the solver's standard output
pub trait WithLogFile<T> {
    /// set the log file
    fn with_log_file(&self, path: PathBuf) -> T;
}

pub(crate) fn check_mip_gap(mip_gap: f64) -> Result<f64, String> {
    if mip_gap.is_finite() && (0.0..1.0).contains(&mip_gap) {
        Ok(mip_gap)
    } else {
        Err(format!("mip gap must be in [0, 1), got {}", mip_gap))
    }
}

/// Values parsed from solution files are usually written with few digits.
pub(crate) fn parse_value(token: &str) -> Result<f64, SolverError> {
    token
        .parse::<f64>()
        .map_err(|e| SolverError::InvalidSolution(format!("{:?}: {}", token, e)))
}
