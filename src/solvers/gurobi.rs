//! The proprietary gurobi solver
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::lp_format::*;
use crate::solvers::{
    check_mip_gap, parse_value, Solution, SolverError, SolverProgram, SolverWithSolutionParsing,
    Status, WithLogFile, WithMaxSeconds, WithMipGap, WithNbThreads,
};
use crate::util::buf_contains;

/// The proprietary gurobi solver
#[derive(Debug, Clone)]
pub struct GurobiSolver {
    command_name: String,
    temp_solution_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    seconds: Option<u32>,
    threads: Option<u32>,
    mip_gap: Option<f64>,
}

impl Default for GurobiSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl GurobiSolver {
    /// create a solver instance
    pub fn new() -> GurobiSolver {
        GurobiSolver {
            command_name: "gurobi_cl".to_string(),
            temp_solution_file: None,
            log_file: None,
            seconds: None,
            threads: None,
            mip_gap: None,
        }
    }
    /// set the name of the commandline gurobi executable to use
    pub fn command_name(&self, command_name: String) -> GurobiSolver {
        GurobiSolver {
            command_name,
            ..self.clone()
        }
    }
}

impl SolverWithSolutionParsing for GurobiSolver {
    fn read_specific_solution<'a, P: LpProblem<'a>>(
        &self,
        f: &File,
        _problem: Option<&'a P>,
    ) -> Result<Solution, SolverError> {
        let mut vars_value: HashMap<_, _> = HashMap::new();
        let mut objective = None;
        let file = BufReader::new(f);

        for line in file.lines() {
            let l = line?;

            // Gurobi writes comments in the header of the file,
            // one of them holds the objective value
            if let Some(comment) = l.strip_prefix('#') {
                if let Some((_, value)) = comment.split_once("Objective value =") {
                    objective = value.trim().parse().ok();
                }
                continue;
            }

            let result_line: Vec<_> = l.split_whitespace().collect();
            match result_line.len() {
                0 => continue,
                2 => {
                    vars_value.insert(result_line[0].to_string(), parse_value(result_line[1])?);
                }
                _ => return Err(SolverError::InvalidSolution(format!("gurobi line {:?}", l))),
            }
        }
        // the result file is only written when a solution exists
        Ok(Solution::new(Status::Optimal, vars_value).with_objective(objective))
    }
}

impl WithMaxSeconds<GurobiSolver> for GurobiSolver {
    fn max_seconds(&self) -> Option<u32> {
        self.seconds
    }
    fn with_max_seconds(&self, seconds: u32) -> GurobiSolver {
        GurobiSolver {
            seconds: Some(seconds),
            ..self.clone()
        }
    }
}

impl WithNbThreads<GurobiSolver> for GurobiSolver {
    fn nb_threads(&self) -> Option<u32> {
        self.threads
    }
    fn with_nb_threads(&self, threads: u32) -> GurobiSolver {
        GurobiSolver {
            threads: Some(threads),
            ..self.clone()
        }
    }
}

impl WithMipGap<GurobiSolver> for GurobiSolver {
    fn mip_gap(&self) -> Option<f64> {
        self.mip_gap
    }
    fn with_mip_gap(&self, mip_gap: f64) -> Result<GurobiSolver, String> {
        Ok(GurobiSolver {
            mip_gap: Some(check_mip_gap(mip_gap)?),
            ..self.clone()
        })
    }
}

impl WithLogFile<GurobiSolver> for GurobiSolver {
    fn with_log_file(&self, path: PathBuf) -> GurobiSolver {
        GurobiSolver {
            log_file: Some(path),
            ..self.clone()
        }
    }
}

impl SolverProgram for GurobiSolver {
    fn command_name(&self) -> &str {
        &self.command_name
    }

    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        for (name, value) in [
            ("TimeLimit", self.max_seconds().map(|s| s.to_string())),
            ("Threads", self.nb_threads().map(|t| t.to_string())),
            ("MIPGap", self.mip_gap().map(|g| g.to_string())),
        ] {
            if let Some(value) = value {
                args.push(format!("{}={}", name, value).into());
            }
        }
        let mut result_file: OsString = "ResultFile=".into();
        result_file.push(solution_file.as_os_str());
        args.push(result_file);
        args.push(lp_file.into());
        args
    }

    fn preferred_temp_solution_file(&self) -> Option<&Path> {
        self.temp_solution_file.as_deref()
    }

    /// The last status line printed by gurobi_cl wins.
    /// "Infeasible or unbounded model" comes from presolve and is reported as infeasible:
    /// rerunning with `DualReductions=0` would be needed to tell them apart.
    fn parse_stdout_status(&self, stdout: &[u8]) -> Option<Status> {
        let text = String::from_utf8_lossy(stdout);
        let mut status = None;
        for line in text.lines().map(str::trim) {
            let found = if line.starts_with("Optimal solution found") {
                Status::Optimal
            } else if line == "Infeasible or unbounded model"
                || line == "Infeasible model"
                || line == "Model is infeasible"
            {
                Status::Infeasible
            } else if line == "Unbounded model" {
                Status::Unbounded
            } else if line.starts_with("Time limit reached") {
                if buf_contains(stdout, "Solution count 0") {
                    Status::Unknown
                } else {
                    Status::SubOptimal
                }
            } else {
                continue;
            };
            status = Some(found);
        }
        status
    }

    fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_status() {
        let solver = GurobiSolver::new();
        assert_eq!(
            solver.parse_stdout_status(b"Optimal solution found (tolerance 1.00e-04)"),
            Some(Status::Optimal)
        );
        assert_eq!(
            solver.parse_stdout_status(b"Model is infeasible\nBest objective -, best bound -"),
            Some(Status::Infeasible)
        );
        assert_eq!(
            solver.parse_stdout_status(b"Presolve time: 0.00s\n\nInfeasible or unbounded model\n"),
            Some(Status::Infeasible)
        );
        assert_eq!(
            solver.parse_stdout_status(b"Solved in 3 iterations\nUnbounded model\n"),
            Some(Status::Unbounded)
        );
        assert_eq!(
            solver.parse_stdout_status(b"Time limit reached\nBest objective 1.2e+02"),
            Some(Status::SubOptimal)
        );
        assert_eq!(
            solver.parse_stdout_status(b"Solution count 0\n\nTime limit reached\nBest objective -"),
            Some(Status::Unknown)
        );
        assert_eq!(solver.parse_stdout_status(b"Read LP format model"), None);
    }

    #[test]
    fn parameters_come_before_the_model() {
        let solver = GurobiSolver::new().with_max_seconds(60).with_nb_threads(4);
        let args = solver.arguments(Path::new("m.lp"), Path::new("m.sol"));
        assert_eq!(
            args,
            ["TimeLimit=60", "Threads=4", "ResultFile=m.sol", "m.lp"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }
}
