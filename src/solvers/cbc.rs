//! The open source [COIN-OR CBC](https://github.com/coin-or/Cbc) solver, `cbc` on the command line
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

/// COIN-OR CBC
#[derive(Debug, Clone)]
pub struct CbcSolver {
    command_name: String,
    temp_solution_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    threads: Option<u32>,
    seconds: Option<u32>,
    mip_gap: Option<f64>,
}

impl Default for CbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CbcSolver {
    /// create a solver instance
    pub fn new() -> CbcSolver {
        CbcSolver {
            command_name: "cbc".to_string(),
            temp_solution_file: None,
            log_file: None,
            threads: None,
            seconds: None,
            mip_gap: None,
        }
    }

    /// set the name of the cbc executable to use
    pub fn command_name(&self, command_name: String) -> CbcSolver {
        CbcSolver {
            command_name,
            ..self.clone()
        }
    }

    /// write the solution to this file instead of a temporary one
    pub fn with_temp_solution_file(&self, temp_solution_file: impl Into<PathBuf>) -> CbcSolver {
        CbcSolver {
            temp_solution_file: Some(temp_solution_file.into()),
            ..self.clone()
        }
    }
}

fn parse_status(first_line: &str) -> Result<Status, SolverError> {
    match first_line.split_whitespace().next() {
        Some("Optimal") => Ok(Status::Optimal),
        // Infeasible status is either "Infeasible" or "Integer infeasible"
        Some("Infeasible") | Some("Integer") => Ok(Status::Infeasible),
        Some("Unbounded") => Ok(Status::Unbounded),
        // "Stopped" can be "on time", "on iterations", "on difficulties" or "on ctrl-c".
        // Only a limit reached with an objective value leaves a usable point behind.
        Some("Stopped") => {
            let line = first_line.trim_start();
            let on_limit = line.starts_with("Stopped on time")
                || line.starts_with("Stopped on iterations");
            if on_limit
                && !first_line.contains("no integer solution")
                && parse_objective(first_line).is_some()
            {
                Ok(Status::SubOptimal)
            } else {
                Ok(Status::Unknown)
            }
        }
        Some(_) => Ok(Status::Unknown),
        None => Err(SolverError::InvalidSolution("empty cbc solution".to_string())),
    }
}

/// `Optimal - objective value 500.00000000`
fn parse_objective(first_line: &str) -> Option<f64> {
    let (_, value) = first_line.split_once("objective value")?;
    value.trim().parse().ok()
}

impl SolverWithSolutionParsing for CbcSolver {
    fn read_specific_solution<'a, P: LpProblem<'a>>(
        &self,
        f: &File,
        problem: Option<&'a P>,
    ) -> Result<Solution, SolverError> {
        let mut vars_value: HashMap<String, f64> = HashMap::new();

        // CBC keeps only non-zero values in its solution file
        if let Some(p) = problem {
            for var in p.variables() {
                vars_value.insert(var.name().to_string(), 0.0);
            }
        }

        let mut file = BufReader::new(f);
        let mut buffer = String::new();
        file.read_line(&mut buffer)?;
        let status = parse_status(&buffer)?;
        let objective = parse_objective(&buffer);

        for line in file.lines() {
            let l = line?;
            let mut result_line: Vec<_> = l.split_whitespace().collect();
            if result_line.is_empty() {
                continue;
            }
            // rows violating the constraints are flagged with "**"
            if result_line[0] == "**" {
                result_line.remove(0);
            };
            if result_line.len() == 4 {
                vars_value.insert(result_line[1].to_string(), parse_value(result_line[2])?);
            } else {
                return Err(SolverError::InvalidSolution(format!("cbc line {:?}", l)));
            }
        }
        Ok(Solution::new(status, vars_value).with_objective(objective))
    }
}

impl WithMaxSeconds<CbcSolver> for CbcSolver {
    fn max_seconds(&self) -> Option<u32> {
        self.seconds
    }
    fn with_max_seconds(&self, seconds: u32) -> CbcSolver {
        CbcSolver {
            seconds: Some(seconds),
            ..(*self).clone()
        }
    }
}

impl WithNbThreads<CbcSolver> for CbcSolver {
    fn nb_threads(&self) -> Option<u32> {
        self.threads
    }
    fn with_nb_threads(&self, threads: u32) -> CbcSolver {
        CbcSolver {
            threads: Some(threads),
            ..(*self).clone()
        }
    }
}

impl WithMipGap<CbcSolver> for CbcSolver {
    fn mip_gap(&self) -> Option<f64> {
        self.mip_gap
    }
    fn with_mip_gap(&self, mip_gap: f64) -> Result<CbcSolver, String> {
        Ok(CbcSolver {
            mip_gap: Some(check_mip_gap(mip_gap)?),
            ..(*self).clone()
        })
    }
}

impl WithLogFile<CbcSolver> for CbcSolver {
    fn with_log_file(&self, path: PathBuf) -> CbcSolver {
        CbcSolver {
            log_file: Some(path),
            ..(*self).clone()
        }
    }
}

impl SolverProgram for CbcSolver {
    fn command_name(&self) -> &str {
        &self.command_name
    }

    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString> {
        let mut args = vec![lp_file.as_os_str().to_owned()];
        for (name, value) in [
            ("seconds", self.max_seconds().map(|s| s.to_string())),
            ("threads", self.nb_threads().map(|t| t.to_string())),
            ("ratioGap", self.mip_gap().map(|g| g.to_string())),
        ]
        .iter()
        {
            if let Some(val) = value {
                args.push(name.into());
                args.push(val.into());
            }
        }
        args.extend_from_slice(&["solve".into(), "solution".into(), solution_file.into()]);
        args
    }

    fn preferred_temp_solution_file(&self) -> Option<&Path> {
        self.temp_solution_file.as_deref()
    }

    fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}
