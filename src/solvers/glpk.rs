//! The GNU Linear Programming Kit, `glpsol` on the command line
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::lp_format::*;
use crate::solvers::{
    check_mip_gap, parse_value, Solution, SolverError, SolverProgram, SolverWithSolutionParsing,
    Status, WithLogFile, WithMaxSeconds, WithMipGap,
};

/// GLPK through its `glpsol` executable
#[derive(Debug, Clone)]
pub struct GlpkSolver {
    command_name: String,
    temp_solution_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    seconds: Option<u32>,
    mip_gap: Option<f64>,
}

impl Default for GlpkSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl GlpkSolver {
    /// create a solver instance
    pub fn new() -> GlpkSolver {
        GlpkSolver {
            command_name: "glpsol".to_string(),
            temp_solution_file: None,
            log_file: None,
            seconds: None,
            mip_gap: None,
        }
    }

    /// set the name of the glpsol executable to use
    pub fn command_name(&self, command_name: String) -> GlpkSolver {
        GlpkSolver {
            command_name,
            ..self.clone()
        }
    }

    /// write the solution to this file instead of a temporary one
    pub fn with_temp_solution_file(&self, temp_solution_file: impl Into<PathBuf>) -> GlpkSolver {
        GlpkSolver {
            temp_solution_file: Some(temp_solution_file.into()),
            ..self.clone()
        }
    }
}

fn invalid(message: &str) -> SolverError {
    SolverError::InvalidSolution(format!("glpk: {}", message))
}

fn header_value<'l>(lines: &'l [String], key: &str) -> Result<&'l str, SolverError> {
    lines
        .iter()
        .find_map(|l| l.strip_prefix(key))
        .map(str::trim)
        .ok_or_else(|| invalid(&format!("no {:?} line", key)))
}

fn parse_status(status: &str) -> Status {
    match status {
        "INTEGER OPTIMAL" | "OPTIMAL" => Status::Optimal,
        "INTEGER NON-OPTIMAL" | "FEASIBLE" => Status::SubOptimal,
        "INFEASIBLE (FINAL)" | "INFEASIBLE (INTERMEDIATE)" | "INTEGER EMPTY" => Status::Infeasible,
        "UNBOUNDED" => Status::Unbounded,
        _ => Status::Unknown,
    }
}

/// `obj = 500 (MINimum)`
fn parse_objective(objective_line: &str) -> Option<f64> {
    let (_, value) = objective_line.split_once('=')?;
    value.split_whitespace().next()?.parse().ok()
}

impl SolverWithSolutionParsing for GlpkSolver {
    fn read_specific_solution<'a, P: LpProblem<'a>>(
        &self,
        f: &File,
        _problem: Option<&'a P>,
    ) -> Result<Solution, SolverError> {
        let lines = BufReader::new(f).lines().collect::<Result<Vec<String>, _>>()?;

        // "Columns:    2" or "Columns:    2 (2 integer, 0 binary)"
        let col: usize = header_value(&lines, "Columns:")?
            .split_whitespace()
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| invalid("column count"))?;
        let status = parse_status(header_value(&lines, "Status:")?);
        let objective = header_value(&lines, "Objective:")
            .ok()
            .and_then(parse_objective);

        let header = lines
            .iter()
            .position(|l| l.trim_start().starts_with("No. Column name"))
            .ok_or_else(|| invalid("no column section"))?;
        // skip the header and the dashed line under it
        let mut result_lines = lines[header + 2..].iter();

        let mut vars_value: HashMap<_, _> = HashMap::with_capacity(col);
        for _ in 0..col {
            let line = result_lines
                .next()
                .ok_or_else(|| invalid("not all columns are present"))?;
            let result_line: Vec<_> = line.split_whitespace().collect();
            let (name, activity) = match result_line.len() {
                // names longer than the column are printed alone,
                // the values follow on the next line
                2 => {
                    let next = result_lines
                        .next()
                        .ok_or_else(|| invalid("truncated column specification"))?;
                    (result_line[1], next.split_whitespace().nth(1))
                }
                n if n >= 4 => (result_line[1], Some(result_line[3])),
                _ => return Err(invalid("column specification has too few fields")),
            };
            let activity = activity.ok_or_else(|| invalid("column without activity"))?;
            vars_value.insert(name.to_string(), parse_value(activity)?);
        }
        Ok(Solution::new(status, vars_value).with_objective(objective))
    }
}

impl WithMaxSeconds<GlpkSolver> for GlpkSolver {
    fn max_seconds(&self) -> Option<u32> {
        self.seconds
    }
    fn with_max_seconds(&self, seconds: u32) -> GlpkSolver {
        GlpkSolver {
            seconds: Some(seconds),
            ..self.clone()
        }
    }
}

impl WithMipGap<GlpkSolver> for GlpkSolver {
    fn mip_gap(&self) -> Option<f64> {
        self.mip_gap
    }
    fn with_mip_gap(&self, mip_gap: f64) -> Result<GlpkSolver, String> {
        Ok(GlpkSolver {
            mip_gap: Some(check_mip_gap(mip_gap)?),
            ..self.clone()
        })
    }
}

impl WithLogFile<GlpkSolver> for GlpkSolver {
    fn with_log_file(&self, path: PathBuf) -> GlpkSolver {
        GlpkSolver {
            log_file: Some(path),
            ..self.clone()
        }
    }
}

impl SolverProgram for GlpkSolver {
    fn command_name(&self) -> &str {
        &self.command_name
    }

    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--lp".into(),
            lp_file.into(),
            "-o".into(),
            solution_file.into(),
        ];
        if let Some(seconds) = self.max_seconds() {
            args.push("--tmlim".into());
            args.push(seconds.to_string().into());
        }
        if let Some(gap) = self.mip_gap() {
            args.push("--mipgap".into());
            args.push(gap.to_string().into());
        }
        args
    }

    fn preferred_temp_solution_file(&self) -> Option<&Path> {
        self.temp_solution_file.as_deref()
    }

    fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}
