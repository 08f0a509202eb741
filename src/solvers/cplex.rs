//! The IBM CPLEX optimizer.
//! You need to activate the "cplex" feature of this crate to use this solver.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use xml::reader::XmlEvent;
use xml::EventReader;

use crate::lp_format::LpProblem;
use crate::solvers::{
    check_mip_gap, Solution, SolverError, SolverProgram, SolverWithSolutionParsing, Status,
    WithLogFile, WithMaxSeconds, WithMipGap, WithNbThreads,
};
use crate::util::buf_contains;

/// IBM cplex optimizer
#[derive(Debug, Clone)]
pub struct Cplex {
    command: String,
    log_file: Option<PathBuf>,
    seconds: Option<u32>,
    threads: Option<u32>,
    mip_gap: Option<f64>,
}

impl Default for Cplex {
    fn default() -> Self {
        Self::with_command("cplex".into())
    }
}

impl Cplex {
    /// Create a cplex solver from the given binary
    pub fn with_command(command: String) -> Self {
        Self {
            command,
            log_file: None,
            seconds: None,
            threads: None,
            mip_gap: None,
        }
    }
}

macro_rules! format_osstr {
    ($($parts:expr)*) => {{
        let mut s = OsString::new();
        $(s.push($parts);)*
        s
    }}
}

fn parse_status(status: &str) -> Status {
    let status = status.to_ascii_lowercase();
    if status.contains("infeasible") {
        Status::Infeasible
    } else if status.contains("unbounded") {
        Status::Unbounded
    } else if status.contains("optimal") {
        Status::Optimal
    } else if status.contains("limit") {
        Status::SubOptimal
    } else {
        Status::Unknown
    }
}

impl SolverProgram for Cplex {
    fn command_name(&self) -> &str {
        &self.command
    }

    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString> {
        let mut args = vec!["-c".into(), format_osstr!("READ \"" lp_file "\"")];
        if let Some(seconds) = self.seconds {
            args.push(format!("set timelimit {}", seconds).into());
        }
        if let Some(threads) = self.threads {
            args.push(format!("set threads {}", threads).into());
        }
        if let Some(gap) = self.mip_gap {
            args.push(format!("set mip tolerances mipgap {}", gap).into());
        }
        args.push("optimize".into());
        args.push(format_osstr!("WRITE \"" solution_file "\""));
        args
    }

    fn parse_stdout_status(&self, stdout: &[u8]) -> Option<Status> {
        if buf_contains(stdout, "No solution exists") {
            Some(Status::Infeasible)
        } else {
            None
        }
    }

    fn solution_suffix(&self) -> Option<&str> {
        Some(".sol")
    }

    fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

impl SolverWithSolutionParsing for Cplex {
    fn read_specific_solution<'a, P: LpProblem<'a>>(
        &self,
        f: &File,
        problem: Option<&'a P>,
    ) -> Result<Solution, SolverError> {
        let len = problem.map(|p| p.variables().size_hint().0).unwrap_or(0);
        let parser = EventReader::new(f);
        let mut solution = Solution {
            status: Status::Optimal,
            objective: None,
            results: HashMap::with_capacity(len),
        };
        for e in parser {
            match e {
                Ok(XmlEvent::StartElement {
                    name, attributes, ..
                }) => match name.local_name.as_str() {
                    "header" => {
                        for attr in attributes {
                            match attr.name.local_name.as_str() {
                                "objectiveValue" => solution.objective = attr.value.parse().ok(),
                                "solutionStatusString" => {
                                    solution.status = parse_status(&attr.value)
                                }
                                _ => {}
                            }
                        }
                    }
                    "variable" => {
                        let mut name = None;
                        let mut value = None;
                        for attr in attributes {
                            match attr.name.local_name.as_str() {
                                "name" => name = Some(attr.value),
                                "value" => {
                                    let parsed = attr.value.parse().map_err(|e| {
                                        SolverError::InvalidSolution(format!(
                                            "invalid variable value for {:?}: {}",
                                            name, e
                                        ))
                                    })?;
                                    value = Some(parsed)
                                }
                                _ => {}
                            };
                        }
                        if let (Some(name), Some(value)) = (name, value) {
                            solution.results.insert(name, value);
                        }
                    }
                    _ => {}
                },
                Err(e) => return Err(SolverError::InvalidSolution(format!("xml error: {}", e))),
                _ => {}
            }
        }
        Ok(solution)
    }
}

impl WithMaxSeconds<Cplex> for Cplex {
    fn max_seconds(&self) -> Option<u32> {
        self.seconds
    }
    fn with_max_seconds(&self, seconds: u32) -> Cplex {
        Cplex {
            seconds: Some(seconds),
            ..self.clone()
        }
    }
}

impl WithNbThreads<Cplex> for Cplex {
    fn nb_threads(&self) -> Option<u32> {
        self.threads
    }
    fn with_nb_threads(&self, threads: u32) -> Cplex {
        Cplex {
            threads: Some(threads),
            ..self.clone()
        }
    }
}

impl WithMipGap<Cplex> for Cplex {
    fn mip_gap(&self) -> Option<f64> {
        self.mip_gap
    }
    fn with_mip_gap(&self, mip_gap: f64) -> Result<Cplex, String> {
        Ok(Cplex {
            mip_gap: Some(check_mip_gap(mip_gap)?),
            ..self.clone()
        })
    }
}

impl WithLogFile<Cplex> for Cplex {
    fn with_log_file(&self, path: PathBuf) -> Cplex {
        Cplex {
            log_file: Some(path),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solution_status_strings() {
        assert_eq!(parse_status("optimal"), Status::Optimal);
        assert_eq!(parse_status("integer optimal solution"), Status::Optimal);
        assert_eq!(parse_status("infeasible"), Status::Infeasible);
        assert_eq!(parse_status("time limit exceeded"), Status::SubOptimal);
    }
}
