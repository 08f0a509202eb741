//! Selection and configuration of the solver engine for a planning run.
//!
//! [SolveAdapter] is the only place where engine specific types appear:
//! the planning model hands over its neutral [Problem](crate::problem::Problem)
//! and gets a [SolveResult] back, whatever engine did the work.
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PlanningError, PlanningResult};
use crate::lp_format::LpProblem;
use crate::planning::PlanningModel;
use crate::problem::Problem;
use crate::solvers::{
    check_mip_gap, AllSolvers, AutoSolver, CbcSolver, GlpkSolver, GurobiSolver, MicrolpSolver,
    NoSolver, Solution, SolverError, SolverTrait, Status, WithLogFile, WithMaxSeconds, WithMipGap,
    WithNbThreads,
};

/// Engines a planning run can be solved with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// In-process simplex, always available
    #[default]
    Native,
    /// COIN-OR `cbc`
    Cbc,
    /// GNU `glpsol`
    Glpk,
    /// `gurobi_cl`
    Gurobi,
    /// Requires the `cplex` cargo feature
    Cplex,
    /// First engine found on the machine
    Auto,
}

impl FromStr for SolverKind {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "microlp" => Ok(SolverKind::Native),
            "cbc" => Ok(SolverKind::Cbc),
            "glpk" | "glpsol" => Ok(SolverKind::Glpk),
            "gurobi" => Ok(SolverKind::Gurobi),
            "cplex" => Ok(SolverKind::Cplex),
            "auto" => Ok(SolverKind::Auto),
            other => Err(PlanningError::InvalidInput(format!(
                "unknown solver {:?}, expected one of native, cbc, glpk, gurobi, cplex, auto",
                other
            ))),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolverKind::Native => "native",
            SolverKind::Cbc => "cbc",
            SolverKind::Glpk => "glpk",
            SolverKind::Gurobi => "gurobi",
            SolverKind::Cplex => "cplex",
            SolverKind::Auto => "auto",
        })
    }
}

/// Immutable options of one solve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConfig {
    /// Relative optimality gap, in `[0, 1)`
    pub mip_gap: Option<f64>,
    /// Wall clock limit in seconds
    pub time_limit: Option<u32>,
    /// Threads of the engines that support it
    pub threads: Option<u32>,
    /// Write the model in LP format to this path before solving
    pub write_lp: Option<PathBuf>,
    /// Copy the engine output to this path
    pub write_log: Option<PathBuf>,
    /// Log every variable value of the solution
    pub verbose: bool,
}

/// Normalized outcome of a solve. Only [Status::Optimal] and [Status::SubOptimal]
/// carry an objective value and variable values.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Termination status
    pub status: Status,
    /// Reported by the engine, when it does
    pub objective_value: Option<f64>,
    /// Value of each variable, by name
    pub variable_values: HashMap<String, f64>,
}

impl From<Solution> for SolveResult {
    fn from(solution: Solution) -> Self {
        if solution.status.has_solution() {
            SolveResult {
                status: solution.status,
                objective_value: solution.objective,
                variable_values: solution.results,
            }
        } else {
            SolveResult {
                status: solution.status,
                objective_value: None,
                variable_values: HashMap::new(),
            }
        }
    }
}

/// Runs a [PlanningModel] through the configured engine
#[derive(Debug, Clone)]
pub struct SolveAdapter {
    kind: SolverKind,
    config: SolverConfig,
}

impl SolveAdapter {
    /// Fails on a MIP gap outside `[0, 1)` or a zero time limit
    pub fn new(kind: SolverKind, config: SolverConfig) -> PlanningResult<Self> {
        if let Some(gap) = config.mip_gap {
            check_mip_gap(gap).map_err(PlanningError::InvalidInput)?;
        }
        if config.time_limit == Some(0) {
            return Err(PlanningError::InvalidInput(
                "time_limit must be at least one second".to_string(),
            ));
        }
        Ok(SolveAdapter { kind, config })
    }

    /// Selected engine
    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    /// Options of every solve
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve once. Nothing is retried: a missing engine is reported as
    /// [PlanningError::SolverUnavailable].
    pub fn solve(&self, model: &PlanningModel) -> PlanningResult<SolveResult> {
        let problem = model.problem();
        for path in [&self.config.write_lp, &self.config.write_log].into_iter().flatten() {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
        }
        if let Some(path) = &self.config.write_lp {
            info!("Writing the lp file to {}", path.display());
            problem.write_lp_file(path)?;
        }

        info!(solver = %self.kind, "solving {}", problem.name);
        let solution = self.run(problem)?;
        let result = SolveResult::from(solution);
        if self.config.verbose {
            let mut values: Vec<_> = result.variable_values.iter().collect();
            values.sort_by(|a, b| a.0.cmp(b.0));
            for (name, value) in values {
                info!("{} = {}", name, value);
            }
        }
        Ok(result)
    }

    fn run(&self, problem: &Problem) -> PlanningResult<Solution> {
        let config = &self.config;
        let solution = match self.kind {
            SolverKind::Native => {
                if config.time_limit.is_some() || config.mip_gap.is_some() {
                    debug!("time limit and mip gap do not apply to the native solver");
                }
                MicrolpSolver::new().run(problem)
            }
            SolverKind::Cbc => cbc(config)?.run(problem),
            SolverKind::Glpk => glpk(config)?.run(problem),
            SolverKind::Gurobi => gurobi(config)?.run(problem),
            SolverKind::Cplex => run_cplex(problem, config)?,
            SolverKind::Auto => auto_chain(config)?.run(problem),
        };
        Ok(solution?)
    }
}

fn configure<S>(mut solver: S, config: &SolverConfig) -> PlanningResult<S>
where
    S: WithMaxSeconds<S> + WithMipGap<S> + WithLogFile<S>,
{
    if let Some(seconds) = config.time_limit {
        solver = solver.with_max_seconds(seconds);
    }
    if let Some(gap) = config.mip_gap {
        solver = solver.with_mip_gap(gap).map_err(PlanningError::InvalidInput)?;
    }
    if let Some(path) = &config.write_log {
        solver = solver.with_log_file(path.clone());
    }
    Ok(solver)
}

fn with_threads<S: WithNbThreads<S>>(solver: S, threads: Option<u32>) -> S {
    match threads {
        Some(threads) => solver.with_nb_threads(threads),
        None => solver,
    }
}

fn cbc(config: &SolverConfig) -> PlanningResult<CbcSolver> {
    Ok(with_threads(configure(CbcSolver::new(), config)?, config.threads))
}

fn glpk(config: &SolverConfig) -> PlanningResult<GlpkSolver> {
    if config.threads.is_some() {
        debug!("glpk runs on a single thread");
    }
    configure(GlpkSolver::new(), config)
}

fn gurobi(config: &SolverConfig) -> PlanningResult<GurobiSolver> {
    Ok(with_threads(configure(GurobiSolver::new(), config)?, config.threads))
}

#[cfg(feature = "cplex")]
fn cplex(config: &SolverConfig) -> PlanningResult<crate::solvers::cplex::Cplex> {
    Ok(with_threads(
        configure(crate::solvers::cplex::Cplex::default(), config)?,
        config.threads,
    ))
}

#[cfg(not(feature = "cplex"))]
fn cplex(_config: &SolverConfig) -> PlanningResult<NoSolver> {
    Ok(NoSolver)
}

/// Every engine of [AllSolvers], each one configured as for a direct run
fn auto_chain(config: &SolverConfig) -> PlanningResult<AllSolvers> {
    Ok(AutoSolver::<MicrolpSolver, NoSolver>::new()
        .with_solver(glpk(config)?)
        .with_solver(cbc(config)?)
        .with_solver(cplex(config)?)
        .with_solver(gurobi(config)?))
}

type SolveOutcome = Result<Solution, SolverError>;

#[cfg(feature = "cplex")]
fn run_cplex(problem: &Problem, config: &SolverConfig) -> PlanningResult<SolveOutcome> {
    Ok(cplex(config)?.run(problem))
}

#[cfg(not(feature = "cplex"))]
fn run_cplex(_problem: &Problem, _config: &SolverConfig) -> PlanningResult<SolveOutcome> {
    Ok(Err(SolverError::Unavailable {
        solver: "cplex".to_string(),
        reason: "built without the \"cplex\" feature".to_string(),
    }))
}
