//! Auto solvers automatically find which of their child solvers is installed on
//! the user's computer and uses it. The [AllSolvers] solvers tries all the supported solvers.

use tracing::debug;

use crate::lp_format::{LpObjective, LpProblem};
use crate::problem::{LinearExpression, Problem, Variable};
#[cfg(feature = "cplex")]
use crate::solvers::cplex::Cplex;
use crate::solvers::{
    CbcSolver, GlpkSolver, GurobiSolver, MicrolpSolver, Solution, SolverError,
};

use super::SolverTrait;

/// A solver that tries multiple solvers
#[derive(Debug, Clone)]
pub struct AutoSolver<SOLVER, NEXT>(SOLVER, NEXT);

/// The tail of a list of solvers. This one has no children and never finds any solver.
#[derive(Debug, Clone, Default)]
pub struct NoSolver;

#[cfg(not(feature = "cplex"))]
type Cplex = NoSolver;

/// An [AutoSolver] that tries, in order: Gurobi, Cplex, Cbc, Glpk and finally
/// the in-process [MicrolpSolver], which is always there
pub type AllSolvers = AutoSolver<
    GurobiSolver,
    AutoSolver<
        Cplex,
        AutoSolver<CbcSolver, AutoSolver<GlpkSolver, AutoSolver<MicrolpSolver, NoSolver>>>,
    >,
>;

impl SolverTrait for NoSolver {
    fn run<'a, P: LpProblem<'a>>(&self, _problem: &'a P) -> Result<Solution, SolverError> {
        Err(SolverError::Unavailable {
            solver: "auto".to_string(),
            reason: "no solver available".to_string(),
        })
    }
}

/// The default AutoSolver contains all supported solvers
impl<A: Default, B: Default> Default for AutoSolver<A, B> {
    fn default() -> Self {
        AutoSolver(A::default(), B::default())
    }
}

impl<SOLVER: Default, NEXT: Default> AutoSolver<SOLVER, NEXT> {
    /// Instantiate an AutoSolver with all supported solvers
    pub fn new() -> Self {
        Self::default()
    }
}

impl<SOLVER, NEXT> AutoSolver<SOLVER, NEXT> {
    /// Instantiate an AutoSolver with the given solvers
    pub fn with_solver<NewSolver>(self, solver: NewSolver) -> AutoSolver<NewSolver, Self> {
        AutoSolver(solver, self)
    }

    /// The solver tried first
    pub fn solver(&self) -> &SOLVER {
        &self.0
    }

    /// The solvers tried when the first one is missing
    pub fn fallback(&self) -> &NEXT {
        &self.1
    }
}

/// One continuous variable in [0, 1], no constraint
fn probe_problem() -> Problem {
    Problem {
        name: "dummy".to_string(),
        sense: LpObjective::Minimize,
        objective: LinearExpression::default().with_term("x", 1.),
        variables: vec![Variable {
            name: "x".to_string(),
            is_integer: false,
            lower_bound: 0.0,
            upper_bound: 1.0,
        }],
        constraints: vec![],
    }
}

impl<S: SolverTrait, T: SolverTrait> SolverTrait for AutoSolver<S, T> {
    fn run<'a, P: LpProblem<'a>>(&self, problem: &'a P) -> Result<Solution, SolverError> {
        // Try solving a dummy problem (to avoid writing a large problem to disk if not necessary)
        match self.0.run(&probe_problem()) {
            Ok(_) => self.0.run(problem),
            Err(e) => {
                debug!("skipping solver: {}", e);
                self.1.run(problem)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::Status;

    #[test]
    fn falls_through_to_the_native_solver() {
        let missing = CbcSolver::new().command_name("surely-not-an-installed-solver".to_string());
        let solver = AutoSolver::<MicrolpSolver, NoSolver>::new().with_solver(missing);
        let solution = solver.run(&probe_problem()).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.results["x"], 0.);
    }

    #[test]
    fn empty_chain_is_unavailable() {
        assert!(matches!(
            NoSolver.run(&probe_problem()),
            Err(SolverError::Unavailable { .. })
        ));
    }
}
