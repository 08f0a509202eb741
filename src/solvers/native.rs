//! A pure rust simplex solver running in-process, through the [microlp] crate.
//! It needs nothing installed on the system, but only handles continuous variables.
use std::cmp::Ordering;
use std::collections::HashMap;

use microlp::{ComparisonOp, OptimizationDirection};
use tracing::debug;

use crate::lp_format::{AsLinearExpression, AsVariable, LpObjective, LpProblem};
use crate::solvers::{Solution, SolverError, SolverTrait, Status};

/// In-process simplex solver
#[derive(Debug, Clone, Default)]
pub struct MicrolpSolver;

impl MicrolpSolver {
    /// create a solver instance
    pub fn new() -> Self {
        MicrolpSolver
    }
}

fn comparison(operator: Ordering) -> ComparisonOp {
    match operator {
        Ordering::Less => ComparisonOp::Le,
        Ordering::Equal => ComparisonOp::Eq,
        Ordering::Greater => ComparisonOp::Ge,
    }
}

impl SolverTrait for MicrolpSolver {
    fn run<'a, P: LpProblem<'a>>(&self, problem: &'a P) -> Result<Solution, SolverError> {
        let direction = match problem.sense() {
            LpObjective::Minimize => OptimizationDirection::Minimize,
            LpObjective::Maximize => OptimizationDirection::Maximize,
        };

        // objective coefficients are attached to the variables themselves
        let mut objective: HashMap<&str, f64> = HashMap::new();
        let objective_expression = problem.objective();
        for (name, coefficient) in objective_expression.terms() {
            *objective.entry(name.as_str()).or_insert(0.) += coefficient;
        }

        let mut lp = microlp::Problem::new(direction);
        let mut names = Vec::new();
        let mut columns = HashMap::new();
        for variable in problem.variables() {
            if variable.is_integer() {
                return Err(SolverError::Unsupported(format!(
                    "integer variable {}",
                    variable.name()
                )));
            }
            let name = variable.name().to_string();
            let coefficient = objective.get(name.as_str()).copied().unwrap_or(0.);
            let column = lp.add_var(
                coefficient,
                (variable.lower_bound(), variable.upper_bound()),
            );
            columns.insert(name.clone(), column);
            names.push((name, column));
        }
        if let Some((name, _)) = objective.iter().find(|(n, _)| !columns.contains_key(**n)) {
            return Err(SolverError::Unsupported(format!(
                "undeclared variable {} in the objective",
                name
            )));
        }

        for constraint in problem.constraints() {
            let mut row = Vec::new();
            for (name, coefficient) in constraint.lhs.terms() {
                let column = columns.get(name).ok_or_else(|| {
                    SolverError::Unsupported(format!(
                        "undeclared variable {} in a constraint",
                        name
                    ))
                })?;
                row.push((*column, *coefficient));
            }
            lp.add_constraint(row, comparison(constraint.operator), constraint.rhs);
        }

        debug!(
            variables = names.len(),
            "solving {} in-process",
            problem.name()
        );
        match lp.solve() {
            Ok(solved) => {
                let results = names
                    .into_iter()
                    .map(|(name, column)| (name, solved[column]))
                    .collect();
                Ok(Solution::new(Status::Optimal, results).with_objective(Some(solved.objective())))
            }
            Err(microlp::Error::Infeasible) => {
                Ok(Solution::new(Status::Infeasible, HashMap::new()))
            }
            Err(microlp::Error::Unbounded) => Ok(Solution::new(Status::Unbounded, HashMap::new())),
            #[allow(unreachable_patterns)]
            Err(e) => Err(SolverError::InvalidSolution(e.to_string())),
        }
    }
}
