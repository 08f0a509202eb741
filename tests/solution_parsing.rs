use std::fs;
use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use prod_planning::lp_format::LpObjective;
use prod_planning::problem::{LinearExpression, Problem, Variable};
use prod_planning::solvers::{
    CbcSolver, GlpkSolver, GurobiSolver, Solution, SolverError, SolverWithSolutionParsing, Status,
};

/// `read_solution` deletes the file it reads, so each test works on a copy
fn copy_fixture(dir: &TempDir, name: &str) -> PathBuf {
    let source = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("solution_files")
        .join(name);
    let target = dir.path().join(name);
    fs::copy(source, &target).unwrap();
    target
}

fn read<S: SolverWithSolutionParsing>(solver: &S, name: &str) -> Result<Solution, SolverError> {
    let dir = TempDir::new().unwrap();
    let path = copy_fixture(&dir, name);
    let solution = solver.read_solution::<Problem>(&path, None);
    assert!(!path.exists() || solution.is_err());
    solution
}

#[test]
fn cbc_optimal() {
    let solution = read(&CbcSolver::new(), "cbc_optimal.sol").unwrap();
    assert_eq!(solution.status, Status::Optimal);
    assert_abs_diff_eq!(solution.objective.unwrap(), 100.);
    assert_eq!(solution.results["X_0"], 40.);
    assert_eq!(solution.results["I_0"], 10.);
}

#[test]
fn cbc_fills_zero_values_from_the_problem() {
    let problem = Problem {
        name: "prod_planning".to_string(),
        sense: LpObjective::Minimize,
        objective: LinearExpression::default(),
        variables: vec![
            Variable::non_negative("X_0"),
            Variable::non_negative("X_1"),
            Variable::non_negative("I_0"),
            Variable::non_negative("I_1"),
        ],
        constraints: vec![],
    };
    let dir = TempDir::new().unwrap();
    let path = copy_fixture(&dir, "cbc_optimal.sol");
    let solution = CbcSolver::new().read_solution(&path, Some(&problem)).unwrap();
    assert_eq!(solution.results.len(), 4);
    assert_eq!(solution.results["I_1"], 0.);
}

#[test]
fn cbc_infeasible_and_stopped() {
    let infeasible = read(&CbcSolver::new(), "cbc_infeasible.sol").unwrap();
    assert_eq!(infeasible.status, Status::Infeasible);

    let stopped = read(&CbcSolver::new(), "cbc_stopped.sol").unwrap();
    assert_eq!(stopped.status, Status::SubOptimal);
    assert_eq!(stopped.objective, Some(120.));
}

#[test]
fn cbc_stopped_without_integer_solution() {
    let solution = read(&CbcSolver::new(), "cbc_no_integer_solution.sol").unwrap();
    assert_eq!(solution.status, Status::Unknown);
}

#[test]
fn glpk_optimal_with_wrapped_name() {
    let solution = read(&GlpkSolver::new(), "glpk_optimal.sol").unwrap();
    assert_eq!(solution.status, Status::Optimal);
    assert_eq!(solution.objective, Some(100.));
    assert_eq!(solution.results.len(), 4);
    assert_eq!(solution.results["X_1"], 40.);
    assert_eq!(solution.results["a_very_long_variable_name"], 0.);
}

#[test]
fn glpk_infeasible() {
    let solution = read(&GlpkSolver::new(), "glpk_infeasible.sol").unwrap();
    assert_eq!(solution.status, Status::Infeasible);
}

#[test]
fn gurobi_result_file() {
    let solution = read(&GurobiSolver::new(), "gurobi.sol").unwrap();
    assert_eq!(solution.status, Status::Optimal);
    assert_eq!(solution.objective, Some(500.));
    assert_eq!(solution.results["X_0"], 100.);
    assert_eq!(solution.results["I_0"], 0.);
}

#[test]
fn missing_file_is_an_invalid_solution() {
    let dir = TempDir::new().unwrap();
    let err = CbcSolver::new()
        .read_solution::<Problem>(&dir.path().join("absent.sol"), None)
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidSolution(_)));
}
