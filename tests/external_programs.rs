//! Solver adapters driven against stand-in programs that replay recorded gurobi_cl output
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use prod_planning::planning::{GlobalParameters, PeriodRecord, PlanningModel};
use prod_planning::solve::SolveResult;
use prod_planning::solvers::{GurobiSolver, SolverTrait, Status, WithMaxSeconds};
use prod_planning::PlanningError;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("solution_files")
        .join(name)
}

/// A gurobi_cl replacement printing `log` and writing `result` to its `ResultFile=`
fn fake_gurobi(dir: &Path, log: &str, result: Option<&str>) -> String {
    let mut script = String::from(
        r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    ResultFile=*) result="${arg#ResultFile=}" ;;
  esac
done
"#,
    );
    script.push_str(&format!("cat '{}'\n", fixture(log).display()));
    if let Some(content) = result {
        script.push_str(&format!("printf '{}' > \"$result\"\n", content));
    }
    let path = dir.join(log.replace(".log", ".sh"));
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn model(demand: f64, production_capacity: f64) -> PlanningModel {
    PlanningModel::build(
        &[PeriodRecord {
            demand,
            production_capacity,
            production_cost: 1.,
        }],
        &GlobalParameters {
            initial_inventory: 0.,
            holding_cost: 1.,
        },
    )
    .unwrap()
}

// both cases share one test so that no other thread forks while a script is being written
#[test]
fn gurobi_statuses_come_from_stdout() {
    let dir = TempDir::new().unwrap();

    // stopped on the time limit with an incumbent
    let command = fake_gurobi(
        dir.path(),
        "gurobi_time_limit.log",
        Some("# Objective value = 70\\nX_0 60\\nI_0 10\\n"),
    );
    let stopped = model(50., 100.);
    let solution = GurobiSolver::new()
        .command_name(command)
        .with_max_seconds(1)
        .run(stopped.problem())
        .unwrap();
    assert_eq!(solution.status, Status::SubOptimal);
    let plan = stopped.plan(&SolveResult::from(solution)).unwrap();
    assert_eq!(plan.objective_value, 70.);
    assert_eq!(plan.periods[0].production, 60.);
    assert_eq!(plan.periods[0].inventory, 10.);

    // presolve cannot tell infeasible from unbounded, the model has no feasible point
    let command = fake_gurobi(dir.path(), "gurobi_infeasible_or_unbounded.log", None);
    let infeasible = model(200., 150.);
    let solution = GurobiSolver::new()
        .command_name(command)
        .run(infeasible.problem())
        .unwrap();
    assert_eq!(solution.status, Status::Infeasible);
    assert!(solution.results.is_empty());
    assert!(matches!(
        infeasible.plan(&SolveResult::from(solution)),
        Err(PlanningError::Infeasible)
    ));
}
