use std::fs;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use prod_planning::config::{InputType, ModelParams};
use prod_planning::planning::{GlobalParameters, PeriodRecord, PlanningModel, VariableKind};
use prod_planning::solve::{SolveAdapter, SolverConfig, SolverKind};
use prod_planning::solvers::Status;
use prod_planning::{logging, output, pipeline, PlanningError};

const TOLERANCE: f64 = 1e-6;

fn record(demand: f64, production_capacity: f64, production_cost: f64) -> PeriodRecord {
    PeriodRecord {
        demand,
        production_capacity,
        production_cost,
    }
}

fn native() -> SolveAdapter {
    SolveAdapter::new(SolverKind::Native, SolverConfig::default()).unwrap()
}

/// Check the solved values against every constraint of the model
fn assert_feasible_plan(periods: &[PeriodRecord], params: &GlobalParameters) {
    let model = PlanningModel::build(periods, params).unwrap();
    let result = native().solve(&model).unwrap();
    assert_eq!(result.status, Status::Optimal);
    assert_eq!(result.variable_values.len(), 2 * periods.len());

    let value = |kind: VariableKind, t: usize| result.variable_values[&kind.name(t)];
    for (t, period) in periods.iter().enumerate() {
        let production = value(VariableKind::Production, t);
        let inventory = value(VariableKind::Inventory, t);
        let previous = if t == 0 {
            params.initial_inventory
        } else {
            value(VariableKind::Inventory, t - 1)
        };
        assert_abs_diff_eq!(previous + production - inventory, period.demand, epsilon = TOLERANCE);
        assert!(production <= period.production_capacity + TOLERANCE);
        assert!(production >= -TOLERANCE);
        assert!(inventory >= -TOLERANCE);
    }
    let cost: f64 = (0..periods.len())
        .map(|t| {
            params.holding_cost * value(VariableKind::Inventory, t)
                + periods[t].production_cost * value(VariableKind::Production, t)
        })
        .sum();
    assert_abs_diff_eq!(result.objective_value.unwrap(), cost, epsilon = TOLERANCE);
    assert_abs_diff_eq!(model.objective_value(&result), cost, epsilon = TOLERANCE);
}

#[test]
fn single_period() {
    logging::init_test();
    let model = PlanningModel::build(
        &[record(100., 150., 5.)],
        &GlobalParameters {
            initial_inventory: 0.,
            holding_cost: 1.,
        },
    )
    .unwrap();
    let plan = model.optimize(&native()).unwrap();
    assert_abs_diff_eq!(plan.objective_value, 500., epsilon = TOLERANCE);
    assert_eq!(plan.periods.len(), 1);
    assert_abs_diff_eq!(plan.periods[0].production, 100., epsilon = TOLERANCE);
    assert_abs_diff_eq!(plan.periods[0].inventory, 0., epsilon = TOLERANCE);
}

#[test]
fn initial_inventory_covers_part_of_the_first_demand() {
    // holding costs more than producing later, so nothing is stocked
    let model = PlanningModel::build(
        &[record(50., 40., 1.), record(50., 100., 1.)],
        &GlobalParameters {
            initial_inventory: 20.,
            holding_cost: 2.,
        },
    )
    .unwrap();
    let plan = model.optimize(&native()).unwrap();
    assert_abs_diff_eq!(plan.objective_value, 80., epsilon = TOLERANCE);
    for (period, (production, inventory)) in plan.periods.iter().zip([(30., 0.), (50., 0.)]) {
        assert_abs_diff_eq!(period.production, production, epsilon = TOLERANCE);
        assert_abs_diff_eq!(period.inventory, inventory, epsilon = TOLERANCE);
    }
}

#[test]
fn cheap_period_builds_stock() {
    let periods = [record(10., 100., 1.), record(10., 100., 10.)];
    let model = PlanningModel::build(
        &periods,
        &GlobalParameters {
            initial_inventory: 0.,
            holding_cost: 2.,
        },
    )
    .unwrap();
    let plan = model.optimize(&native()).unwrap();
    // 20 units at 1, 10 of them held once at 2
    assert_abs_diff_eq!(plan.objective_value, 40., epsilon = TOLERANCE);
    assert_abs_diff_eq!(plan.periods[0].production, 20., epsilon = TOLERANCE);
    assert_abs_diff_eq!(plan.periods[0].inventory, 10., epsilon = TOLERANCE);
}

#[test]
fn capacity_shortage_is_infeasible() {
    let model = PlanningModel::build(
        &[record(200., 150., 5.)],
        &GlobalParameters {
            initial_inventory: 0.,
            holding_cost: 1.,
        },
    )
    .unwrap();
    let result = native().solve(&model).unwrap();
    assert_eq!(result.status, Status::Infeasible);
    assert!(result.variable_values.is_empty());
    assert!(result.objective_value.is_none());
    assert!(matches!(
        model.optimize(&native()),
        Err(PlanningError::Infeasible)
    ));
}

#[test]
fn solutions_satisfy_every_constraint() {
    let params = GlobalParameters {
        initial_inventory: 15.,
        holding_cost: 0.5,
    };
    assert_feasible_plan(
        &[
            record(40., 60., 3.),
            record(70., 50., 2.),
            record(20., 80., 4.),
            record(90., 100., 1.5),
            record(0., 10., 9.),
        ],
        &params,
    );
    assert_feasible_plan(&[record(100., 150., 5.)], &params);
}

#[test]
fn lp_file_is_written_before_solving() {
    let dir = TempDir::new().unwrap();
    let lp_path = dir.path().join("prod_planning.lp");
    let adapter = SolveAdapter::new(
        SolverKind::Native,
        SolverConfig {
            write_lp: Some(lp_path.clone()),
            ..SolverConfig::default()
        },
    )
    .unwrap();
    let model = PlanningModel::build(
        &[record(100., 150., 5.)],
        &GlobalParameters {
            initial_inventory: 0.,
            holding_cost: 1.,
        },
    )
    .unwrap();
    model.optimize(&adapter).unwrap();
    let lp = fs::read_to_string(lp_path).unwrap();
    assert!(lp.contains("inv_balance0: X_0 - I_0 = 100"));
    assert!(lp.contains("prod_cap_month_0: X_0 <= 150"));
}

#[test]
fn csv_pipeline() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let csv_dir = dir.path().join("data").join("csv");
    fs::create_dir_all(&csv_dir).unwrap();
    fs::write(
        csv_dir.join("input_data.csv"),
        "period,demand,production_capacity,production_cost\n0,50,40,1\n1,50,100,1\n",
    )
    .unwrap();
    fs::write(
        csv_dir.join("parameters.csv"),
        "attribute,value\ninitial_inventory,20\nholding_cost,2\n",
    )
    .unwrap();

    let params = ModelParams {
        input_type: InputType::Csv,
        data_dir: dir.path().join("data"),
        output_dir: dir.path().join("output"),
        ..ModelParams::default()
    };
    let plan = pipeline::run(&params).unwrap();
    assert_abs_diff_eq!(plan.objective_value, 80., epsilon = TOLERANCE);

    let output_dir = dir.path().join("output");
    assert!(output_dir.join("prod_planning.lp").exists());
    let production = fs::read_to_string(output_dir.join(output::PRODUCTION_FILE)).unwrap();
    let mut lines = production.lines();
    assert_eq!(lines.next(), Some("period,value"));
    assert!(lines.next().unwrap().starts_with("1,"));
    assert!(lines.next().unwrap().starts_with("2,"));
    assert!(output_dir.join(output::INVENTORY_FILE).exists());
}

#[test]
fn missing_excel_workbook() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("excel")).unwrap();
    let params = ModelParams {
        data_dir: dir.path().to_path_buf(),
        output_dir: dir.path().join("output"),
        ..ModelParams::default()
    };
    assert!(matches!(
        pipeline::run(&params),
        Err(PlanningError::InvalidInput(_))
    ));
}

#[test]
#[ignore = "needs the cbc executable"]
fn cbc_matches_native() {
    let model = PlanningModel::build(
        &[record(50., 40., 1.), record(50., 100., 1.)],
        &GlobalParameters {
            initial_inventory: 20.,
            holding_cost: 2.,
        },
    )
    .unwrap();
    let adapter = SolveAdapter::new(SolverKind::Cbc, SolverConfig::default()).unwrap();
    let plan = model.optimize(&adapter).unwrap();
    assert_abs_diff_eq!(plan.objective_value, 80., epsilon = TOLERANCE);
}

#[test]
#[ignore = "needs the glpsol executable"]
fn glpk_matches_native() {
    let model = PlanningModel::build(
        &[record(100., 150., 5.)],
        &GlobalParameters {
            initial_inventory: 0.,
            holding_cost: 1.,
        },
    )
    .unwrap();
    let adapter = SolveAdapter::new(SolverKind::Glpk, SolverConfig::default()).unwrap();
    let plan = model.optimize(&adapter).unwrap();
    assert_abs_diff_eq!(plan.objective_value, 500., epsilon = TOLERANCE);
}

#[test]
fn missing_solver_binary_is_reported() {
    use prod_planning::solvers::{CbcSolver, SolverTrait};

    let model = PlanningModel::build(
        &[record(1., 1., 1.)],
        &GlobalParameters {
            initial_inventory: 0.,
            holding_cost: 1.,
        },
    )
    .unwrap();
    let err = CbcSolver::new()
        .command_name("definitely-not-a-solver".to_string())
        .run(model.problem())
        .unwrap_err();
    assert!(matches!(
        PlanningError::from(err),
        PlanningError::SolverUnavailable(_)
    ));
}
