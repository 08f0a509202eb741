//! One planning run: load, build, solve, report.
use std::time::Instant;

use tracing::info;

use crate::config::ModelParams;
use crate::data;
use crate::error::PlanningResult;
use crate::output;
use crate::planning::{PlanningModel, ProductionPlan};
use crate::solve::SolveAdapter;

/// Run the whole pipeline with `params` and write the reports to `params.output_dir`
pub fn run(params: &ModelParams) -> PlanningResult<ProductionPlan> {
    params.validate()?;
    let input = data::load(params)?;

    let start = Instant::now();
    let model = PlanningModel::build(&input.periods, &input.params)?;
    info!(
        "Model creation time in sec: {:.4}",
        start.elapsed().as_secs_f64()
    );

    let adapter = SolveAdapter::new(params.solver, params.solver_config())?;
    let plan = model.optimize(&adapter)?;
    output::write_plan(&plan, &params.output_dir)?;
    Ok(plan)
}
