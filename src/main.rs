use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use prod_planning::config::ModelParams;
use prod_planning::{logging, pipeline};

/// `prod-planning [config.json]`
fn main() -> anyhow::Result<()> {
    let params = match env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ModelParams::from_file(&path)
            .with_context(|| format!("cannot load the configuration {}", path.display()))?,
        None => ModelParams::default(),
    };
    logging::init(params.display_log);
    info!(?params, "starting");

    let plan = pipeline::run(&params)?;
    info!(
        "{} periods planned, total cost {:.2}",
        plan.periods.len(),
        plan.objective_value
    );
    Ok(())
}
