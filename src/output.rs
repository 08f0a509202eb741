//! CSV reports of a solved plan
use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::error::PlanningResult;
use crate::planning::ProductionPlan;

/// Production level of every period
pub const PRODUCTION_FILE: &str = "optimal_production_variables.csv";
/// End-of-period inventory of every period
pub const INVENTORY_FILE: &str = "optimal_inventory_variables.csv";

#[derive(Debug, Serialize)]
struct OutputRow {
    /// 1-based
    period: usize,
    value: f64,
}

/// Write the production and inventory levels of `plan` under `dir`, created if needed.
/// Returns the paths of the two files.
pub fn write_plan(plan: &ProductionPlan, dir: &Path) -> PlanningResult<[PathBuf; 2]> {
    fs::create_dir_all(dir)?;
    let production = dir.join(PRODUCTION_FILE);
    let inventory = dir.join(INVENTORY_FILE);
    write_rows(&production, plan, |p| p.production)?;
    write_rows(&inventory, plan, |p| p.inventory)?;
    info!("Outputs are written to csv! ({})", dir.display());
    Ok([production, inventory])
}

fn write_rows<F>(path: &Path, plan: &ProductionPlan, value: F) -> PlanningResult<()>
where
    F: Fn(&crate::planning::PeriodPlan) -> f64,
{
    let mut writer = Writer::from_path(path)?;
    for period in &plan.periods {
        writer.serialize(OutputRow {
            period: period.period + 1,
            value: value(period),
        })?;
    }
    writer.flush()?;
    Ok(())
}
