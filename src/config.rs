//! Run configuration, read once from a JSON file and never modified afterwards.
//!
//! ```json
//! {
//!   "input_type": "csv",
//!   "solver": "cbc",
//!   "write_lp": true,
//!   "mip_gap": 0.01,
//!   "time_limit": 60
//! }
//! ```
//! Every key is optional.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PlanningError, PlanningResult};
use crate::solve::{SolverConfig, SolverKind};

/// Format of the input tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// One `.csv` file per table in `<data_dir>/csv/`
    Csv,
    /// One sheet per table in the `.xlsx` workbook of `<data_dir>/excel/`
    #[default]
    Excel,
}

/// Options of a planning run
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParams {
    /// Where the input tables are read from
    pub input_type: InputType,
    /// Engine solving the model
    pub solver: SolverKind,
    /// Write the model as `<output_dir>/prod_planning.lp`
    pub write_lp: bool,
    /// Keep the solver output in `<output_dir>/prod_planning.log`
    pub write_log: bool,
    /// Verbose logging, solution values included
    pub display_log: bool,
    /// Relative gap in `[0, 1)`; the solver default when absent
    pub mip_gap: Option<f64>,
    /// Seconds
    pub time_limit: Option<u32>,
    /// Threads of the engines that support it
    pub threads: Option<u32>,
    /// Holds the `csv/` and `excel/` input directories
    pub data_dir: PathBuf,
    /// Receives the result tables, the LP file and the solver log
    pub output_dir: PathBuf,
    /// Remote solve endpoint. No bundled engine solves remotely, it is only carried along.
    pub url: Option<String>,
    /// Credential of the remote endpoint, never logged
    pub api_key: Option<String>,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            input_type: InputType::Excel,
            solver: SolverKind::Native,
            write_lp: true,
            write_log: false,
            display_log: false,
            mip_gap: None,
            time_limit: None,
            threads: None,
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            url: None,
            api_key: None,
        }
    }
}

// keeps the api key out of the logs
impl fmt::Debug for ModelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelParams")
            .field("input_type", &self.input_type)
            .field("solver", &self.solver)
            .field("write_lp", &self.write_lp)
            .field("write_log", &self.write_log)
            .field("display_log", &self.display_log)
            .field("mip_gap", &self.mip_gap)
            .field("time_limit", &self.time_limit)
            .field("threads", &self.threads)
            .field("data_dir", &self.data_dir)
            .field("output_dir", &self.output_dir)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ModelParams {
    /// Read and validate a JSON configuration file
    pub fn from_file(path: &Path) -> PlanningResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(content: &str) -> PlanningResult<Self> {
        let params: ModelParams = serde_json::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject a MIP gap outside `[0, 1)` and a zero time limit
    pub fn validate(&self) -> PlanningResult<()> {
        if let Some(gap) = self.mip_gap {
            if !(0.0..1.0).contains(&gap) {
                return Err(PlanningError::InvalidInput(format!(
                    "mip_gap must be in [0, 1), got {}",
                    gap
                )));
            }
        }
        if self.time_limit == Some(0) {
            return Err(PlanningError::InvalidInput(
                "time_limit must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Options handed to the solve adapter
    pub fn solver_config(&self) -> SolverConfig {
        if self.url.is_some() || self.api_key.is_some() {
            warn!("remote solve credentials are set but {} solves locally", self.solver);
        }
        SolverConfig {
            mip_gap: self.mip_gap,
            time_limit: self.time_limit,
            threads: self.threads,
            write_lp: self
                .write_lp
                .then(|| self.output_dir.join("prod_planning.lp")),
            write_log: self
                .write_log
                .then(|| self.output_dir.join("prod_planning.log")),
            verbose: self.display_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let params = ModelParams::from_json(r#"{"input_type": "csv", "solver": "glpk"}"#).unwrap();
        assert_eq!(params.input_type, InputType::Csv);
        assert_eq!(params.solver, SolverKind::Glpk);
        assert!(params.write_lp);
        assert_eq!(params.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            ModelParams::from_json(r#"{"module": "gurobi"}"#),
            Err(PlanningError::Config(_))
        ));
        assert!(matches!(
            ModelParams::from_json(r#"{"mip_gap": 1.5}"#),
            Err(PlanningError::InvalidInput(_))
        ));
        assert!(matches!(
            ModelParams::from_json(r#"{"time_limit": 0}"#),
            Err(PlanningError::InvalidInput(_))
        ));
    }

    #[test]
    fn solver_config_paths() {
        let params = ModelParams {
            write_log: true,
            display_log: true,
            time_limit: Some(30),
            output_dir: PathBuf::from("out"),
            ..ModelParams::default()
        };
        let config = params.solver_config();
        assert_eq!(config.write_lp, Some(PathBuf::from("out/prod_planning.lp")));
        assert_eq!(config.write_log, Some(PathBuf::from("out/prod_planning.log")));
        assert_eq!(config.time_limit, Some(30));
        assert!(config.verbose);
    }

    #[test]
    fn api_key_is_redacted() {
        let params = ModelParams {
            api_key: Some("secret".to_string()),
            ..ModelParams::default()
        };
        assert!(!format!("{:?}", params).contains("secret"));
    }
}
