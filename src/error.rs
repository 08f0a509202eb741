//! Errors of a planning run

use thiserror::Error;

use crate::solvers::SolverError;

/// Everything that can abort a planning run. None of them is retried.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// Malformed or incomplete input data or configuration, detected before any solve
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The configured solver is missing or refused to run
    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),

    /// No plan satisfies the demand with the available capacity
    #[error("the model is infeasible")]
    Infeasible,

    /// The solver reported an unbounded objective
    #[error("the model is unbounded")]
    Unbounded,

    /// The solver ran but gave nothing usable back
    #[error("solve failed: {0}")]
    SolveFailed(String),

    /// Unreadable workbook
    #[error("excel error: {0}")]
    Excel(String),

    /// Unreadable or unwritable CSV file
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON configuration
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// File system failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<SolverError> for PlanningError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Unavailable { .. } => PlanningError::SolverUnavailable(err.to_string()),
            SolverError::Io(e) => PlanningError::Io(e),
            SolverError::InvalidSolution(_) | SolverError::Unsupported(_) => {
                PlanningError::SolveFailed(err.to_string())
            }
        }
    }
}

impl From<calamine::XlsxError> for PlanningError {
    fn from(err: calamine::XlsxError) -> Self {
        PlanningError::Excel(err.to_string())
    }
}

/// Result type alias
pub type PlanningResult<T> = Result<T, PlanningError>;
