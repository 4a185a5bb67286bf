//! Error types for the flywheel experiment engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("measurement unavailable: {0}")]
    MeasurementUnavailable(String),

    #[error("schedule is degenerate: driving torque produced no motion")]
    ScheduleDegenerate,
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
