use restime::analysis::AnalysisError;
use restime::core::elements::TableLoadError;
use restime::core::io::TrajectoryError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error(transparent)]
    Table(#[from] TableLoadError),

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
