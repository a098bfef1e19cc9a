use crate::core::elements::{ResolveError, TableLoadError};
use crate::core::io::TrajectoryError;
use crate::core::models::cell::CellError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Shell radius must be positive and finite (got {0})")]
    InvalidRadius(f64),

    #[error("No atoms matched the target selection")]
    EmptySelection,

    #[error("Center atom index {center} out of range ({atoms} atoms)")]
    CenterOutOfRange { center: usize, atoms: usize },

    #[error("Frame index {frame} out of range ({frames} frames)")]
    FrameOutOfRange { frame: usize, frames: usize },

    #[error("Degenerate periodic cell at frame {frame}")]
    DegenerateFrame { frame: usize },

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Table(#[from] TableLoadError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
