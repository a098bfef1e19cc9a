use crate::core::elements::ResolveError;
use crate::core::models::atom::Atom;
use crate::core::models::cell::{CellError, PeriodicCell};
use nalgebra::Point3;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("Inconsistent trajectory: {0}")]
    Inconsistent(String),
    #[error("Frame index {frame} out of range ({frames} frames)")]
    FrameOutOfRange { frame: usize, frames: usize },
    #[error("Unsupported trajectory format: '{0}'")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Atom record is shorter than its fixed-width fields")]
    LineTooShort,
    #[error("Invalid periodic cell line (value: '{value}')")]
    InvalidCell { value: String },
    #[error("Atom record is not valid UTF-8")]
    InvalidEncoding,
}

/// Defines the interface for random-access trajectory readers.
///
/// Construction performs exactly one forward scan of the file to parse the
/// atom metadata and build the frame-offset table; every later read seeks
/// directly. Reads take `&mut self` because they reposition the underlying
/// file handle — concurrent readers each need their own instance.
pub trait TrajectoryRead: std::fmt::Debug {
    /// Number of atoms per frame.
    fn atom_count(&self) -> usize;

    /// Number of frames in the trajectory.
    fn frame_count(&self) -> usize;

    /// The per-atom metadata parsed from the first frame, in file order.
    fn atoms(&self) -> &[Atom];

    /// Reads the coordinates of frame `frame`, in the core length unit.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::FrameOutOfRange`] for an invalid index, or
    /// a parse error if the frame's records are malformed.
    fn read_frame(&mut self, frame: usize) -> Result<Vec<Point3<f64>>, TrajectoryError>;

    /// Reads the periodic cell of frame `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::FrameOutOfRange`] for an invalid index,
    /// a parse error for a malformed cell line, or [`CellError::Degenerate`]
    /// (wrapped) if the cell matrix is singular.
    fn read_cell(&mut self, frame: usize) -> Result<PeriodicCell, TrajectoryError>;
}

/// Returns the trimmed column slice `[start, end)` of a record, or an empty
/// string when the record is too short.
pub(crate) fn slice_and_trim(record: &str, start: usize, end: usize) -> &str {
    record.get(start..end).unwrap_or("").trim()
}

pub(crate) fn parse_int_column(
    record: &str,
    start: usize,
    end: usize,
    line: usize,
) -> Result<i64, TrajectoryError> {
    let raw = slice_and_trim(record, start, end);
    raw.parse().map_err(|_| TrajectoryError::Parse {
        line,
        kind: ParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: raw.to_string(),
        },
    })
}

pub(crate) fn parse_float_column(
    record: &str,
    start: usize,
    end: usize,
    line: usize,
) -> Result<f64, TrajectoryError> {
    let raw = slice_and_trim(record, start, end);
    raw.parse().map_err(|_| TrajectoryError::Parse {
        line,
        kind: ParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: raw.to_string(),
        },
    })
}
