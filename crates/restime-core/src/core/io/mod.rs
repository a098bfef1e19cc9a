//! Random-access trajectory readers.
//!
//! Each supported format parses its atom metadata once, builds a frame-offset
//! table in a single forward scan, and then serves coordinate and cell reads
//! for arbitrary frames through positioned seeks. The format set is closed:
//! [`open_trajectory`] maps a file extension to the matching reader with a
//! static match rather than a runtime registry.

pub mod gro;
pub mod pdb;
pub mod traits;

pub use traits::{ParseErrorKind, TrajectoryError, TrajectoryRead};

use crate::core::elements::ElementResolver;
use std::path::Path;

/// Opens a trajectory file, selecting the reader from the file extension.
///
/// Recognized extensions are `gro` and `pdb` (case-insensitive). The
/// resolver assigns each atom's element during construction.
///
/// # Errors
///
/// Returns [`TrajectoryError::UnsupportedFormat`] for unknown extensions,
/// or any construction error of the selected reader.
pub fn open_trajectory(
    path: &Path,
    resolver: &ElementResolver,
) -> Result<Box<dyn TrajectoryRead>, TrajectoryError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "gro" => Ok(Box::new(gro::GroFile::open(path, resolver)?)),
        "pdb" => Ok(Box::new(pdb::PdbFile::open(path, resolver)?)),
        _ => Err(TrajectoryError::UnsupportedFormat(extension)),
    }
}
