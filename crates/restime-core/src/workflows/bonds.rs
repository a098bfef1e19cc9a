use crate::analysis::connectivity::{self, BOND_TOLERANCE};
use crate::analysis::error::AnalysisError;
use crate::analysis::progress::{Progress, ProgressReporter};
use crate::core::elements::{ElementResolver, ElementTable, ResidueRegistry};
use crate::core::geometry::octree::CollisionMap;
use crate::core::io::open_trajectory;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Parameters of one bond-inference pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BondsConfig {
    /// Path of the trajectory file; the reader is selected by extension.
    pub trajectory: PathBuf,
    /// Frame whose configuration is analyzed.
    pub frame: usize,
    /// Distance slack added to the summed covalent radii.
    pub tolerance: f64,
}

impl BondsConfig {
    pub fn new(trajectory: PathBuf, frame: usize) -> Self {
        Self {
            trajectory,
            frame,
            tolerance: BOND_TOLERANCE,
        }
    }
}

/// The inferred bond map and its connected-component molecules.
#[derive(Debug, Clone)]
pub struct BondsResult {
    pub bonds: CollisionMap,
    pub molecules: Vec<BTreeSet<usize>>,
}

/// Infers covalent bonds for one frame from geometry alone.
///
/// Every atom carries the covalent radius of its resolved element; two atoms
/// bond when their separation is within the summed radii plus the tolerance.
/// The octree index is rebuilt for the requested frame and discarded.
#[instrument(skip_all, name = "bonds_workflow")]
pub fn run(
    config: &BondsConfig,
    elements: &ElementTable,
    residues: &ResidueRegistry,
    reporter: &ProgressReporter,
) -> Result<BondsResult, AnalysisError> {
    reporter.report(Progress::PhaseStart {
        name: "Bond inference",
    });
    info!(
        "Inferring bonds for frame {} of {}.",
        config.frame,
        config.trajectory.display()
    );

    let resolver = ElementResolver::new(elements, residues);
    let mut reader = open_trajectory(&config.trajectory, &resolver)?;

    let bonds =
        connectivity::frame_bonds(reader.as_mut(), elements, config.frame, config.tolerance)?;
    let molecules = connectivity::cluster_molecules(&bonds);
    info!(
        "Found {} bonded pairs across {} molecules.",
        bonds.values().map(BTreeSet::len).sum::<usize>() / 2,
        molecules.len()
    );
    reporter.report(Progress::PhaseFinish);

    Ok(BondsResult { bonds, molecules })
}
