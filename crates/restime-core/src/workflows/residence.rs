use crate::analysis::error::AnalysisError;
use crate::analysis::grouping::{MoleculeGroup, group_molecules};
use crate::analysis::progress::{Progress, ProgressReporter};
use crate::analysis::shell::{self, OccupancyMatrix};
use crate::core::elements::{ElementResolver, ElementTable, ResidueRegistry};
use crate::core::io::open_trajectory;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Parameters of one residence-time scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidenceConfig {
    /// Path of the trajectory file; the reader is selected by extension.
    pub trajectory: PathBuf,
    /// Residue names of the target species (e.g. `["SOL"]`).
    pub target_residues: Vec<String>,
    /// Atom names scanned within each target molecule (e.g. `["OW"]`).
    pub target_atoms: Vec<String>,
    /// Sequential index of the reference atom at the shell center.
    pub center: usize,
    /// Shell radius, in the core length unit.
    pub radius: f64,
    /// Frames to scan; `None` scans the whole trajectory.
    pub frames: Option<Vec<usize>>,
}

#[derive(Default)]
pub struct ResidenceConfigBuilder {
    trajectory: Option<PathBuf>,
    target_residues: Option<Vec<String>>,
    target_atoms: Option<Vec<String>>,
    center: Option<usize>,
    radius: Option<f64>,
    frames: Option<Vec<usize>>,
}

impl ResidenceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trajectory(mut self, path: PathBuf) -> Self {
        self.trajectory = Some(path);
        self
    }
    pub fn target_residues(mut self, names: Vec<String>) -> Self {
        self.target_residues = Some(names);
        self
    }
    pub fn target_atoms(mut self, names: Vec<String>) -> Self {
        self.target_atoms = Some(names);
        self
    }
    pub fn center(mut self, index: usize) -> Self {
        self.center = Some(index);
        self
    }
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
    pub fn frames(mut self, frames: Vec<usize>) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn build(self) -> Result<ResidenceConfig, ConfigError> {
        Ok(ResidenceConfig {
            trajectory: self
                .trajectory
                .ok_or(ConfigError::MissingParameter("trajectory"))?,
            target_residues: self
                .target_residues
                .ok_or(ConfigError::MissingParameter("target_residues"))?,
            target_atoms: self
                .target_atoms
                .ok_or(ConfigError::MissingParameter("target_atoms"))?,
            center: self.center.ok_or(ConfigError::MissingParameter("center"))?,
            radius: self.radius.ok_or(ConfigError::MissingParameter("radius"))?,
            frames: self.frames,
        })
    }
}

/// The outcome of a residence scan: the molecule groups that were scanned
/// and their occupancy matrix.
#[derive(Debug, Clone)]
pub struct ResidenceResult {
    pub groups: Vec<MoleculeGroup>,
    pub occupancy: OccupancyMatrix,
}

/// Runs a complete residence-time scan.
///
/// Opens the trajectory (resolving every atom's element on the way), groups
/// the atoms of the target species into molecules, and scans the requested
/// frames for shell membership around the center atom. The element table and
/// residue registry are read as immutable snapshots for the duration of the
/// scan.
#[instrument(skip_all, name = "residence_workflow")]
pub fn run(
    config: &ResidenceConfig,
    elements: &ElementTable,
    residues: &ResidueRegistry,
    reporter: &ProgressReporter,
) -> Result<ResidenceResult, AnalysisError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(
        "Opening trajectory {} for a residence scan.",
        config.trajectory.display()
    );

    let resolver = ElementResolver::new(elements, residues);
    let mut reader = open_trajectory(&config.trajectory, &resolver)?;
    info!(
        "Indexed {} frames of {} atoms.",
        reader.frame_count(),
        reader.atom_count()
    );

    let groups = group_molecules(
        reader.atoms(),
        &config.target_residues,
        &config.target_atoms,
    );
    info!(
        "Matched {} molecules of {:?} via atoms {:?}.",
        groups.len(),
        config.target_residues,
        config.target_atoms
    );
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Scanning" });
    let frames: Vec<usize> = match &config.frames {
        Some(frames) => frames.clone(),
        None => (0..reader.frame_count()).collect(),
    };
    let occupancy = shell::scan(
        reader.as_mut(),
        &groups,
        config.center,
        config.radius,
        &frames,
        reporter,
    )?;
    reporter.report(Progress::PhaseFinish);

    Ok(ResidenceResult { groups, occupancy })
}
