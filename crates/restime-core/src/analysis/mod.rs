//! # Analysis Module
//!
//! This layer drives the [`crate::core`] foundations across whole
//! trajectories. It owns the stateful, long-running operations and the
//! plumbing they share:
//!
//! - **Molecule Grouping** ([`grouping`]) - Partitioning atoms into
//!   per-molecule index groups for a target species
//! - **Bond Inference** ([`connectivity`]) - Octree-backed covalent bond
//!   detection and connected-component molecule clustering
//! - **Shell Occupancy** ([`shell`]) - The residence-time scan producing a
//!   molecule-by-frame occupancy matrix
//! - **Progress Reporting** ([`progress`]) - Callback-based progress events
//!   and cooperative cancellation for long scans
//! - **Error Handling** ([`error`]) - The analysis-level error taxonomy

pub mod connectivity;
pub mod error;
pub mod grouping;
pub mod progress;
pub mod shell;

pub use error::AnalysisError;
