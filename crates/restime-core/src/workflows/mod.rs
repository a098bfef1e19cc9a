//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::core`] and
//! [`crate::analysis`] layers together into complete analyses. Each workflow
//! handles resource loading, parameter validation, progress reporting, and
//! result organization behind one configuration object:
//!
//! - **Residence Workflow** ([`residence`]) - Shell-occupancy scan of a
//!   trajectory: which molecules of a species sit within a radius of a
//!   reference atom, frame by frame.
//! - **Bonds Workflow** ([`bonds`]) - Geometric covalent-bond inference for
//!   one frame, with optional molecule clustering.

pub mod bonds;
pub mod residence;
