//! # restime Core Library
//!
//! A library for analyzing particle trajectories from molecular-dynamics
//! simulations: geometric bond inference, periodic-boundary shell-occupancy
//! (residence-time) scanning, and random-access reads of large line-oriented
//! trajectory files.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (the atom
//!   record, the periodic cell and its minimum-image kernel), the octree
//!   spatial index, the chemical-element reference data, and the trajectory
//!   reader implementations with their frame-offset tables.
//!
//! - **[`analysis`]: The Logic Core.** This layer drives the foundation across
//!   whole trajectories: molecule grouping, covalent-bond inference, the
//!   shell-occupancy scanner, and the progress/cancellation plumbing shared by
//!   long-running operations.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `analysis` and `core` layers together to execute
//!   complete analyses, such as a residence-time scan over a trajectory file.

pub mod analysis;
pub mod core;
pub mod workflows;
