//! Chemical reference data and element inference.
//!
//! This module carries the data the geometry layer is parameterized by: the
//! element table ([`table::ElementTable`], covalent/van-der-Waals radii and
//! display colors keyed by symbol), the standard-residue registry
//! ([`table::ResidueRegistry`]), and the resolver that infers an element
//! symbol from an atom name and its residue classification
//! ([`resolver::ElementResolver`]).
//!
//! Both tables ship with compiled-in defaults and can be replaced from
//! user-editable files. They are plain values: callers pass snapshots into
//! resolvers and workflows, and an updated table only takes effect where it
//! is passed in — there is no ambient global state.

pub mod resolver;
pub mod table;

pub use resolver::{ElementResolver, ResolveError};
pub use table::{ElementData, ElementTable, ResidueRegistry, TableLoadError};
