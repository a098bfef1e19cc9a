pub mod bonds;
pub mod info;
pub mod scan;

use crate::cli::ReferenceArgs;
use crate::error::Result;
use restime::core::elements::{ElementTable, ResidueRegistry};

/// Loads the element table and residue registry, replacing the built-in
/// defaults with user-provided files when given.
pub fn load_reference(args: &ReferenceArgs) -> Result<(ElementTable, ResidueRegistry)> {
    let elements = match &args.elements {
        Some(path) => ElementTable::load_csv(path)?,
        None => ElementTable::builtin(),
    };
    let residues = match &args.residues {
        Some(path) => ResidueRegistry::load(path)?,
        None => ResidueRegistry::builtin(),
    };
    Ok((elements, residues))
}
