use super::table::{ElementTable, ResidueRegistry};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown atom type: '{name}'")]
    UnknownAtomType { name: String },
}

/// Infers the chemical element of an atom from its name and the
/// classification of its residue.
///
/// Two strategies are applied depending on the residue. Standard-residue
/// naming conventions put the element first, so the candidate grows from the
/// left ("CA" in ALA: "C" matches carbon before "CA" could match calcium).
/// Non-standard residues (solvent, ions, lipids) often embed index suffixes,
/// so the candidate shrinks from the right instead ("OW1" strips to "OW",
/// which fails, then "O" matches oxygen). Leading and trailing digits are
/// stripped before either strategy runs.
#[derive(Debug, Clone)]
pub struct ElementResolver<'a> {
    table: &'a ElementTable,
    residues: &'a ResidueRegistry,
}

impl<'a> ElementResolver<'a> {
    pub fn new(table: &'a ElementTable, residues: &'a ResidueRegistry) -> Self {
        Self { table, residues }
    }

    /// Resolves one atom name to a canonical element symbol.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownAtomType`] with the offending name if
    /// no prefix of the digit-stripped name matches a known symbol; the
    /// caller can extend the element table and retry.
    pub fn resolve(&self, atom_name: &str, residue_name: &str) -> Result<String, ResolveError> {
        let unknown = || ResolveError::UnknownAtomType {
            name: atom_name.to_string(),
        };

        let stripped: &str = atom_name
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_end_matches(|c: char| c.is_ascii_digit());
        if stripped.is_empty() {
            return Err(unknown());
        }
        let upper = stripped.to_uppercase();

        if self.residues.contains(residue_name) {
            // Grow the candidate from the left until a symbol matches.
            for len in 1..=upper.len() {
                if let Some(data) = self.table.get(&upper[..len]) {
                    return Ok(data.symbol.clone());
                }
            }
        } else {
            // Shrink the candidate from the right until a symbol matches.
            for len in (1..=upper.len()).rev() {
                if let Some(data) = self.table.get(&upper[..len]) {
                    return Ok(data.symbol.clone());
                }
            }
        }
        Err(unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (ElementTable, ResidueRegistry) {
        (ElementTable::builtin(), ResidueRegistry::builtin())
    }

    #[test]
    fn standard_residue_grows_from_the_left() {
        let (table, residues) = fixtures();
        let resolver = ElementResolver::new(&table, &residues);

        // "CA" in ALA is an alpha carbon, not calcium.
        assert_eq!(resolver.resolve("CA", "ALA").unwrap(), "C");
        assert_eq!(resolver.resolve("HB1", "ALA").unwrap(), "H");
        assert_eq!(resolver.resolve("N", "GLY").unwrap(), "N");
    }

    #[test]
    fn non_standard_residue_shrinks_from_the_right() {
        let (table, residues) = fixtures();
        let resolver = ElementResolver::new(&table, &residues);

        // Water oxygen: "OW1" strips the digit, "OW" fails, "O" matches.
        assert_eq!(resolver.resolve("OW1", "SOL").unwrap(), "O");
        assert_eq!(resolver.resolve("HW2", "SOL").unwrap(), "H");
        // An ion resolves to the full two-letter symbol before shrinking.
        assert_eq!(resolver.resolve("NA", "NA+").unwrap(), "Na");
        assert_eq!(resolver.resolve("CL", "CL-").unwrap(), "Cl");
    }

    #[test]
    fn digits_are_stripped_on_both_sides() {
        let (table, residues) = fixtures();
        let resolver = ElementResolver::new(&table, &residues);

        assert_eq!(resolver.resolve("1HA", "ALA").unwrap(), "H");
        assert_eq!(resolver.resolve("2HW1", "SOL").unwrap(), "H");
    }

    #[test]
    fn unresolvable_names_carry_the_offending_name() {
        let (table, residues) = fixtures();
        let resolver = ElementResolver::new(&table, &residues);

        let err = resolver.resolve("XQ7", "SOL").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownAtomType {
                name: "XQ7".to_string()
            }
        );
        // All-digit names strip to nothing.
        assert!(resolver.resolve("123", "SOL").is_err());
        // The left-growing strategy can also exhaust the name.
        assert!(resolver.resolve("XQ", "ALA").is_err());
    }
}
