/// Represents one atom's immutable metadata within a trajectory.
///
/// This struct holds the per-atom attributes parsed once when a trajectory
/// reader scans its first frame. Positions are frame-dependent and therefore
/// not stored here; they are returned by the reader per frame and addressed
/// by the atom's sequential `serial`.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Sequential, 0-based index of the atom in file order.
    pub serial: usize,
    /// The atom id as written in the file (may start at 1, may wrap).
    pub file_id: i64,
    /// The trimmed atom name token (e.g. "CA", "OW1").
    pub name: String,
    /// The residue id as written in the file. Repeats across frames and is
    /// not globally unique across molecules of the same species.
    pub residue_id: i64,
    /// The trimmed residue name token (e.g. "ALA", "SOL").
    pub residue_name: String,
    /// The inferred element symbol in canonical case (e.g. "C", "Na").
    /// Assigned by the element resolver before any geometry query.
    pub element: String,
}

impl Atom {
    /// Creates a new `Atom` with an empty element symbol.
    ///
    /// The element is filled in by the element resolver during reader
    /// construction, once the residue classification is known.
    pub fn new(
        serial: usize,
        file_id: i64,
        name: &str,
        residue_id: i64,
        residue_name: &str,
    ) -> Self {
        Self {
            serial,
            file_id,
            name: name.to_string(),
            residue_id,
            residue_name: residue_name.to_string(),
            element: String::new(),
        }
    }
}
