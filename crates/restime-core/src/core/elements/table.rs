use phf::{Map, Set, phf_map, phf_set};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

/// Built-in element data: covalent radius, van-der-Waals radius (both in
/// angstroms) and display color, keyed by canonical symbol. Covers the
/// elements that show up in biomolecular and solvated MD systems; the full
/// table can be replaced from a user-editable CSV file.
static BUILTIN_ELEMENTS: Map<&'static str, (f64, f64, &'static str)> = phf_map! {
    "H" => (0.31, 1.20, "#FFFFFF"),
    "D" => (0.31, 1.20, "#FFFFC0"),
    "He" => (0.28, 1.40, "#D9FFFF"),
    "Li" => (1.28, 1.82, "#CC80FF"),
    "Be" => (0.96, 1.53, "#C2FF00"),
    "B" => (0.84, 1.92, "#FFB5B5"),
    "C" => (0.76, 1.70, "#909090"),
    "N" => (0.71, 1.55, "#3050F8"),
    "O" => (0.66, 1.52, "#FF0D0D"),
    "F" => (0.57, 1.47, "#90E050"),
    "Ne" => (0.58, 1.54, "#B3E3F5"),
    "Na" => (1.66, 2.27, "#AB5CF2"),
    "Mg" => (1.41, 1.73, "#8AFF00"),
    "Al" => (1.21, 1.84, "#BFA6A6"),
    "Si" => (1.11, 2.10, "#F0C8A0"),
    "P" => (1.07, 1.80, "#FF8000"),
    "S" => (1.05, 1.80, "#FFFF30"),
    "Cl" => (1.02, 1.75, "#1FF01F"),
    "Ar" => (1.06, 1.88, "#80D1E3"),
    "K" => (2.03, 2.75, "#8F40D4"),
    "Ca" => (1.76, 2.31, "#3DFF00"),
    "Ti" => (1.60, 2.15, "#BFC2C7"),
    "Cr" => (1.39, 2.05, "#8A99C7"),
    "Mn" => (1.39, 2.05, "#9C7AC7"),
    "Fe" => (1.32, 2.04, "#E06633"),
    "Co" => (1.26, 2.00, "#F090A0"),
    "Ni" => (1.24, 1.63, "#50D050"),
    "Cu" => (1.32, 1.40, "#C88033"),
    "Zn" => (1.22, 1.39, "#7D80B0"),
    "Se" => (1.20, 1.90, "#FFA100"),
    "Br" => (1.20, 1.85, "#A62929"),
    "Rb" => (2.20, 3.03, "#702EB0"),
    "Sr" => (1.95, 2.49, "#00FF00"),
    "Mo" => (1.54, 2.10, "#54B5B5"),
    "Ag" => (1.45, 1.72, "#C0C0C0"),
    "Cd" => (1.44, 1.58, "#FFD98F"),
    "I" => (1.39, 1.98, "#940094"),
    "Cs" => (2.44, 3.43, "#57178F"),
    "Ba" => (2.15, 2.68, "#00C900"),
    "Pt" => (1.36, 1.75, "#D0D0E0"),
    "Au" => (1.36, 1.66, "#FFD123"),
    "Hg" => (1.32, 1.55, "#B8B8D0"),
    "Pb" => (1.46, 2.02, "#575961"),
};

/// Default standard-residue names: the proteinogenic amino acids plus the
/// protonation-variant and capping names common in MD force fields.
static BUILTIN_STANDARD_RESIDUES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "HID", "HIE", "HIP", "HSD", "HSE", "HSP", "CYX", "CYM", "ASH", "GLH",
    "LYN", "ACE", "NME", "NMA",
};

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Reference data for one chemical element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElementData {
    /// Canonical symbol (e.g. "C", "Na").
    pub symbol: String,
    /// Covalent radius in angstroms; drives bond inference.
    pub covalent_radius: f64,
    /// Van-der-Waals radius in angstroms.
    pub vdw_radius: f64,
    /// Display color as an RGB hex string.
    pub color: String,
}

/// The element reference table, keyed case-insensitively by symbol.
#[derive(Debug, Clone, Default)]
pub struct ElementTable {
    elements: HashMap<String, ElementData>,
}

impl ElementTable {
    /// The compiled-in default table.
    pub fn builtin() -> Self {
        let elements = BUILTIN_ELEMENTS
            .entries()
            .map(|(symbol, (covalent, vdw, color))| {
                (
                    symbol.to_uppercase(),
                    ElementData {
                        symbol: (*symbol).to_string(),
                        covalent_radius: *covalent,
                        vdw_radius: *vdw,
                        color: (*color).to_string(),
                    },
                )
            })
            .collect();
        Self { elements }
    }

    /// Loads a table from a CSV file with the header
    /// `symbol,covalent_radius,vdw_radius,color`.
    pub fn load_csv(path: &Path) -> Result<Self, TableLoadError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| TableLoadError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut elements = HashMap::new();
        for result in reader.deserialize::<ElementData>() {
            let record = result.map_err(|e| TableLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            elements.insert(record.symbol.to_uppercase(), record);
        }
        Ok(Self { elements })
    }

    /// Looks up an element by symbol, case-insensitively.
    pub fn get(&self, symbol: &str) -> Option<&ElementData> {
        self.elements.get(&symbol.trim().to_uppercase())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// Iterates over the table's entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ElementData> {
        self.elements.values()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ResidueRegistryFile {
    residues: Vec<String>,
}

/// The allow-list of "standard residue" names.
///
/// Residue classification switches the element resolver between its two
/// matching strategies, so this registry is consulted once per atom during
/// reader construction. It is an explicit value: load it, extend it, pass it
/// where it is needed, and call [`ResidueRegistry::save`] to persist user
/// additions back to the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueRegistry {
    names: BTreeSet<String>,
}

impl Default for ResidueRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ResidueRegistry {
    /// The compiled-in default registry.
    pub fn builtin() -> Self {
        Self {
            names: BUILTIN_STANDARD_RESIDUES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }

    /// Loads a registry from a TOML file of the form
    /// `residues = ["ALA", "GLY", ...]`.
    pub fn load(path: &Path) -> Result<Self, TableLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| TableLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: ResidueRegistryFile =
            toml::from_str(&content).map_err(|e| TableLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        Ok(Self {
            names: file.residues.into_iter().map(|n| n.to_uppercase()).collect(),
        })
    }

    /// Writes the registry back out in the same TOML form.
    pub fn save(&self, path: &Path) -> Result<(), TableLoadError> {
        let file = ResidueRegistryFile {
            residues: self.names.iter().cloned().collect(),
        };
        let content = toml::to_string_pretty(&file).unwrap_or_default();
        std::fs::write(path, content).map_err(|e| TableLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Whether `name` is a standard residue. Case-insensitive.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_uppercase())
    }

    /// Adds a residue name; returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.trim().to_uppercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn builtin_table_has_common_elements_with_sane_radii() {
        let table = ElementTable::builtin();
        for symbol in ["H", "C", "N", "O", "S", "P", "Na", "Cl"] {
            let data = table.get(symbol).unwrap();
            assert!(data.covalent_radius > 0.0 && data.covalent_radius < 3.0);
            assert!(data.vdw_radius >= data.covalent_radius);
        }
    }

    #[test]
    fn lookup_is_case_insensitive_and_returns_canonical_symbol() {
        let table = ElementTable::builtin();
        assert_eq!(table.get("na").unwrap().symbol, "Na");
        assert_eq!(table.get("NA").unwrap().symbol, "Na");
        assert_eq!(table.get(" c ").unwrap().symbol, "C");
        assert!(table.get("Xx").is_none());
    }

    #[test]
    fn load_csv_round_trips_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elements.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "symbol,covalent_radius,vdw_radius,color").unwrap();
        writeln!(file, "C,0.76,1.70,#909090").unwrap();
        writeln!(file, "Ow,0.66,1.52,#FF0D0D").unwrap();
        drop(file);

        let table = ElementTable::load_csv(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("OW").unwrap().symbol, "Ow");
        assert_eq!(table.get("c").unwrap().covalent_radius, 0.76);
    }

    #[test]
    fn load_csv_rejects_malformed_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "symbol,covalent_radius,vdw_radius,color").unwrap();
        writeln!(file, "C,not-a-number,1.70,#909090").unwrap();
        drop(file);

        assert!(matches!(
            ElementTable::load_csv(&path),
            Err(TableLoadError::Csv { .. })
        ));
    }

    #[test]
    fn builtin_registry_classifies_amino_acids_but_not_solvent() {
        let registry = ResidueRegistry::builtin();
        assert!(registry.contains("ALA"));
        assert!(registry.contains("ala"));
        assert!(registry.contains("HIE"));
        assert!(!registry.contains("SOL"));
        assert!(!registry.contains("WAT"));
    }

    #[test]
    fn registry_insert_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("residues.toml");

        let mut registry = ResidueRegistry::builtin();
        assert!(registry.insert("POPC"));
        assert!(!registry.insert("popc"));
        registry.save(&path).unwrap();

        let reloaded = ResidueRegistry::load(&path).unwrap();
        assert_eq!(reloaded, registry);
        assert!(reloaded.contains("POPC"));
    }

    #[test]
    fn registry_load_rejects_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "residues = \"not-a-list\"").unwrap();

        assert!(matches!(
            ResidueRegistry::load(&path),
            Err(TableLoadError::Toml { .. })
        ));
    }
}
