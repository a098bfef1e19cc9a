use crate::core::models::atom::Atom;
use std::collections::HashSet;

/// An ordered list of atom indices belonging to one molecule of the target
/// species, labelled by the residue id they share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoleculeGroup {
    pub residue_id: i64,
    pub atom_indices: Vec<usize>,
}

/// Partitions atoms into per-molecule index groups.
///
/// Atoms are scanned in file order and a new group starts whenever the
/// residue id changes, whether or not the first atom of the new residue
/// passes the filters — group boundaries describe the file's residue
/// structure, the filters only select members. An atom joins its group when
/// its residue name is in `target_residues` and its name is in
/// `target_atoms`. Groups that end up with no matching atoms are dropped;
/// the output preserves first-seen residue order.
///
/// Residue ids in these formats repeat across molecules (they wrap), so the
/// id alone does not identify a group; the position of the id *change* does.
pub fn group_molecules(
    atoms: &[Atom],
    target_residues: &[String],
    target_atoms: &[String],
) -> Vec<MoleculeGroup> {
    let residue_filter: HashSet<&str> = target_residues.iter().map(String::as_str).collect();
    let atom_filter: HashSet<&str> = target_atoms.iter().map(String::as_str).collect();

    let mut groups = Vec::new();
    let mut current: Option<MoleculeGroup> = None;

    for atom in atoms {
        let boundary = current
            .as_ref()
            .is_none_or(|group| group.residue_id != atom.residue_id);
        if boundary {
            if let Some(group) = current.take() {
                if !group.atom_indices.is_empty() {
                    groups.push(group);
                }
            }
            current = Some(MoleculeGroup {
                residue_id: atom.residue_id,
                atom_indices: Vec::new(),
            });
        }

        if residue_filter.contains(atom.residue_name.as_str())
            && atom_filter.contains(atom.name.as_str())
        {
            if let Some(group) = current.as_mut() {
                group.atom_indices.push(atom.serial);
            }
        }
    }

    if let Some(group) = current {
        if !group.atom_indices.is_empty() {
            groups.push(group);
        }
    }

    groups
}
