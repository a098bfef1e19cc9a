use crate::analysis::error::AnalysisError;
use crate::core::elements::ElementTable;
use crate::core::geometry::octree::{CollisionMap, Octree};
use crate::core::io::TrajectoryRead;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;

/// Distance slack added on top of the summed covalent radii when deciding
/// whether two atoms are bonded.
pub const BOND_TOLERANCE: f64 = 0.1;

/// Inflation applied to the tight bounding box so boundary atoms are not
/// missed by the root box test.
const BOX_EPSILON: f64 = 1.0e-6;

const OCTREE_START_DEPTH: u32 = 0;
const OCTREE_MAX_DEPTH: u32 = 18;
const OCTREE_LEAF_CAPACITY: usize = 10;

/// Builds an octree over `positions` with the given interaction radii.
///
/// The root box is the tight bounding box of the positions, inflated by a
/// small epsilon on every side.
pub fn build_index(positions: &[Point3<f64>], radii: &[f64]) -> Result<Octree, AnalysisError> {
    if positions.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }
    if positions.len() != radii.len() {
        return Err(AnalysisError::Internal(format!(
            "{} positions but {} radii",
            positions.len(),
            radii.len()
        )));
    }

    let mut lower = positions[0];
    let mut upper = positions[0];
    for p in positions.iter().skip(1) {
        for axis in 0..3 {
            lower[axis] = lower[axis].min(p[axis]);
            upper[axis] = upper[axis].max(p[axis]);
        }
    }
    let epsilon = Vector3::repeat(BOX_EPSILON);

    let mut tree = Octree::new(
        lower - epsilon,
        upper + epsilon,
        OCTREE_START_DEPTH,
        OCTREE_MAX_DEPTH,
        OCTREE_LEAF_CAPACITY,
    );
    for (index, (position, radius)) in positions.iter().zip(radii).enumerate() {
        tree.insert(index, *position, *radius);
    }
    Ok(tree)
}

/// Infers the covalent bond map for one configuration: atoms `i` and `j`
/// bond iff their distance is at most `radius_i + radius_j + tolerance`.
pub fn infer_bonds(
    positions: &[Point3<f64>],
    radii: &[f64],
    tolerance: f64,
) -> Result<CollisionMap, AnalysisError> {
    Ok(build_index(positions, radii)?.find_collisions(tolerance))
}

/// Looks up the covalent radius for every atom of a reader.
pub fn covalent_radii(
    reader: &dyn TrajectoryRead,
    table: &ElementTable,
) -> Result<Vec<f64>, AnalysisError> {
    reader
        .atoms()
        .iter()
        .map(|atom| {
            table
                .get(&atom.element)
                .map(|data| data.covalent_radius)
                .ok_or_else(|| {
                    AnalysisError::Internal(format!(
                        "element '{}' of atom {} missing from the element table",
                        atom.element, atom.serial
                    ))
                })
        })
        .collect()
}

/// Reads one frame and infers its bond map from covalent radii.
pub fn frame_bonds(
    reader: &mut dyn TrajectoryRead,
    table: &ElementTable,
    frame: usize,
    tolerance: f64,
) -> Result<CollisionMap, AnalysisError> {
    let radii = covalent_radii(reader, table)?;
    let positions = reader.read_frame(frame)?;
    infer_bonds(&positions, &radii, tolerance)
}

/// Partitions a bond map into connected components, one per molecule.
///
/// Components come out ordered by their smallest atom index; atom indices
/// within a component are sorted. Isolated atoms (empty bond sets) form
/// single-atom components.
pub fn cluster_molecules(bonds: &CollisionMap) -> Vec<BTreeSet<usize>> {
    let mut remaining: BTreeSet<usize> = bonds.keys().copied().collect();
    let mut clusters = Vec::new();

    while let Some(&seed) = remaining.iter().next() {
        let mut cluster = BTreeSet::new();
        let mut stack = vec![seed];
        while let Some(atom) = stack.pop() {
            if !remaining.remove(&atom) {
                continue;
            }
            cluster.insert(atom);
            if let Some(neighbors) = bonds.get(&atom) {
                stack.extend(neighbors.iter().copied());
            }
        }
        clusters.push(cluster);
    }

    clusters
}
