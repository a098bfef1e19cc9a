use crate::analysis::error::AnalysisError;
use crate::analysis::grouping::MoleculeGroup;
use crate::analysis::progress::{Progress, ProgressReporter};
use crate::core::io::{TrajectoryError, TrajectoryRead};
use crate::core::models::cell::CellError;

/// The result of a shell-occupancy scan: one row per molecule group, one
/// column per scanned frame, each cell counting the group's atoms found
/// within the shell radius at that frame.
///
/// Storage is frame-major so a cancelled scan truncates to whole frames; the
/// accessors present the matrix as group-by-frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyMatrix {
    residue_ids: Vec<i64>,
    frames: Vec<usize>,
    data: Vec<u32>,
}

impl OccupancyMatrix {
    fn new(residue_ids: Vec<i64>, frame_capacity: usize) -> Self {
        let groups = residue_ids.len();
        Self {
            residue_ids,
            frames: Vec::with_capacity(frame_capacity),
            data: Vec::with_capacity(groups * frame_capacity),
        }
    }

    fn push_frame(&mut self, frame: usize, column: Vec<u32>) {
        debug_assert_eq!(column.len(), self.residue_ids.len());
        self.frames.push(frame);
        self.data.extend(column);
    }

    /// Residue ids labelling the matrix rows, in group order.
    pub fn residue_ids(&self) -> &[i64] {
        &self.residue_ids
    }

    /// Trajectory frame indices labelling the matrix columns, in scan order.
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    pub fn group_count(&self) -> usize {
        self.residue_ids.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Occupancy count for `group` at scanned-frame column `frame`.
    pub fn get(&self, group: usize, frame: usize) -> u32 {
        self.data[frame * self.residue_ids.len() + group]
    }

    /// One group's occupancy across all scanned frames.
    pub fn group_row(&self, group: usize) -> Vec<u32> {
        (0..self.frames.len())
            .map(|frame| self.get(group, frame))
            .collect()
    }

    /// Number of scanned frames in which the group had at least one atom in
    /// the shell.
    pub fn residence_frames(&self, group: usize) -> usize {
        (0..self.frames.len())
            .filter(|&frame| self.get(group, frame) > 0)
            .count()
    }
}

/// Scans the trajectory for molecules within a spherical shell around a
/// center atom.
///
/// For every requested frame the coordinates and periodic cell are read, and
/// each group's cell counts its atoms whose minimum-image distance to the
/// center atom is at most `radius`. Preconditions are rejected before any
/// I/O; a degenerate cell aborts the scan carrying the frame index. The
/// reporter's cancellation flag is polled between frames, and a cancelled
/// scan returns the matrix truncated to the frames already completed.
pub fn scan(
    reader: &mut dyn TrajectoryRead,
    groups: &[MoleculeGroup],
    center: usize,
    radius: f64,
    frames: &[usize],
    reporter: &ProgressReporter,
) -> Result<OccupancyMatrix, AnalysisError> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(AnalysisError::InvalidRadius(radius));
    }
    if groups.is_empty() || groups.iter().all(|g| g.atom_indices.is_empty()) {
        return Err(AnalysisError::EmptySelection);
    }
    let atoms = reader.atom_count();
    if center >= atoms {
        return Err(AnalysisError::CenterOutOfRange { center, atoms });
    }
    let total = reader.frame_count();
    for &frame in frames {
        if frame >= total {
            return Err(AnalysisError::FrameOutOfRange {
                frame,
                frames: total,
            });
        }
    }
    for group in groups {
        for &index in &group.atom_indices {
            if index >= atoms {
                return Err(AnalysisError::Internal(format!(
                    "group atom index {} out of range ({} atoms)",
                    index, atoms
                )));
            }
        }
    }

    let residue_ids: Vec<i64> = groups.iter().map(|g| g.residue_id).collect();
    let mut matrix = OccupancyMatrix::new(residue_ids, frames.len());

    reporter.report(Progress::TaskStart {
        total_steps: frames.len() as u64,
    });

    for &frame in frames {
        if reporter.is_cancelled() {
            reporter.report(Progress::Message(format!(
                "scan cancelled after {} of {} frames",
                matrix.frame_count(),
                frames.len()
            )));
            break;
        }

        let positions = reader.read_frame(frame)?;
        let cell = reader.read_cell(frame).map_err(|e| match e {
            TrajectoryError::Cell(CellError::Degenerate) => {
                AnalysisError::DegenerateFrame { frame }
            }
            other => other.into(),
        })?;

        let center_pos = positions[center];
        let column = groups
            .iter()
            .map(|group| {
                group
                    .atom_indices
                    .iter()
                    .filter(|&&i| {
                        cell.minimum_image_distance(&center_pos, &positions[i]) <= radius
                    })
                    .count() as u32
            })
            .collect();
        matrix.push_frame(frame, column);

        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::cell::PeriodicCell;
    use nalgebra::{Matrix3, Point3};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// An in-memory trajectory for scanner tests.
    #[derive(Debug)]
    struct FakeTrajectory {
        atoms: Vec<Atom>,
        frames: Vec<Vec<Point3<f64>>>,
        cells: Vec<Matrix3<f64>>,
        reads: AtomicUsize,
    }

    impl FakeTrajectory {
        fn new(atoms: Vec<Atom>, frames: Vec<Vec<Point3<f64>>>, cells: Vec<Matrix3<f64>>) -> Self {
            Self {
                atoms,
                frames,
                cells,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl TrajectoryRead for FakeTrajectory {
        fn atom_count(&self) -> usize {
            self.atoms.len()
        }

        fn frame_count(&self) -> usize {
            self.frames.len()
        }

        fn atoms(&self) -> &[Atom] {
            &self.atoms
        }

        fn read_frame(&mut self, frame: usize) -> Result<Vec<Point3<f64>>, TrajectoryError> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            Ok(self.frames[frame].clone())
        }

        fn read_cell(&mut self, frame: usize) -> Result<PeriodicCell, TrajectoryError> {
            Ok(PeriodicCell::from_matrix(self.cells[frame])?)
        }
    }

    fn water_atom(serial: usize, residue_id: i64) -> Atom {
        let mut atom = Atom::new(serial, serial as i64 + 1, "OW", residue_id, "SOL");
        atom.element = "O".to_string();
        atom
    }

    fn cubic(l: f64) -> Matrix3<f64> {
        Matrix3::from_diagonal(&nalgebra::Vector3::new(l, l, l))
    }

    /// Center atom plus two single-atom water groups; one sits across the
    /// periodic boundary from the center.
    fn shell_fixture() -> (FakeTrajectory, Vec<MoleculeGroup>) {
        let atoms = vec![water_atom(0, 1), water_atom(1, 2), water_atom(2, 3)];
        let frames = vec![
            vec![
                Point3::new(0.5, 5.0, 5.0),
                Point3::new(9.5, 5.0, 5.0),
                Point3::new(5.0, 5.0, 5.0),
            ],
            vec![
                Point3::new(0.5, 5.0, 5.0),
                Point3::new(3.5, 5.0, 5.0),
                Point3::new(5.0, 5.0, 5.0),
            ],
        ];
        let cells = vec![cubic(10.0), cubic(10.0)];
        let trajectory = FakeTrajectory::new(atoms, frames, cells);

        let groups = vec![
            MoleculeGroup {
                residue_id: 2,
                atom_indices: vec![1],
            },
            MoleculeGroup {
                residue_id: 3,
                atom_indices: vec![2],
            },
        ];
        (trajectory, groups)
    }

    #[test]
    fn minimum_image_membership_crosses_the_boundary() {
        let (mut trajectory, groups) = shell_fixture();
        let reporter = ProgressReporter::new();

        // Atom 1 is 1.0 away through the boundary, atom 2 is 4.5 away.
        let matrix = scan(&mut trajectory, &groups, 0, 2.0, &[0, 1], &reporter).unwrap();

        assert_eq!(matrix.group_count(), 2);
        assert_eq!(matrix.frame_count(), 2);
        assert_eq!(matrix.residue_ids(), &[2, 3]);

        assert_eq!(matrix.get(0, 0), 1);
        assert_eq!(matrix.get(1, 0), 0);
        // Frame 1: atom 1 moved 3.0 away, outside the 2.0 shell.
        assert_eq!(matrix.get(0, 1), 0);
        assert_eq!(matrix.residence_frames(0), 1);
    }

    #[test]
    fn occupancy_is_monotonic_in_radius() {
        let (mut trajectory, groups) = shell_fixture();
        let reporter = ProgressReporter::new();

        let mut previous: Option<OccupancyMatrix> = None;
        for radius in [0.5, 1.5, 4.0, 6.0] {
            let matrix =
                scan(&mut trajectory, &groups, 0, radius, &[0, 1], &reporter).unwrap();
            for cell in matrix.data.iter() {
                assert!(*cell <= 1);
            }
            if let Some(prev) = previous {
                for group in 0..matrix.group_count() {
                    for frame in 0..matrix.frame_count() {
                        assert!(matrix.get(group, frame) >= prev.get(group, frame));
                    }
                }
            }
            previous = Some(matrix);
        }
    }

    #[test]
    fn multi_atom_groups_accumulate_counts() {
        let atoms = vec![water_atom(0, 1), water_atom(1, 2), water_atom(2, 2)];
        let frames = vec![vec![
            Point3::new(5.0, 5.0, 5.0),
            Point3::new(5.5, 5.0, 5.0),
            Point3::new(5.0, 5.8, 5.0),
        ]];
        let mut trajectory = FakeTrajectory::new(atoms, frames, vec![cubic(10.0)]);
        let groups = vec![MoleculeGroup {
            residue_id: 2,
            atom_indices: vec![1, 2],
        }];

        let reporter = ProgressReporter::new();
        let matrix = scan(&mut trajectory, &groups, 0, 1.0, &[0], &reporter).unwrap();
        assert_eq!(matrix.get(0, 0), 2);
    }

    #[test]
    fn preconditions_are_rejected_before_any_read() {
        let (mut trajectory, groups) = shell_fixture();
        let reporter = ProgressReporter::new();

        assert!(matches!(
            scan(&mut trajectory, &groups, 0, 0.0, &[0], &reporter),
            Err(AnalysisError::InvalidRadius(_))
        ));
        assert!(matches!(
            scan(&mut trajectory, &groups, 0, -1.0, &[0], &reporter),
            Err(AnalysisError::InvalidRadius(_))
        ));
        assert!(matches!(
            scan(&mut trajectory, &[], 0, 2.0, &[0], &reporter),
            Err(AnalysisError::EmptySelection)
        ));
        assert!(matches!(
            scan(&mut trajectory, &groups, 99, 2.0, &[0], &reporter),
            Err(AnalysisError::CenterOutOfRange { center: 99, .. })
        ));
        assert!(matches!(
            scan(&mut trajectory, &groups, 0, 2.0, &[7], &reporter),
            Err(AnalysisError::FrameOutOfRange { frame: 7, .. })
        ));
        assert_eq!(trajectory.reads.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn degenerate_cell_aborts_with_the_frame_index() {
        let atoms = vec![water_atom(0, 1), water_atom(1, 2)];
        let frames = vec![
            vec![Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 1.0, 1.0)],
            vec![Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 1.0, 1.0)],
        ];
        let cells = vec![cubic(10.0), Matrix3::zeros()];
        let mut trajectory = FakeTrajectory::new(atoms, frames, cells);
        let groups = vec![MoleculeGroup {
            residue_id: 2,
            atom_indices: vec![1],
        }];

        let reporter = ProgressReporter::new();
        let err = scan(&mut trajectory, &groups, 0, 2.0, &[0, 1], &reporter).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateFrame { frame: 1 }));
    }

    #[test]
    fn cancellation_truncates_to_completed_frames() {
        let (mut trajectory, groups) = shell_fixture();

        let flag = Arc::new(AtomicBool::new(false));
        let cancel_after_first = flag.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if matches!(event, Progress::TaskIncrement) {
                cancel_after_first.store(true, Ordering::Relaxed);
            }
        }))
        .with_cancel_flag(flag);

        let matrix = scan(&mut trajectory, &groups, 0, 2.0, &[0, 1], &reporter).unwrap();
        assert_eq!(matrix.frame_count(), 1);
        assert_eq!(matrix.frames(), &[0]);
        // The completed column is intact.
        assert_eq!(matrix.get(0, 0), 1);
    }
}
