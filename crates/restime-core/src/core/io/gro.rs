use super::traits::{
    ParseErrorKind, TrajectoryError, TrajectoryRead, parse_float_column, parse_int_column,
    slice_and_trim,
};
use crate::core::elements::ElementResolver;
use crate::core::models::atom::Atom;
use crate::core::models::cell::PeriodicCell;
use nalgebra::{Matrix3, Point3};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Conversion from the format's native nanometers to the core unit.
const LENGTH_SCALE: f64 = 10.0;

/// Minimum atom-record width: 20 metadata columns + three 8-char coordinates.
const MIN_RECORD_WIDTH: usize = 44;

/// Reader for GRO-style trajectories.
///
/// Each frame is a block of `title line`, `atom-count line`, N fixed-width
/// atom lines and one cell line. Construction scans the file once, recording
/// the byte offset of every frame's coordinate block and cell line and
/// validating that every atom record has the same width; reads then seek
/// straight to the requested frame.
#[derive(Debug)]
pub struct GroFile {
    reader: BufReader<File>,
    atoms: Vec<Atom>,
    n_atoms: usize,
    /// Bytes per atom record, trailing newline included.
    record_len: usize,
    frame_offsets: Vec<u64>,
    cell_offsets: Vec<u64>,
}

impl GroFile {
    pub fn open(path: &Path, resolver: &ElementResolver) -> Result<Self, TrajectoryError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut frame_offsets = Vec::new();
        let mut cell_offsets = Vec::new();
        let mut n_atoms = 0usize;
        let mut record_len = 0usize;

        let mut offset = 0u64;
        let mut line_no = 0usize;
        let mut line = String::new();

        loop {
            // Title line; clean EOF here means the previous frame was the last.
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            offset += read as u64;
            line_no += 1;

            // Atom-count line.
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                return Err(TrajectoryError::Inconsistent(
                    "truncated frame: missing atom-count line".to_string(),
                ));
            }
            offset += read as u64;
            line_no += 1;

            let raw = line.trim();
            let declared: usize = raw.parse().map_err(|_| TrajectoryError::Parse {
                line: line_no,
                kind: ParseErrorKind::InvalidInt {
                    columns: "atom count".to_string(),
                    value: raw.to_string(),
                },
            })?;
            if frame_offsets.is_empty() {
                if declared == 0 {
                    return Err(TrajectoryError::Inconsistent(
                        "declared atom count is zero".to_string(),
                    ));
                }
                n_atoms = declared;
            } else if declared != n_atoms {
                return Err(TrajectoryError::Inconsistent(format!(
                    "frame {} declares {} atoms, expected {}",
                    frame_offsets.len(),
                    declared,
                    n_atoms
                )));
            }
            frame_offsets.push(offset);

            // Atom records: fixed width across the whole file.
            for _ in 0..n_atoms {
                line.clear();
                let read = reader.read_line(&mut line)?;
                if read == 0 {
                    return Err(TrajectoryError::Inconsistent(format!(
                        "truncated frame {}: unexpected end of file",
                        frame_offsets.len() - 1
                    )));
                }
                offset += read as u64;
                line_no += 1;

                if record_len == 0 {
                    if read < MIN_RECORD_WIDTH {
                        return Err(TrajectoryError::Parse {
                            line: line_no,
                            kind: ParseErrorKind::LineTooShort,
                        });
                    }
                    record_len = read;
                } else if read != record_len {
                    return Err(TrajectoryError::Inconsistent(format!(
                        "atom record on line {} is {} bytes, expected {}",
                        line_no, read, record_len
                    )));
                }
            }

            // Cell line.
            cell_offsets.push(offset);
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                return Err(TrajectoryError::Inconsistent(format!(
                    "truncated frame {}: missing cell line",
                    frame_offsets.len() - 1
                )));
            }
            offset += read as u64;
            line_no += 1;
        }

        if frame_offsets.is_empty() {
            return Err(TrajectoryError::Inconsistent(
                "file contains no frames".to_string(),
            ));
        }

        let mut gro = Self {
            reader,
            atoms: Vec::new(),
            n_atoms,
            record_len,
            frame_offsets,
            cell_offsets,
        };
        gro.parse_first_frame(resolver)?;
        Ok(gro)
    }

    fn parse_first_frame(&mut self, resolver: &ElementResolver) -> Result<(), TrajectoryError> {
        let block = self.read_block(0)?;
        let mut atoms = Vec::with_capacity(self.n_atoms);
        for (serial, record) in self.records(&block).enumerate() {
            let residue_id = parse_int_column(record, 0, 5, serial + 1)?;
            let residue_name = slice_and_trim(record, 5, 10);
            let name = slice_and_trim(record, 10, 15);
            let file_id = parse_int_column(record, 15, 20, serial + 1)?;

            let mut atom = Atom::new(serial, file_id, name, residue_id, residue_name);
            atom.element = resolver.resolve(name, residue_name)?;
            atoms.push(atom);
        }
        self.atoms = atoms;
        Ok(())
    }

    /// Reads one frame's raw coordinate block into a string.
    fn read_block(&mut self, frame: usize) -> Result<String, TrajectoryError> {
        self.reader
            .seek(SeekFrom::Start(self.frame_offsets[frame]))?;
        let mut buffer = vec![0u8; self.n_atoms * self.record_len];
        self.reader.read_exact(&mut buffer)?;
        String::from_utf8(buffer).map_err(|_| TrajectoryError::Parse {
            line: 0,
            kind: ParseErrorKind::InvalidEncoding,
        })
    }

    fn records<'a>(&self, block: &'a str) -> impl Iterator<Item = &'a str> {
        let record_len = self.record_len;
        (0..self.n_atoms).map(move |i| &block[i * record_len..(i + 1) * record_len])
    }

    fn check_frame(&self, frame: usize) -> Result<(), TrajectoryError> {
        if frame >= self.frame_offsets.len() {
            return Err(TrajectoryError::FrameOutOfRange {
                frame,
                frames: self.frame_offsets.len(),
            });
        }
        Ok(())
    }
}

impl TrajectoryRead for GroFile {
    fn atom_count(&self) -> usize {
        self.n_atoms
    }

    fn frame_count(&self) -> usize {
        self.frame_offsets.len()
    }

    fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    fn read_frame(&mut self, frame: usize) -> Result<Vec<Point3<f64>>, TrajectoryError> {
        self.check_frame(frame)?;
        let block = self.read_block(frame)?;

        let mut positions = Vec::with_capacity(self.n_atoms);
        for (i, record) in self.records(&block).enumerate() {
            let x = parse_float_column(record, 20, 28, i + 1)?;
            let y = parse_float_column(record, 28, 36, i + 1)?;
            let z = parse_float_column(record, 36, 44, i + 1)?;
            positions.push(Point3::new(x, y, z) * LENGTH_SCALE);
        }
        Ok(positions)
    }

    fn read_cell(&mut self, frame: usize) -> Result<PeriodicCell, TrajectoryError> {
        self.check_frame(frame)?;
        self.reader
            .seek(SeekFrom::Start(self.cell_offsets[frame]))?;
        let mut line = String::new();
        let _ = self.reader.read_line(&mut line)?;

        let values: Vec<f64> = line
            .split_whitespace()
            .map_while(|token| token.parse().ok())
            .collect();

        // 3 values: orthorhombic diagonal. 9 values: full triclinic in the
        // component order v1x v2y v3z v1y v1z v2x v2z v3x v3y.
        let mut m = Matrix3::zeros();
        match values.len() {
            3 => {
                m[(0, 0)] = values[0];
                m[(1, 1)] = values[1];
                m[(2, 2)] = values[2];
            }
            9 => {
                m[(0, 0)] = values[0];
                m[(1, 1)] = values[1];
                m[(2, 2)] = values[2];
                m[(1, 0)] = values[3];
                m[(2, 0)] = values[4];
                m[(0, 1)] = values[5];
                m[(2, 1)] = values[6];
                m[(0, 2)] = values[7];
                m[(1, 2)] = values[8];
            }
            _ => {
                return Err(TrajectoryError::Parse {
                    line: 0,
                    kind: ParseErrorKind::InvalidCell {
                        value: line.trim().to_string(),
                    },
                });
            }
        }
        Ok(PeriodicCell::from_matrix(m * LENGTH_SCALE)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::elements::{ElementTable, ResidueRegistry};
    use std::io::Write;
    use tempfile::tempdir;

    fn write_fixture(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("traj.gro");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    fn atom_line(resid: i64, resname: &str, name: &str, id: i64, x: f64, y: f64, z: f64) -> String {
        format!(
            "{:>5}{:<5}{:>5}{:>5}{:>8.3}{:>8.3}{:>8.3}\n",
            resid, resname, name, id, x, y, z
        )
    }

    /// Two frames, three water atoms; positions in nm.
    fn two_frame_fixture() -> String {
        let mut content = String::new();
        content.push_str("Water, t= 0.0\n    3\n");
        content.push_str(&atom_line(1, "SOL", "OW1", 1, 0.100, 0.200, 0.300));
        content.push_str(&atom_line(1, "SOL", "HW2", 2, 0.150, 0.250, 0.350));
        content.push_str(&atom_line(2, "SOL", "OW1", 3, 0.700, 0.800, 0.900));
        content.push_str("   2.00000   2.00000   2.00000\n");
        content.push_str("Water, t= 1.0\n    3\n");
        content.push_str(&atom_line(1, "SOL", "OW1", 1, 0.110, 0.210, 0.310));
        content.push_str(&atom_line(1, "SOL", "HW2", 2, 0.160, 0.260, 0.360));
        content.push_str(&atom_line(2, "SOL", "OW1", 3, 0.710, 0.810, 0.910));
        content.push_str("   2.00000   2.00000   2.00000\n");
        content
    }

    fn open_fixture(content: &str) -> (tempfile::TempDir, GroFile) {
        let (dir, path) = write_fixture(content);
        let table = ElementTable::builtin();
        let residues = ResidueRegistry::builtin();
        let resolver = ElementResolver::new(&table, &residues);
        let gro = GroFile::open(&path, &resolver).unwrap();
        (dir, gro)
    }

    #[test]
    fn construction_indexes_frames_and_parses_metadata() {
        let (_dir, gro) = open_fixture(&two_frame_fixture());

        assert_eq!(gro.atom_count(), 3);
        assert_eq!(gro.frame_count(), 2);

        let atoms = gro.atoms();
        assert_eq!(atoms[0].name, "OW1");
        assert_eq!(atoms[0].residue_name, "SOL");
        assert_eq!(atoms[0].residue_id, 1);
        assert_eq!(atoms[0].file_id, 1);
        assert_eq!(atoms[0].element, "O");
        assert_eq!(atoms[1].element, "H");
        assert_eq!(atoms[2].residue_id, 2);
    }

    #[test]
    fn positions_are_scaled_to_the_core_unit() {
        let (_dir, mut gro) = open_fixture(&two_frame_fixture());

        let frame = gro.read_frame(0).unwrap();
        assert!((frame[0] - Point3::new(1.0, 2.0, 3.0)).norm() < 1.0e-9);
        assert!((frame[2] - Point3::new(7.0, 8.0, 9.0)).norm() < 1.0e-9);
    }

    #[test]
    fn random_access_equals_sequential_iteration() {
        let (_dir, mut gro) = open_fixture(&two_frame_fixture());

        let sequential: Vec<_> = (0..gro.frame_count())
            .map(|i| gro.read_frame(i).unwrap())
            .collect();
        // Read backwards and compare.
        for frame in (0..gro.frame_count()).rev() {
            assert_eq!(gro.read_frame(frame).unwrap(), sequential[frame]);
        }
    }

    #[test]
    fn cell_is_scaled_and_diagonal_for_three_values() {
        let (_dir, mut gro) = open_fixture(&two_frame_fixture());

        let cell = gro.read_cell(1).unwrap();
        assert!((cell.matrix()[(0, 0)] - 20.0).abs() < 1.0e-9);
        assert!((cell.matrix()[(1, 1)] - 20.0).abs() < 1.0e-9);
        assert!((cell.matrix()[(2, 2)] - 20.0).abs() < 1.0e-9);
        assert!(cell.matrix()[(0, 1)].abs() < 1.0e-9);
    }

    #[test]
    fn nine_value_cell_line_builds_a_triclinic_matrix() {
        let mut content = String::new();
        content.push_str("t=0\n    1\n");
        content.push_str(&atom_line(1, "SOL", "OW", 1, 0.0, 0.0, 0.0));
        content.push_str("  2.0  2.0  2.0  0.0  0.0  0.5  0.0  0.0  0.0\n");
        let (_dir, mut gro) = open_fixture(&content);

        let cell = gro.read_cell(0).unwrap();
        // v2x = 0.5 nm = 5 in the core unit.
        assert!((cell.matrix()[(0, 1)] - 5.0).abs() < 1.0e-9);
        assert!((cell.matrix()[(0, 0)] - 20.0).abs() < 1.0e-9);
    }

    #[test]
    fn non_integer_atom_count_is_an_invalid_file() {
        let (dir, path) = write_fixture("title\n  abc\n");
        let table = ElementTable::builtin();
        let residues = ResidueRegistry::builtin();
        let resolver = ElementResolver::new(&table, &residues);

        let err = GroFile::open(&path, &resolver).unwrap_err();
        assert!(matches!(
            err,
            TrajectoryError::Parse {
                kind: ParseErrorKind::InvalidInt { .. },
                ..
            }
        ));
        drop(dir);
    }

    #[test]
    fn truncated_frame_is_an_invalid_file() {
        let mut content = String::new();
        content.push_str("t=0\n    3\n");
        content.push_str(&atom_line(1, "SOL", "OW1", 1, 0.1, 0.2, 0.3));
        // Two atom lines and the cell line are missing.
        let (dir, path) = write_fixture(&content);
        let table = ElementTable::builtin();
        let residues = ResidueRegistry::builtin();
        let resolver = ElementResolver::new(&table, &residues);

        assert!(matches!(
            GroFile::open(&path, &resolver),
            Err(TrajectoryError::Inconsistent(_))
        ));
        drop(dir);
    }

    #[test]
    fn mismatched_record_width_is_an_invalid_file() {
        let mut content = String::new();
        content.push_str("t=0\n    2\n");
        content.push_str(&atom_line(1, "SOL", "OW1", 1, 0.1, 0.2, 0.3));
        content.push_str("    1SOL    HW2    2   0.15   0.25\n");
        content.push_str("   2.0   2.0   2.0\n");
        let (dir, path) = write_fixture(&content);
        let table = ElementTable::builtin();
        let residues = ResidueRegistry::builtin();
        let resolver = ElementResolver::new(&table, &residues);

        assert!(matches!(
            GroFile::open(&path, &resolver),
            Err(TrajectoryError::Inconsistent(_))
        ));
        drop(dir);
    }

    #[test]
    fn frame_index_out_of_range_is_reported() {
        let (_dir, mut gro) = open_fixture(&two_frame_fixture());
        assert!(matches!(
            gro.read_frame(2),
            Err(TrajectoryError::FrameOutOfRange { frame: 2, frames: 2 })
        ));
        assert!(matches!(
            gro.read_cell(9),
            Err(TrajectoryError::FrameOutOfRange { frame: 9, frames: 2 })
        ));
    }
}
