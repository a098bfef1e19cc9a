use super::traits::{
    ParseErrorKind, TrajectoryError, TrajectoryRead, parse_float_column, parse_int_column,
    slice_and_trim,
};
use crate::core::elements::ElementResolver;
use crate::core::models::atom::Atom;
use crate::core::models::cell::{PeriodicCell, lengths_angles_matrix};
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// The cell-parameter line is given in angstroms; the historical unit
/// convention for this format rescales the cell by 0.1 on read.
const CELL_SCALE: f64 = 0.1;

/// Minimum atom-record width: through the z coordinate field.
const MIN_RECORD_WIDTH: usize = 54;

/// Reader for PDB-style trajectories.
///
/// Frames are blocks of fixed-width `ATOM`/`HETATM` records bounded by
/// `MODEL`/`ENDMDL` sentinel lines, with the periodic cell carried on a
/// `CRYST1` line (`a b c alpha beta gamma`, angles in degrees). A `CRYST1`
/// line applies to every following frame until the next one, so a trajectory
/// with a single global cell line is accepted. Construction scans the file
/// once; reads seek through the offset table.
#[derive(Debug)]
pub struct PdbFile {
    reader: BufReader<File>,
    atoms: Vec<Atom>,
    n_atoms: usize,
    /// Bytes per atom record, trailing newline included.
    record_len: usize,
    frame_offsets: Vec<u64>,
    cell_offsets: Vec<u64>,
}

/// Scan state for the frame currently being walked.
struct FrameScan {
    start: Option<u64>,
    count: usize,
    closed: bool,
}

impl PdbFile {
    pub fn open(path: &Path, resolver: &ElementResolver) -> Result<Self, TrajectoryError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut frame_offsets = Vec::new();
        let mut cell_offsets = Vec::new();
        let mut n_atoms = 0usize;
        let mut record_len = 0usize;

        let mut pending_cell: Option<u64> = None;
        let mut current: Option<FrameScan> = None;

        let mut offset = 0u64;
        let mut line_no = 0usize;
        let mut line = String::new();

        loop {
            let line_start = offset;
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                if current.is_some() {
                    return Err(TrajectoryError::Inconsistent(
                        "truncated frame: missing ENDMDL".to_string(),
                    ));
                }
                break;
            }
            offset += read as u64;
            line_no += 1;

            let record_type = slice_and_trim(&line, 0, 6);
            match record_type {
                "CRYST1" => pending_cell = Some(line_start),
                "MODEL" => {
                    if current.is_some() {
                        return Err(TrajectoryError::Inconsistent(format!(
                            "nested MODEL on line {}",
                            line_no
                        )));
                    }
                    current = Some(FrameScan {
                        start: None,
                        count: 0,
                        closed: false,
                    });
                }
                "ATOM" | "HETATM" => {
                    let Some(frame) = current.as_mut() else {
                        return Err(TrajectoryError::Inconsistent(format!(
                            "atom record outside a MODEL block on line {}",
                            line_no
                        )));
                    };
                    if frame.closed {
                        return Err(TrajectoryError::Inconsistent(format!(
                            "non-contiguous atom records on line {}",
                            line_no
                        )));
                    }
                    if frame.start.is_none() {
                        frame.start = Some(line_start);
                    }
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
                    frame.count += 1;
                }
                "TER" => {
                    if let Some(frame) = current.as_mut() {
                        if frame.start.is_some() {
                            frame.closed = true;
                        }
                    }
                }
                "ENDMDL" => {
                    let Some(frame) = current.take() else {
                        return Err(TrajectoryError::Inconsistent(format!(
                            "ENDMDL without MODEL on line {}",
                            line_no
                        )));
                    };
                    let Some(start) = frame.start else {
                        return Err(TrajectoryError::Inconsistent(
                            "MODEL block contains no atom records".to_string(),
                        ));
                    };
                    if frame_offsets.is_empty() {
                        n_atoms = frame.count;
                    } else if frame.count != n_atoms {
                        return Err(TrajectoryError::Inconsistent(format!(
                            "frame {} holds {} atoms, expected {}",
                            frame_offsets.len(),
                            frame.count,
                            n_atoms
                        )));
                    }
                    let Some(cell) = pending_cell else {
                        return Err(TrajectoryError::Inconsistent(
                            "no CRYST1 record before the first frame".to_string(),
                        ));
                    };
                    frame_offsets.push(start);
                    cell_offsets.push(cell);
                }
                _ => {}
            }
        }

        if frame_offsets.is_empty() {
            return Err(TrajectoryError::Inconsistent(
                "file contains no MODEL frames".to_string(),
            ));
        }

        let mut pdb = Self {
            reader,
            atoms: Vec::new(),
            n_atoms,
            record_len,
            frame_offsets,
            cell_offsets,
        };
        pdb.parse_first_frame(resolver)?;
        Ok(pdb)
    }

    fn parse_first_frame(&mut self, resolver: &ElementResolver) -> Result<(), TrajectoryError> {
        let block = self.read_block(0)?;
        let mut atoms = Vec::with_capacity(self.n_atoms);
        for (serial, record) in self.records(&block).enumerate() {
            let file_id = parse_int_column(record, 6, 11, serial + 1)?;
            let name = slice_and_trim(record, 12, 16);
            let residue_name = slice_and_trim(record, 17, 20);
            let residue_id = parse_int_column(record, 22, 26, serial + 1)?;

            let mut atom = Atom::new(serial, file_id, name, residue_id, residue_name);
            atom.element = resolver.resolve(name, residue_name)?;
            atoms.push(atom);
        }
        self.atoms = atoms;
        Ok(())
    }

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

impl TrajectoryRead for PdbFile {
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
            let x = parse_float_column(record, 30, 38, i + 1)?;
            let y = parse_float_column(record, 38, 46, i + 1)?;
            let z = parse_float_column(record, 46, 54, i + 1)?;
            positions.push(Point3::new(x, y, z));
        }
        Ok(positions)
    }

    fn read_cell(&mut self, frame: usize) -> Result<PeriodicCell, TrajectoryError> {
        self.check_frame(frame)?;
        self.reader
            .seek(SeekFrom::Start(self.cell_offsets[frame]))?;
        let mut line = String::new();
        let _ = self.reader.read_line(&mut line)?;

        // CRYST1 a b c alpha beta gamma [space group...]
        let values: Vec<f64> = line
            .split_whitespace()
            .skip(1)
            .map_while(|token| token.parse().ok())
            .collect();
        if values.len() < 6 {
            return Err(TrajectoryError::Parse {
                line: 0,
                kind: ParseErrorKind::InvalidCell {
                    value: line.trim().to_string(),
                },
            });
        }

        let matrix = lengths_angles_matrix(
            values[0], values[1], values[2], values[3], values[4], values[5],
        );
        Ok(PeriodicCell::from_matrix(matrix * CELL_SCALE)?)
    }
}
