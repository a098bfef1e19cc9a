use super::load_reference;
use crate::cli::ScanArgs;
use crate::error::{CliError, Result};
use crate::progress::CliProgressHandler;
use restime::analysis::progress::ProgressReporter;
use restime::analysis::shell::OccupancyMatrix;
use restime::workflows::residence::{ResidenceConfigBuilder, run as run_residence};
use std::path::Path;
use tracing::info;

pub fn run(args: ScanArgs) -> Result<()> {
    if args.stride == 0 {
        return Err(CliError::InvalidArgument(
            "stride must be at least 1".to_string(),
        ));
    }
    if let Some(end) = args.end {
        if end <= args.begin {
            return Err(CliError::InvalidArgument(format!(
                "empty frame range {}..{}",
                args.begin, end
            )));
        }
    }

    let (elements, residues) = load_reference(&args.reference)?;

    let mut builder = ResidenceConfigBuilder::new()
        .trajectory(args.input.clone())
        .target_residues(args.target_residues.clone())
        .target_atoms(args.target_atoms.clone())
        .center(args.center)
        .radius(args.radius);
    // An explicit range becomes a frame list; otherwise the workflow scans
    // the whole trajectory and strides are applied below only when set.
    if args.end.is_some() || args.begin > 0 || args.stride > 1 {
        let end = args.end.unwrap_or(usize::MAX);
        builder = builder.frames(frame_range(args.begin, end, args.stride, &args.input)?);
    }
    let config = builder
        .build()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let result = run_residence(&config, &elements, &residues, &reporter)?;

    write_matrix(&args.output, &result.occupancy)?;
    info!(
        "Wrote a {} x {} occupancy matrix to {}.",
        result.occupancy.group_count(),
        result.occupancy.frame_count(),
        args.output.display()
    );
    println!(
        "{} molecules x {} frames -> {}",
        result.occupancy.group_count(),
        result.occupancy.frame_count(),
        args.output.display()
    );

    Ok(())
}

/// Expands `begin..end` by `stride` against the actual trajectory length.
fn frame_range(
    begin: usize,
    end: usize,
    stride: usize,
    input: &Path,
) -> Result<Vec<usize>> {
    // A cheap open to learn the frame count; the workflow re-opens the file
    // for the scan itself.
    use restime::core::elements::{ElementResolver, ElementTable, ResidueRegistry};
    use restime::core::io::open_trajectory;

    let elements = ElementTable::builtin();
    let residues = ResidueRegistry::builtin();
    let resolver = ElementResolver::new(&elements, &residues);
    let reader = open_trajectory(input, &resolver).map_err(restime::analysis::AnalysisError::from)?;

    let end = end.min(reader.frame_count());
    if begin >= end {
        return Err(CliError::InvalidArgument(format!(
            "frame range {}.. starts past the trajectory's {} frames",
            begin,
            reader.frame_count()
        )));
    }
    Ok((begin..end).step_by(stride).collect())
}

/// Writes the occupancy matrix as CSV: one row per molecule, labelled by
/// residue id, one column per scanned frame.
fn write_matrix(path: &Path, matrix: &OccupancyMatrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["residue_id".to_string()];
    header.extend(matrix.frames().iter().map(|f| format!("frame_{}", f)));
    writer.write_record(&header)?;

    for (group, residue_id) in matrix.residue_ids().iter().enumerate() {
        let mut row = vec![residue_id.to_string()];
        row.extend(
            matrix
                .group_row(group)
                .into_iter()
                .map(|count| count.to_string()),
        );
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
