use super::load_reference;
use crate::cli::BondsArgs;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use restime::analysis::progress::ProgressReporter;
use restime::workflows::bonds::{BondsConfig, run as run_bonds};
use std::collections::BTreeSet;
use tracing::info;

pub fn run(args: BondsArgs) -> Result<()> {
    let (elements, residues) = load_reference(&args.reference)?;

    let config = BondsConfig {
        trajectory: args.input.clone(),
        frame: args.frame,
        tolerance: args.tolerance,
    };

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let result = run_bonds(&config, &elements, &residues, &reporter)?;

    let pair_count = result.bonds.values().map(BTreeSet::len).sum::<usize>() / 2;
    info!(
        "Frame {}: {} bonded pairs, {} molecules.",
        args.frame,
        pair_count,
        result.molecules.len()
    );

    match &args.output {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(["atom_i", "atom_j"])?;
            for (&i, partners) in &result.bonds {
                for &j in partners {
                    if i < j {
                        writer.write_record([i.to_string(), j.to_string()])?;
                    }
                }
            }
            writer.flush()?;
            println!("wrote {} bond pairs to {}", pair_count, path.display());
        }
        None => {
            println!("frame:     {}", args.frame);
            println!("bonds:     {}", pair_count);
            println!("molecules: {}", result.molecules.len());
        }
    }

    Ok(())
}
