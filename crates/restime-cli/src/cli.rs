use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The restime developers",
    version,
    about = "restime - residence-time and connectivity analysis for molecular-dynamics trajectories.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show atom and frame counts plus the parsed metadata of a trajectory.
    Info(InfoArgs),
    /// Infer covalent bonds for one frame from geometry alone.
    Bonds(BondsArgs),
    /// Scan the trajectory for molecules residing within a shell around a
    /// reference atom and export the occupancy matrix.
    Scan(ScanArgs),
}

/// Options shared by every command that loads reference data.
#[derive(Args, Debug, Clone)]
pub struct ReferenceArgs {
    /// Replace the built-in element table with a CSV file
    /// (symbol,covalent_radius,vdw_radius,color).
    #[arg(long, value_name = "PATH")]
    pub elements: Option<PathBuf>,

    /// Replace the built-in standard-residue registry with a TOML file
    /// (residues = ["ALA", ...]).
    #[arg(long, value_name = "PATH")]
    pub residues: Option<PathBuf>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the trajectory file (.gro or .pdb).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,
}

/// Arguments for the `bonds` subcommand.
#[derive(Args, Debug)]
pub struct BondsArgs {
    /// Path to the trajectory file (.gro or .pdb).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Frame to analyze.
    #[arg(short, long, default_value_t = 0, value_name = "INT")]
    pub frame: usize,

    /// Distance slack added to the summed covalent radii.
    #[arg(short, long, default_value_t = 0.1, value_name = "FLOAT")]
    pub tolerance: f64,

    /// Write the bond list as CSV to this path instead of summarizing.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub reference: ReferenceArgs,
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the trajectory file (.gro or .pdb).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the occupancy matrix CSV output.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Sequential index of the reference atom at the shell center.
    #[arg(short, long, required = true, value_name = "INT")]
    pub center: usize,

    /// Shell radius around the reference atom.
    #[arg(short, long, required = true, value_name = "FLOAT")]
    pub radius: f64,

    /// Residue names of the target species, comma-separated (e.g. SOL).
    #[arg(long, required = true, value_delimiter = ',', value_name = "NAMES")]
    pub target_residues: Vec<String>,

    /// Atom names scanned within each molecule, comma-separated (e.g. OW).
    #[arg(long, required = true, value_delimiter = ',', value_name = "NAMES")]
    pub target_atoms: Vec<String>,

    /// First frame to scan.
    #[arg(long, default_value_t = 0, value_name = "INT")]
    pub begin: usize,

    /// One past the last frame to scan; defaults to the trajectory length.
    #[arg(long, value_name = "INT")]
    pub end: Option<usize>,

    /// Scan every n-th frame.
    #[arg(long, default_value_t = 1, value_name = "INT")]
    pub stride: usize,

    #[command(flatten)]
    pub reference: ReferenceArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_arguments_parse_with_comma_separated_lists() {
        let cli = Cli::parse_from([
            "restime",
            "scan",
            "-i",
            "traj.gro",
            "-o",
            "out.csv",
            "-c",
            "12",
            "-r",
            "4.5",
            "--target-residues",
            "SOL,WAT",
            "--target-atoms",
            "OW",
        ]);

        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.center, 12);
                assert_eq!(args.radius, 4.5);
                assert_eq!(args.target_residues, vec!["SOL", "WAT"]);
                assert_eq!(args.target_atoms, vec!["OW"]);
                assert_eq!(args.begin, 0);
                assert_eq!(args.end, None);
                assert_eq!(args.stride, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["restime", "-v", "-q", "info", "-i", "x.gro"]).is_err());
    }

    #[test]
    fn cli_asserts_its_own_invariants() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
