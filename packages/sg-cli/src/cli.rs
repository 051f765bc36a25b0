use clap::{Args, Parser, Subcommand};
use sg_rs::derivatives::FOLDER_DERIVATIVES;
use sg_rs::package::DEFAULT_ARCHIVE;

#[derive(Parser)]
#[command(
    name = "sg",
    version,
    about = "spine-generic dataset toolkit",
    long_about = "Resolve BIDS filenames, validate spine-generic datasets, and manage the \n\
                  derivatives/labels tree (copy, populate, manual correction, curation).\n\
                  Manual correction requires FSLeyes and the Spinal Cord Toolbox on PATH."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve subject, datatype and entities of BIDS filenames
    Parse(ParseArgs),
    /// Show version and external tool availability
    Info(InfoArgs),
    /// Check that a dataset follows the BIDS naming grammar
    Validate(ValidateArgs),
    /// Cross-check participants.tsv, subject folders and JSON sidecars
    CheckConsistency(ConsistencyArgs),
    /// Compare acquisition parameters against recommended values
    CheckParams(ParamsArgs),
    /// Copy files matching a suffix into the derivatives tree
    CopyToDerivatives(CopyArgs),
    /// Move a flat folder of corrected labels into the derivatives tree
    PopulateDerivatives(PopulateArgs),
    /// Open each file of a correction config in the appropriate editor
    ManualCorrection(ManualCorrectionArgs),
    /// Zip the files listed in a correction config
    PackageForCorrection(PackageArgs),
    /// Collect manual segmentations into a curated derivatives folder
    CurateDerivatives(CurateArgs),
}

#[derive(Args)]
pub struct ParseArgs {
    /// Filenames (or paths) to resolve
    #[arg(required = true, num_args = 1..)]
    pub filenames: Vec<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the BIDS dataset
    #[arg(long)]
    pub path_in: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Output file for the JSON report (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[derive(Args)]
pub struct ConsistencyArgs {
    /// Path to the BIDS dataset, which contains all the sub- folders
    #[arg(long)]
    pub path_in: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ParamsArgs {
    /// Path to the BIDS dataset, which contains all the sub- folders
    #[arg(long)]
    pub path_in: String,

    /// JSON file of recommended parameters (manufacturer -> model -> contrast)
    #[arg(long, env = "SG_SPECS")]
    pub specs: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct CopyArgs {
    /// Path to the processed data, which contains all the sub- folders
    #[arg(long)]
    pub path_in: String,

    /// Path to the BIDS dataset that receives the derivatives
    #[arg(long)]
    pub path_out: String,

    /// Suffix of the input files, as in sub-*<suffix>.nii.gz (e.g. _seg)
    #[arg(long, allow_hyphen_values = true)]
    pub suffix: String,

    /// Suffix appended to each copied file: sub-*<suffix><suffix-out>.nii.gz
    #[arg(long, allow_hyphen_values = true)]
    pub suffix_out: Option<String>,

    /// Derivatives folder, relative to --path-out
    #[arg(long, default_value = FOLDER_DERIVATIVES)]
    pub folder: String,

    /// Replace files that already exist in the derivatives tree
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[derive(Args)]
pub struct PopulateArgs {
    /// Flat folder of *.nii.gz files
    #[arg(long)]
    pub path_in: String,

    /// Path to the BIDS dataset
    #[arg(long)]
    pub path_dataset: String,

    /// Derivatives folder, relative to --path-dataset
    #[arg(long, default_value = FOLDER_DERIVATIVES)]
    pub folder: String,

    /// Replace files that already exist in the derivatives tree
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[derive(Args)]
pub struct ManualCorrectionArgs {
    /// YAML file listing the files to correct (FILES_SEG, FILES_GMSEG, FILES_LABEL, NAME)
    #[arg(long)]
    pub config: String,

    /// Path to the processed data
    #[arg(long, default_value = "./")]
    pub path_in: String,

    /// Path to the BIDS dataset where the corrected labels are written
    #[arg(long, default_value = "./")]
    pub path_out: String,

    /// Name of the rater, recorded in each JSON sidecar
    #[arg(long, env = "SG_RATER")]
    pub rater: Option<String>,

    /// Print the correction plan without launching any viewer
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Start from the automatic output even if a corrected file exists
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Output the plan as JSON (with --dry-run)
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct PackageArgs {
    /// YAML file listing the files to correct
    #[arg(long)]
    pub config: String,

    /// Path to the processed data
    #[arg(long, default_value = "./")]
    pub path_in: String,

    /// Output zip archive
    #[arg(short, long, default_value = DEFAULT_ARCHIVE)]
    pub output: String,
}

#[derive(Args)]
pub struct CurateArgs {
    /// Derivatives folder to curate (e.g. derivatives/labels/)
    #[arg(long)]
    pub path_in: String,

    /// Output folder for the curated derivatives
    #[arg(long)]
    pub path_out: String,

    /// Name of the rater, recorded in created JSON sidecars
    #[arg(long, env = "SG_RATER")]
    pub rater: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_copy_suffix_accepts_leading_underscore() {
        let cli = Cli::try_parse_from([
            "sg",
            "copy-to-derivatives",
            "--path-in",
            "in",
            "--path-out",
            "out",
            "--suffix",
            "_seg",
            "--suffix-out",
            "-manual",
        ])
        .unwrap();
        match cli.command {
            Command::CopyToDerivatives(args) => {
                assert_eq!(args.suffix, "_seg");
                assert_eq!(args.suffix_out.as_deref(), Some("-manual"));
                assert_eq!(args.folder, FOLDER_DERIVATIVES);
                assert!(!args.overwrite);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_global_verbose() {
        let cli = Cli::try_parse_from(["sg", "info", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
