use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sensor-prep",
    version,
    about = "Merge sensor recordings and cut them into filtered, normalized windows",
    long_about = "Reads a JSON manifest of experiments (csv, tsv and parquet recordings),\n\
                  merges them onto one 10 kHz time axis and writes one CSV of\n\
                  low-pass filtered, min-max normalized windows per measurement."
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
    /// Merge the manifest's recordings and save the unified table
    Extract(ExtractArgs),
    /// Window, filter, normalize and save every measurement
    Preprocess(PreprocessArgs),
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Experiment manifest (JSON)
    #[arg(long, env = "SENSOR_PREP_MANIFEST")]
    pub manifest: PathBuf,

    /// Only load this experiment
    #[arg(long)]
    pub experiment: Option<String>,

    /// Output CSV for the unified table
    #[arg(short, long, default_value = ".data/full_dataframe.csv")]
    pub output: PathBuf,
}

#[derive(Args)]
#[command(group(ArgGroup::new("input").required(true).args(["manifest", "table"])))]
pub struct PreprocessArgs {
    /// Experiment manifest (JSON); recordings are merged first
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Unified table previously written by `extract`
    #[arg(long)]
    pub table: Option<PathBuf>,

    /// Only process this experiment
    #[arg(long)]
    pub experiment: Option<String>,

    /// Window length in milliseconds
    #[arg(long)]
    pub window_length_ms: Option<u32>,

    /// Low-pass cutoff in Hz (recorded only; filtering uses 40 Hz)
    #[arg(long)]
    pub cutoff_hz: Option<f64>,

    /// Directory for the per-measurement CSV files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}
