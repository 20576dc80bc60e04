mod cli;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use cli::{Cli, Command, ExtractArgs, PreprocessArgs};
use sensor_prep::data::filter::{select, Selection};
use sensor_prep::data::store::{load_unified_table, save_unified_table};
use sensor_prep::{merge_experiments, Manifest, PreprocessConfig, Preprocessor};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Extract(args) => extract(args),
        Command::Preprocess(args) => preprocess(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn extract(args: ExtractArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("loading manifest {}", args.manifest.display()))?;
    let table = merge_experiments(&manifest, args.experiment.as_deref())?;
    save_unified_table(&table, &args.output)?;
    println!(
        "Saved {} samples to {}",
        table.len(),
        args.output.display()
    );
    Ok(())
}

fn preprocess(args: PreprocessArgs) -> Result<()> {
    let (table, mut config) = match (&args.manifest, &args.table) {
        (Some(path), _) => {
            let manifest = Manifest::load(path)
                .with_context(|| format!("loading manifest {}", path.display()))?;
            let table = merge_experiments(&manifest, args.experiment.as_deref())?;
            (table, manifest.preprocessing)
        }
        (None, Some(path)) => {
            let table = load_unified_table(path)
                .with_context(|| format!("loading table {}", path.display()))?;
            let table = match &args.experiment {
                Some(name) => select(&table, &Selection::experiment(name)),
                None => table,
            };
            (table, PreprocessConfig::default())
        }
        (None, None) => bail!("either --manifest or --table is required"),
    };

    if let Some(ms) = args.window_length_ms {
        config.window_length_ms = ms;
    }
    if let Some(hz) = args.cutoff_hz {
        config.cutoff_hz = hz;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let preprocessor = Preprocessor::new(&config).context("invalid preprocessing settings")?;
    let summary = preprocessor.run(&table);
    println!(
        "Preprocessed {} measurement(s) into {}",
        summary.written.len(),
        preprocessor.output_dir().display()
    );

    if !summary.is_success() {
        bail!("{} measurement(s) failed", summary.failed.len());
    }
    Ok(())
}
