//! Command-line driver for avalanche simulation runs.
//!
//! The driver reads drift-stage events from a record file, simulates the
//! avalanche of every seed electron with the microscopic transport engine, and
//! writes one avalanche record per event.

pub mod settings;
pub mod setup;

use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::{Context, Result, bail};
use avalanche_core::Observer;
use avalanche_observers::{EventLimit, ProgressLogger};
use avalanche_pipeline::{
    AvalancheRow, DriftRow, RecordWriter, read_records,
    run::{self, Execution},
};
use clap::Parser;

use crate::settings::Settings;

/// Title of the avalanche tree in output files.
pub const OUTPUT_TITLE: &str = "Avalanches";

/// Simulate electron avalanches for drift-stage seed electrons.
#[derive(Debug, Clone, Parser)]
#[command(name = "avalanche", version, about, long_about = None)]
pub struct Args {
    /// Input drift file and output avalanche file; both or neither.
    #[arg(value_name = "PATH", num_args = 0..=2)]
    pub paths: Vec<PathBuf>,

    /// Settings file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Simulate the seed electrons of each event in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Seed of the transport engine's random streams
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Stop after writing this many events (at least one)
    #[arg(long, value_name = "N")]
    pub max_events: Option<NonZeroUsize>,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Input and output record files of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Picks the record files from the arguments, or from the settings when no
/// paths are given.
///
/// # Errors
///
/// Returns an error if exactly one path is given.
pub fn resolve_paths(args: &Args, settings: &Settings) -> Result<Paths> {
    match args.paths.as_slice() {
        [] => Ok(Paths {
            input: settings.amplification.in_filename.clone(),
            output: settings.amplification.out_filename.clone(),
        }),
        [input, output] => Ok(Paths {
            input: input.clone(),
            output: output.clone(),
        }),
        [only] => bail!(
            "expected an input and an output file, got only {}",
            only.display()
        ),
        _ => bail!("expected at most two paths, got {}", args.paths.len()),
    }
}

/// Runs the simulation described by `args`.
///
/// # Errors
///
/// Returns an error if the settings, paths, input file, or simulation setup
/// are invalid, or if the output cannot be written. No output file is left
/// behind on error.
pub fn execute(args: &Args) -> Result<run::Solution> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.engine.seed = seed;
    }
    if args.parallel {
        settings.run.parallel = true;
    }

    let paths = resolve_paths(args, &settings)?;

    let events = read_records::<DriftRow>(&paths.input)
        .with_context(|| format!("failed to open input {}", paths.input.display()))?
        .rows;
    log::info!(
        "read {} events from {}",
        events.len(),
        paths.input.display()
    );

    let engine = setup::engine(&settings)?;

    let execution = if settings.run.parallel {
        Execution::Parallel
    } else {
        Execution::Sequential
    };
    let config = run::Config::new(settings.amplification.region().start_height())
        .with_start_height(settings.amplification.start_height)
        .with_execution(execution);

    let mut writer = RecordWriter::<AvalancheRow>::create(&paths.output, OUTPUT_TITLE)
        .with_context(|| format!("failed to create output {}", paths.output.display()))?;

    let mut progress = ProgressLogger::default();
    let mut limit = args.max_events.map(EventLimit::new);
    let observer = |event: &run::Event| -> Option<run::Action> {
        let _: Option<run::Action> = progress.observe(event);
        limit.as_mut().and_then(|limit| limit.observe(event))
    };

    let solution = run::run(&engine, &events, &config, &mut writer, observer)
        .context("simulation failed")?;
    writer
        .finish()
        .with_context(|| format!("failed to write output {}", paths.output.display()))?;

    log::info!(
        "wrote {} events ({} seed electrons, {} endpoints) to {}",
        solution.events,
        solution.seeds,
        solution.endpoints,
        paths.output.display()
    );
    if solution.truncated_avalanches > 0 {
        log::warn!(
            "{} avalanches reached the size limit of {} electrons",
            solution.truncated_avalanches,
            settings.amplification.max_avalanche_size
        );
    }
    if solution.status != run::Status::Complete {
        log::info!("run ended early: {:?}", solution.status);
    }

    Ok(solution)
}
