mod args;
mod dataset;
mod view;

use clap::Parser;
use log::{debug, info};
use std::error::Error;

use crate::args::{Args, Command};
use crate::dataset::config_reader::{read_config, DataConfig};
use crate::dataset::*;

use election_data::ValidationMode;

/// The configuration file, then the command line options on top of it.
fn build_config(args: &Args) -> AppResult<DataConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => DataConfig::default(),
    };
    if let Some(data_dir) = &args.data_dir {
        config.data_directory = data_dir.clone();
    }
    if let Some(min_year) = args.min_year {
        config.min_year = min_year;
    }
    if let Some(max_year) = args.max_year {
        config.max_year = max_year;
    }
    if args.no_validation {
        config.validation = ValidationMode::Skip;
    }
    debug!("build_config: {:?}", config);
    Ok(config)
}

fn run(args: Args) -> AppResult<()> {
    let config = build_config(&args)?;
    let ds = load_dataset(&config)?;
    info!(
        "run: loaded {} years from {}",
        ds.election_data.len(),
        config.data_directory
    );
    match args.command {
        Command::Validate => run_validate(&ds),
        Command::Summary {
            year,
            relative,
            view,
        } => run_summary(&ds, year, relative, view),
        Command::State { code, relative } => run_state(&ds, &code, relative),
        Command::MinVotes { out, reference } => run_min_votes(&ds, out, reference),
        Command::Export { out } => run_export(&ds, out),
    }
}

/// `info` unless the environment says otherwise. `--verbose` wins over
/// the environment.
fn logger_builder(env: env_logger::Env, verbose: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_env(env.default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
}

fn main() {
    let args = Args::parse();

    logger_builder(env_logger::Env::default(), args.verbose).init();
    debug!("main: args {:?}", args);

    if let Err(e) = run(args) {
        eprintln!("An error occured: {}", e);
        let mut cause = e.source();
        while let Some(c) = cause {
            eprintln!("  caused by: {}", c);
            cause = c.source();
        }
        std::process::exit(1);
    }
}
