//! ursparse: convert sparse files to and from the ursparse transfer format.

mod args;
mod logging;

use std::fs::{File, OpenOptions};
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};

use ursparse_core::prelude::*;
use ursparse_core::transfer::io::{open_output, OutputTarget};

use crate::args::{Cli, Mode};

const EXIT_RUN_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("ursparse: could not initialize logging: {e:#}");
    }

    match run(&cli) {
        Ok(snapshot) => {
            if cli.stats {
                print_stats(&snapshot);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "run failed");
            eprintln!("ursparse: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: &Cli) -> Result<TelemetrySnapshot> {
    let block_size = usize::try_from(cli.block_size).context("block size does not fit in memory")?;
    let config = ApiConfig::new(Some(block_size));
    config.validate()?;

    let mode = cli.mode();
    debug!(?mode, block_size, "starting");

    match mode {
        Mode::Decode => decode(cli, &config),
        Mode::Encode | Mode::Map => scan(cli, mode),
    }
}

fn decode(cli: &Cli, config: &ApiConfig) -> Result<TelemetrySnapshot> {
    let input = match &cli.input {
        Some(path) => InputSource::File(path.clone()),
        None => InputSource::Reader(Box::new(io::stdin())),
    };

    let target = match &cli.output {
        Some(path) => OutputTarget::File(path.clone()),
        None => stdout_target()?,
    };

    let mut sink = open_output(target)?;
    let snapshot = decode_stream(input, &mut sink, config)?;
    Ok(snapshot)
}

fn scan(cli: &Cli, mode: Mode) -> Result<TelemetrySnapshot> {
    let file = match &cli.input {
        Some(path) => File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        None => stdin_file().context("standard input must be a regular file")?,
    };
    let mut source = FileSource::from_file(file);

    let mut out = match &cli.output {
        Some(path) => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("cannot create {}", path.display()))?,
        None => stdout_file()?,
    };

    let snapshot = match mode {
        Mode::Map => map_sparse(&mut source, &mut out)?,
        _ => encode_sparse(&mut source, &mut out)?,
    };
    Ok(snapshot)
}

fn print_stats(snapshot: &TelemetrySnapshot) {
    match snapshot.to_json() {
        Ok(json) => eprintln!("{json}"),
        Err(e) => error!(error = %e, "could not serialize stats"),
    }
}

/// 2 for bad configuration, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StreamError>() {
        Some(StreamError::Validation(_)) => EXIT_CONFIG,
        _ => EXIT_RUN_FAILURE,
    }
}

// Standard streams as owned files, so encode gets hole lookups and the
// kernel copy path, and decode can seek when stdout is a regular file.

#[cfg(unix)]
fn stdin_file() -> io::Result<File> {
    use std::os::fd::AsFd;
    Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?))
}

#[cfg(unix)]
fn stdout_file() -> io::Result<File> {
    use std::os::fd::AsFd;
    Ok(File::from(io::stdout().as_fd().try_clone_to_owned()?))
}

#[cfg(unix)]
fn stdout_target() -> io::Result<OutputTarget> {
    Ok(OutputTarget::Handle(stdout_file()?))
}

#[cfg(not(unix))]
fn stdin_file() -> io::Result<File> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "use --input on this platform"))
}

#[cfg(not(unix))]
fn stdout_file() -> io::Result<File> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "use --output on this platform"))
}

#[cfg(not(unix))]
fn stdout_target() -> io::Result<OutputTarget> {
    Ok(OutputTarget::Writer(Box::new(io::stdout())))
}
