//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use ursparse_core::constants::{DEFAULT_BLOCK_SIZE, MIN_BLOCK_SIZE};

/// Helper utility to encode/decode sparse files to/from ursparse format.
#[derive(Debug, Parser)]
#[command(name = "ursparse", version, about)]
#[command(group(ArgGroup::new("mode").args(["map", "decode", "encode"])))]
pub struct Cli {
    /// Show the map of data extents of a sparse input file
    #[arg(short = 'm', long)]
    pub map: bool,

    /// Read ursparse input and write a sparse file (default)
    #[arg(short = 'u', long, visible_alias = "ursparse")]
    pub decode: bool,

    /// Read a sparse input file and write ursparse format
    #[arg(short = 's', long, visible_alias = "sparse")]
    pub encode: bool,

    /// Block size in bytes for reading ursparse input
    #[arg(
        short = 'b',
        long = "block-size",
        visible_alias = "blocksize",
        value_name = "SIZE",
        env = "URSPARSE_BLOCK_SIZE",
        default_value_t = DEFAULT_BLOCK_SIZE as u64,
        value_parser = clap::value_parser!(u64).range(MIN_BLOCK_SIZE as u64..)
    )]
    pub block_size: u64,

    /// Read from this file instead of standard input
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Write to this file instead of standard output
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print a JSON run summary to standard error
    #[arg(long)]
    pub stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Map,
    Decode,
    Encode,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.map {
            Mode::Map
        } else if self.encode {
            Mode::Encode
        } else {
            Mode::Decode
        }
    }
}
