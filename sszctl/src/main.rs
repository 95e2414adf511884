// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sszkit::{GeneralizedIndexError, InvalidChunkLength, PathItem, SszError, SszType};

pub mod decode;
pub mod encode;
pub mod gindex;
pub mod prove;
pub mod root;
pub mod verify;

#[derive(Parser)]
#[command(name = "sszctl", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(
        long,
        short = 'l',
        required = false,
        help = "Log level. Respects RUST_LOG.",
        value_name = "LOG_LEVEL",
        num_args = 1,
        value_parser = ["trace", "debug", "info", "warn", "error"],
        default_value_t = String::from("warn"),
    )]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an encoding and print it as JSON
    Decode(decode::Options),
    /// Encode a JSON value and print the hex encoding
    Encode(encode::Options),
    /// Print the hash tree root of an encoding
    Root(root::Options),
    /// Print the generalized index of a path
    Gindex(gindex::Options),
    /// Prove paths of an encoded value and print the multiproof as JSON
    Prove(prove::Options),
    /// Check a multiproof printed by `prove`
    Verify(verify::Options),
}

/// The type every subcommand works on.
#[derive(Debug, Args)]
pub struct TypeArg {
    /// Type expression, for example `container{slot:uint64,roots:list[bytes[32],64]}`
    #[arg(long = "type", short = 't', required = true, value_name = "TYPE")]
    pub ty: SszType,
}

/// An encoding given inline as hex or read raw from a file.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct EncodedInput {
    /// The encoding as hex, with or without a `0x` prefix
    #[arg(value_name = "HEX")]
    pub hex: Option<String>,

    /// Read the raw encoding from a file
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
}

impl EncodedInput {
    pub fn read(&self) -> Result<Vec<u8>, CliError> {
        match (&self.hex, &self.input) {
            (Some(hex), _) => parse_hex(hex),
            (None, Some(path)) => read_file(path),
            (None, None) => Err(CliError::MissingInput),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Ssz(#[from] SszError),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid generalized index: {0}")]
    Gindex(#[from] GeneralizedIndexError),
    #[error("invalid chunk: {0}")]
    Chunk(#[from] InvalidChunkLength),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed proof: {0}")]
    Proof(String),
    #[error("no input given")]
    MissingInput,
}

pub fn parse_hex(text: &str) -> Result<Vec<u8>, CliError> {
    let text = text.trim();
    Ok(hex::decode(text.strip_prefix("0x").unwrap_or(text))?)
}

pub fn read_file(path: &PathBuf) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })
}

/// Splits dotted paths, so `a.3.b` and `a 3 b` name the same node.
pub fn parse_path<S: AsRef<str>>(parts: &[S]) -> Vec<PathItem> {
    parts
        .iter()
        .flat_map(|part| part.as_ref().split('.'))
        .filter(|item| !item.is_empty())
        .map(PathItem::from)
        .collect()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::init_from_env(
        env_logger::Env::default()
            .filter_or(env_logger::DEFAULT_FILTER_ENV, cli.log_level.as_str()),
    );
    sszkit::registry::register();

    let result = match &cli.command {
        Commands::Decode(opts) => decode::run(opts),
        Commands::Encode(opts) => encode::run(opts),
        Commands::Root(opts) => root::run(opts),
        Commands::Gindex(opts) => gindex::run(opts),
        Commands::Prove(opts) => prove::run(opts),
        Commands::Verify(opts) => verify::run(opts),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
