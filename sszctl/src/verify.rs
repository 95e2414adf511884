// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::path::PathBuf;

use clap::Args;
use sszkit::SszError;

use crate::prove::proof_from_json;
use crate::{CliError, parse_hex, read_file};

#[derive(Debug, Args)]
pub struct Options {
    /// A proof file as printed by `prove`
    #[arg(required = true, value_name = "FILE")]
    pub proof: PathBuf,

    /// Check against this root instead of the one in the file
    #[arg(long, short = 'r', value_name = "ROOT")]
    pub root: Option<String>,
}

pub(super) fn run(opts: &Options) -> Result<(), CliError> {
    let json = serde_json::from_slice(&read_file(&opts.proof)?)?;
    let (claimed, proof) = proof_from_json(&json)?;
    let root = match &opts.root {
        Some(root) => sszkit::Chunk::try_from(parse_hex(root)?.as_slice())?,
        None => claimed,
    };
    proof.verify(&root).map_err(SszError::from)?;
    println!("proof of {} nodes verifies against {root}", proof.gindices.len());
    Ok(())
}
