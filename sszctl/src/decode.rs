// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use clap::Args;
use sszkit::SszError;

use crate::{CliError, EncodedInput, TypeArg};

#[derive(Debug, Args)]
pub struct Options {
    #[command(flatten)]
    pub ty: TypeArg,

    #[command(flatten)]
    pub encoded: EncodedInput,

    /// Print the JSON on a single line
    #[arg(long, short = 'c')]
    pub compact: bool,
}

pub(super) fn run(opts: &Options) -> Result<(), CliError> {
    log::debug!("decode {opts:?}");
    let ty = &opts.ty.ty;
    let value = ty.deserialize(&opts.encoded.read()?).map_err(SszError::from)?;
    let json = ty.to_json(&value).map_err(SszError::from)?;
    if opts.compact {
        println!("{json}");
    } else {
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(())
}
