// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::path::PathBuf;

use clap::Args;
use sszkit::SszError;

use crate::{CliError, TypeArg, read_file};

#[derive(Debug, Args)]
pub struct Options {
    #[command(flatten)]
    pub ty: TypeArg,

    #[command(flatten)]
    pub value: JsonInput,
}

/// A JSON value given inline or read from a file.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct JsonInput {
    /// The value as JSON
    #[arg(value_name = "JSON")]
    pub json: Option<String>,

    /// Read the JSON value from a file
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
}

pub(super) fn run(opts: &Options) -> Result<(), CliError> {
    log::debug!("encode {opts:?}");
    let text = match (&opts.value.json, &opts.value.input) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => String::from_utf8_lossy(&read_file(path)?).into_owned(),
        (None, None) => return Err(CliError::MissingInput),
    };
    let ty = &opts.ty.ty;
    let value = ty.from_json_str(&text).map_err(SszError::from)?;
    let encoded = ty.serialize(&value).map_err(SszError::from)?;
    println!("0x{}", hex::encode(encoded));
    Ok(())
}
