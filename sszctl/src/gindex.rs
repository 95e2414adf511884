// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use clap::Args;
use sszkit::{SszError, get_generalized_index};

use crate::{CliError, TypeArg, parse_path};

#[derive(Debug, Args)]
pub struct Options {
    #[command(flatten)]
    pub ty: TypeArg,

    /// Path items: field names, element indices or `__len__`, separated by
    /// spaces or dots. No items names the root.
    #[arg(value_name = "PATH")]
    pub path: Vec<String>,
}

pub(super) fn run(opts: &Options) -> Result<(), CliError> {
    let path = parse_path(&opts.path);
    let gindex = get_generalized_index(&opts.ty.ty, &path).map_err(SszError::from)?;
    println!("{gindex}");
    Ok(())
}
