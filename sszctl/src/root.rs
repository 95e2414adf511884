// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use clap::Args;
use sszkit::{SszError, TreeValue};

use crate::{CliError, EncodedInput, TypeArg};

#[derive(Debug, Args)]
pub struct Options {
    #[command(flatten)]
    pub ty: TypeArg,

    #[command(flatten)]
    pub encoded: EncodedInput,

    /// Leave the last field of a container out of the root
    #[arg(long)]
    pub signing: bool,
}

pub(super) fn run(opts: &Options) -> Result<(), CliError> {
    log::debug!("root {opts:?}");
    let ty = &opts.ty.ty;
    let data = opts.encoded.read()?;
    let root = if opts.signing {
        let value = ty.deserialize(&data).map_err(SszError::from)?;
        sszkit::signing_root(&value, ty).map_err(SszError::from)?
    } else {
        TreeValue::deserialize(ty.clone(), &data)?.hash_tree_root()
    };
    println!("{root}");
    Ok(())
}
