// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use clap::Args;
use serde_json::{Value as Json, json};
use sszkit::{Chunk, GeneralizedIndex, Multiproof, Root, SszError, TreeValue};

use crate::{CliError, EncodedInput, TypeArg, parse_hex, parse_path};

#[derive(Debug, Args)]
pub struct Options {
    #[command(flatten)]
    pub ty: TypeArg,

    #[command(flatten)]
    pub encoded: EncodedInput,

    /// A dotted path to prove, for example `validators.3.balance`; repeat for
    /// a multiproof
    #[arg(long, short = 'p', required = true, value_name = "PATH")]
    pub path: Vec<String>,
}

pub(super) fn run(opts: &Options) -> Result<(), CliError> {
    log::debug!("prove {opts:?}");
    let tree = TreeValue::deserialize(opts.ty.ty.clone(), &opts.encoded.read()?)?;
    let paths: Vec<_> = opts
        .path
        .iter()
        .map(|path| parse_path(std::slice::from_ref(path)))
        .collect();
    let proof = tree.prove(paths.as_slice())?;
    let root = tree.hash_tree_root();
    proof.verify(&root).map_err(SszError::from)?;
    println!("{}", serde_json::to_string_pretty(&proof_to_json(&root, &proof))?);
    Ok(())
}

/// The JSON form of a proof. Gindices are decimal strings since they may not
/// fit in 64 bits.
pub fn proof_to_json(root: &Root, proof: &Multiproof) -> Json {
    json!({
        "root": root.to_string(),
        "gindices": proof.gindices.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "leaves": proof.leaves.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "witnesses": proof.witnesses.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn strings<'a>(json: &'a Json, key: &str) -> Result<Vec<&'a str>, CliError> {
    json.get(key)
        .and_then(Json::as_array)
        .ok_or_else(|| CliError::Proof(format!("expected an array at {key:?}")))?
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| CliError::Proof(format!("expected strings in {key:?}")))
        })
        .collect()
}

fn chunk(text: &str) -> Result<Chunk, CliError> {
    Ok(Chunk::try_from(parse_hex(text)?.as_slice())?)
}

/// Reads a proof written by [`proof_to_json`], returning the root it claims.
pub fn proof_from_json(json: &Json) -> Result<(Root, Multiproof), CliError> {
    let root = json
        .get("root")
        .and_then(Json::as_str)
        .ok_or_else(|| CliError::Proof("expected a string at \"root\"".to_owned()))?;
    let proof = Multiproof {
        gindices: strings(json, "gindices")?
            .into_iter()
            .map(str::parse::<GeneralizedIndex>)
            .collect::<Result<_, _>>()?,
        leaves: strings(json, "leaves")?
            .into_iter()
            .map(chunk)
            .collect::<Result<_, _>>()?,
        witnesses: strings(json, "witnesses")?
            .into_iter()
            .map(chunk)
            .collect::<Result<_, _>>()?,
    };
    Ok((chunk(root)?, proof))
}
