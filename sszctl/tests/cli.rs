// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

#![expect(clippy::unwrap_used)]

use predicates::prelude::*;
use std::fs;

const PRG: &str = "sszctl";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const CHECKPOINT: &str = "container{epoch:uint64,root:bytes[4]}";
const CHECKPOINT_HEX: &str = "0x0300000000000000deadbeef";

macro_rules! cargo_bin_cmd {
    () => {
        ::assert_cmd::cargo::cargo_bin_cmd!("sszctl")
    };
}

#[test]
fn sszctl_prints_version() {
    let expected_version_output: String = format!("{PRG} {VERSION}");

    cargo_bin_cmd!()
        .args(["-V"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected_version_output));
}

#[test]
fn sszctl_encodes_json() {
    cargo_bin_cmd!()
        .arg("encode")
        .args(["--type", CHECKPOINT])
        .arg(r#"{"epoch": "3", "root": "0xdeadbeef"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(CHECKPOINT_HEX));
}

#[test]
fn sszctl_decodes_hex() {
    cargo_bin_cmd!()
        .arg("decode")
        .args(["--type", CHECKPOINT])
        .arg("--compact")
        .arg(CHECKPOINT_HEX)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""epoch":"3""#))
        .stdout(predicate::str::contains(r#""root":"0xdeadbeef""#));
}

#[test]
fn sszctl_decodes_file() {
    let tmpdir = tempfile::tempdir().unwrap();
    let path = tmpdir.path().join("list.ssz");
    fs::write(&path, [1u8, 2, 3]).unwrap();

    cargo_bin_cmd!()
        .arg("decode")
        .args(["--type", "list[uint8,4]"])
        .arg("--input")
        .arg(&path)
        .arg("-c")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1,2,3]"));
}

#[test]
fn sszctl_root_of_basic_value() {
    cargo_bin_cmd!()
        .arg("root")
        .args(["--type", "uint16"])
        .arg("0x0100")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0x0100000000000000000000000000000000000000000000000000000000000000",
        ));
}

#[test]
fn sszctl_signing_root_skips_last_field() {
    // the signing root of a two field container is the root of the first field
    cargo_bin_cmd!()
        .arg("root")
        .args(["--type", CHECKPOINT])
        .arg("--signing")
        .arg(CHECKPOINT_HEX)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0x0300000000000000000000000000000000000000000000000000000000000000",
        ));
}

#[test]
fn sszctl_gindex_of_path() {
    let ty = "container{a:uint64,b:list[uint64,1024]}";

    cargo_bin_cmd!()
        .arg("gindex")
        .args(["--type", ty])
        .args(["b", "__len__"])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));

    // element 5 sits in chunk 1 of the data subtree at depth 8 below 3 * 2
    cargo_bin_cmd!()
        .arg("gindex")
        .args(["--type", ty])
        .arg("b.5")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", (6u64 << 8) + 1)));
}

#[test]
fn sszctl_proves_and_verifies() {
    let tmpdir = tempfile::tempdir().unwrap();
    let proof_path = tmpdir.path().join("proof.json");

    let output = cargo_bin_cmd!()
        .arg("prove")
        .args(["--type", CHECKPOINT])
        .arg(CHECKPOINT_HEX)
        .args(["--path", "epoch", "--path", "root"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gindices\""))
        .get_output()
        .stdout
        .clone();
    fs::write(&proof_path, output).unwrap();

    cargo_bin_cmd!()
        .arg("verify")
        .arg(&proof_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("verifies"));

    cargo_bin_cmd!()
        .arg("verify")
        .arg(&proof_path)
        .args(["--root", &format!("0x{}", "00".repeat(32))])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn sszctl_rejects_malformed_input() {
    cargo_bin_cmd!()
        .arg("decode")
        .args(["--type", "bitlist[8]"])
        .arg("0x00")
        .assert()
        .failure()
        .stderr(predicate::str::contains("length marker"));

    cargo_bin_cmd!()
        .arg("decode")
        .args(["--type", "list[uint8"])
        .arg("0x00")
        .assert()
        .failure();

    cargo_bin_cmd!()
        .arg("encode")
        .args(["--type", "uint8"])
        .arg("300")
        .assert()
        .failure();

    cargo_bin_cmd!()
        .arg("gindex")
        .args(["--type", CHECKPOINT])
        .arg("missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}
