// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

#![expect(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Barrier;
use std::thread;

use sszkit::{SszType, TreeValue, Value};
use sszkit_tree::{MAX_ZERO_DEPTH, zero_hash, zero_node};

const THREADS: usize = 8;

#[test]
fn zero_tables_are_shared_across_threads() {
    let barrier = Barrier::new(THREADS);
    let tables: Vec<Vec<_>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    (0..=MAX_ZERO_DEPTH)
                        .rev()
                        .map(|depth| (zero_hash(depth), zero_node(depth).root()))
                        .collect()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for table in &tables {
        assert_eq!(table, &tables[0]);
        for (hash, root) in table {
            assert_eq!(hash, root);
        }
    }
}

#[test]
fn shared_tree_hashes_once_per_node() {
    let ty: SszType = "list[container{a:uint64,b:bytes[32]},65536]".parse().unwrap();
    let value = Value::List(
        (0..512u64)
            .map(|i| {
                Value::container([
                    ("a", Value::Uint(i)),
                    ("b", Value::Bytes(i.to_le_bytes().repeat(4))),
                ])
            })
            .collect(),
    );
    let expected = ty.hash_tree_root(&value).unwrap();
    let tree = TreeValue::from_value(ty, &value).unwrap();
    let branch = tree.node().as_branch().unwrap();
    assert!(!branch.is_hashed());

    let barrier = Barrier::new(THREADS);
    let roots: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let tree = tree.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    tree.hash_tree_root()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(roots.iter().all(|root| *root == expected));
    assert!(branch.is_hashed());
}

#[test]
fn updates_on_other_threads_leave_the_original_alone() {
    let ty: SszType = "vector[uint64,1024]".parse().unwrap();
    let tree = TreeValue::default_for(ty).unwrap();
    let original = tree.hash_tree_root();

    let updated: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS as u64)
            .map(|i| {
                let tree = tree.clone();
                scope.spawn(move || tree.set_index(i * 100, Value::Uint(i + 1)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(tree.hash_tree_root(), original);
    for (i, view) in updated.iter().enumerate() {
        let i = i as u64;
        assert_eq!(
            view.get_index(i * 100).unwrap().into_value().unwrap(),
            Value::Uint(i + 1)
        );
        assert_ne!(view.hash_tree_root(), original);
    }
}
