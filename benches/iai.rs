// (c) Copyright 2025 Helsing GmbH. All rights reserved.
#![cfg_attr(not(target_os = "linux"), allow(dead_code, unused_imports))]

use iai_callgrind::{library_benchmark, library_benchmark_group, main};
use pendwrite::{
    model::{Document, DocumentKey, FieldPath, FieldValue, MaybeDocument, ObjectValue},
    mutation::{FieldTransform, MutationResult, TransformMutation, TransformOperation},
    timestamp::{SnapshotVersion, Timestamp},
};
use std::hint::black_box;

fn key() -> DocumentKey {
    "bench/doc".parse().expect("valid key")
}

fn field(i: usize) -> FieldPath {
    FieldPath::from_segments(["fields".to_string(), format!("f{i}")]).expect("valid path")
}

fn setup(fields: usize, transforms: usize) -> (MaybeDocument, TransformMutation, MutationResult) {
    pendwrite::enable_determinism();

    let data = (0..fields).fold(ObjectValue::empty(), |data, i| {
        data.set(&field(i), FieldValue::Integer(i as i64))
    });
    let doc = Document::new(key(), SnapshotVersion::NONE, data, false).into();
    let mutation = TransformMutation::new(
        key(),
        (0..transforms)
            .map(|i| FieldTransform::new(field(i % fields), TransformOperation::ServerTimestamp))
            .collect(),
    );
    let result = MutationResult::with_transform_results(
        SnapshotVersion::new(Timestamp::EPOCH),
        vec![FieldValue::Timestamp(Timestamp::EPOCH); transforms],
    );
    (doc, mutation, result)
}

#[library_benchmark]
#[bench::small(setup(16, 4))]
#[bench::medium(setup(255, 16))]
fn transform_local((doc, mutation, _): (MaybeDocument, TransformMutation, MutationResult)) {
    let doc = black_box(doc);
    black_box(mutation.apply_to_local_view(Some(&doc), Some(&doc), Timestamp::EPOCH));
}

#[library_benchmark]
#[bench::small(setup(16, 4))]
#[bench::medium(setup(255, 16))]
fn transform_remote((doc, mutation, result): (MaybeDocument, TransformMutation, MutationResult)) {
    let doc = black_box(doc);
    black_box(mutation.apply_to_remote_document(Some(&doc), &result));
}

library_benchmark_group!(
    name = transforms;
    benchmarks = transform_local, transform_remote
);

#[cfg(target_os = "linux")]
main!(library_benchmark_groups = transforms);

#[cfg(not(target_os = "linux"))]
fn main() {}
