use pendwrite::{
    model::{Document, DocumentKey, FieldPath, FieldValue, MaybeDocument, ServerTimestampBehavior},
    mutation::{
        DeleteMutation, FieldMask, FieldTransform, Mutation, MutationBatch, MutationBatchResult,
        MutationResult, PatchMutation, Precondition, SetMutation, TransformMutation,
        TransformOperation,
    },
    object_value,
    timestamp::{SnapshotVersion, Timestamp},
};
use serde_json::json;

const WRITE_TIME: Timestamp = pendwrite::timestamp!(2024-09-10 18:00:00 Z);
const COMMIT_TIME: Timestamp = pendwrite::timestamp!(2024-09-10 18:00:01 Z);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn key(k: &str) -> DocumentKey {
    k.parse().unwrap()
}

fn path(p: &str) -> FieldPath {
    p.parse().unwrap()
}

/// A patch of `profile.score`, followed by the transforms that came with it.
fn update_with_transforms(key: &DocumentKey) -> Vec<Mutation> {
    vec![
        PatchMutation::new(
            key.clone(),
            object_value! { "profile" => { "score" => 3 } },
            FieldMask::new([path("profile.score")]),
            Precondition::exists(true),
        )
        .into(),
        TransformMutation::new(
            key.clone(),
            vec![
                FieldTransform::new(path("visits"), TransformOperation::increment(1)),
                FieldTransform::new(path("seen"), TransformOperation::ServerTimestamp),
                FieldTransform::new(
                    path("tags"),
                    TransformOperation::ArrayUnion(vec!["new".into()]),
                ),
            ],
        )
        .into(),
    ]
}

fn cached(key: &DocumentKey) -> MaybeDocument {
    Document::new(
        key.clone(),
        SnapshotVersion::new(WRITE_TIME),
        object_value! {
            "profile" => { "name" => "alice", "score" => 1 },
            "visits" => 41,
            "tags" => ["old"],
        },
        false,
    )
    .into()
}

#[test]
fn pending_batch_is_visible_locally() {
    init_tracing();
    let alice = key("users/alice");
    let batch = MutationBatch::new(1, WRITE_TIME, update_with_transforms(&alice));

    let view = batch.apply_to_local_view(&alice, Some(&cached(&alice))).unwrap();
    let doc = view.as_document().unwrap();
    assert!(doc.has_local_mutations());
    assert_eq!(doc.version(), SnapshotVersion::new(WRITE_TIME));
    assert_eq!(
        doc.to_json(ServerTimestampBehavior::None),
        json!({
            "profile": { "name": "alice", "score": 3 },
            "visits": 42,
            "seen": null,
            "tags": ["old", "new"],
        })
    );
}

#[test]
fn acknowledged_batch_replaces_estimates() {
    init_tracing();
    let alice = key("users/alice");
    let batch = MutationBatch::new(7, WRITE_TIME, update_with_transforms(&alice));
    let commit = SnapshotVersion::new(COMMIT_TIME);
    let result = MutationBatchResult::new(
        &batch,
        commit,
        vec![
            MutationResult::new(commit),
            MutationResult::with_transform_results(
                commit,
                vec![
                    FieldValue::Integer(50),
                    FieldValue::Timestamp(COMMIT_TIME),
                    FieldValue::Null,
                ],
            ),
        ],
    );
    assert_eq!(result.commit_version(), commit);

    let doc = batch
        .apply_to_remote_document(&alice, Some(&cached(&alice)), &result)
        .unwrap();
    assert_eq!(doc.version(), commit);
    assert!(!doc.has_pending_writes());
    assert_eq!(
        doc.as_document().unwrap().data(),
        &object_value! {
            "profile" => { "name" => "alice", "score" => 3 },
            // another client incremented concurrently; the server's count wins
            "visits" => 50,
            "seen" => COMMIT_TIME,
            "tags" => ["old", "new"],
        }
    );
}

#[test]
fn transforms_after_a_set_remember_the_pre_batch_value() {
    init_tracing();
    let alice = key("users/alice");
    let batch = MutationBatch::new(
        2,
        WRITE_TIME,
        vec![
            SetMutation::new(alice.clone(), object_value! { "visits" => 0 }, Precondition::None)
                .into(),
            TransformMutation::new(
                alice.clone(),
                vec![FieldTransform::new(path("seen"), TransformOperation::ServerTimestamp)],
            )
            .into(),
        ],
    );
    let before: MaybeDocument = Document::new(
        alice.clone(),
        SnapshotVersion::new(WRITE_TIME),
        object_value! { "seen" => WRITE_TIME },
        false,
    )
    .into();

    let view = batch.apply_to_local_view(&alice, Some(&before)).unwrap();
    assert_eq!(
        view.as_document()
            .unwrap()
            .to_json(ServerTimestampBehavior::Previous),
        json!({ "visits": 0, "seen": "2024-09-10T18:00:00.000000000Z" })
    );
}

#[test]
fn failed_precondition_skips_only_that_mutation() {
    init_tracing();
    let alice = key("users/alice");
    let bob = key("users/bob");
    let batch = MutationBatch::new(
        3,
        WRITE_TIME,
        vec![
            // alice does not exist yet, so the patch is skipped
            PatchMutation::new(
                alice.clone(),
                object_value! { "a" => 1 },
                FieldMask::new([path("a")]),
                Precondition::exists(true),
            )
            .into(),
            DeleteMutation::new(bob.clone(), Precondition::None).into(),
        ],
    );

    assert_eq!(batch.apply_to_local_view(&alice, None), None);
    assert!(batch.apply_to_local_view(&bob, None).unwrap().is_tombstone());
    assert_eq!(batch.keys().len(), 2);
}

#[test]
#[should_panic(expected = "does not match batch key")]
fn rejects_documents_of_other_keys() {
    let alice = key("users/alice");
    let batch = MutationBatch::new(4, WRITE_TIME, update_with_transforms(&alice));
    batch.apply_to_local_view(&key("users/bob"), Some(&cached(&alice)));
}
