// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{Mutation, MutationResult};
use crate::{
    model::{DocumentKey, MaybeDocument},
    timestamp::{SnapshotVersion, Timestamp},
};
use std::collections::BTreeSet;

/// Mutations written together by the application, applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct MutationBatch {
    batch_id: u64,
    local_write_time: Timestamp,
    mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn new(batch_id: u64, local_write_time: Timestamp, mutations: Vec<Mutation>) -> Self {
        Self {
            batch_id,
            local_write_time,
            mutations,
        }
    }

    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    pub fn local_write_time(&self) -> Timestamp {
        self.local_write_time
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Computes the pending view of the document at `key` with this batch applied on top of
    /// `maybe_doc`.
    ///
    /// Every mutation of the batch that targets `key` is applied in order. Transforms read their
    /// previous values from `maybe_doc` as it was before the batch, so that a transform following
    /// a set in the same batch still remembers what the field held before the set.
    ///
    /// # Panics
    ///
    /// If `maybe_doc` belongs to another key.
    pub fn apply_to_local_view(
        &self,
        key: &DocumentKey,
        maybe_doc: Option<&MaybeDocument>,
    ) -> Option<MaybeDocument> {
        if let Some(doc) = maybe_doc {
            assert_eq!(
                doc.key(),
                key,
                "document key {} does not match batch key {key}",
                doc.key()
            );
        }
        tracing::trace!(batch_id = self.batch_id, %key, "applying pending batch");

        let base_doc = maybe_doc;
        self.mutations
            .iter()
            .filter(|mutation| mutation.key() == key)
            .fold(maybe_doc.cloned(), |doc, mutation| {
                mutation.apply_to_local_view(doc.as_ref(), base_doc, self.local_write_time)
            })
    }

    /// Computes the authoritative state of the document at `key` once the server committed this
    /// batch, using the result the server returned for each mutation.
    ///
    /// # Panics
    ///
    /// If `maybe_doc` belongs to another key or `batch_result` was produced for another batch.
    pub fn apply_to_remote_document(
        &self,
        key: &DocumentKey,
        maybe_doc: Option<&MaybeDocument>,
        batch_result: &MutationBatchResult,
    ) -> Option<MaybeDocument> {
        if let Some(doc) = maybe_doc {
            assert_eq!(
                doc.key(),
                key,
                "document key {} does not match batch key {key}",
                doc.key()
            );
        }
        assert_eq!(
            batch_result.batch_id(),
            self.batch_id,
            "result belongs to another batch"
        );
        tracing::trace!(batch_id = self.batch_id, %key, "applying acknowledged batch");

        self.mutations
            .iter()
            .zip(batch_result.mutation_results())
            .filter(|(mutation, _)| mutation.key() == key)
            .fold(maybe_doc.cloned(), |doc, (mutation, result)| {
                mutation.apply_to_remote_document(doc.as_ref(), result)
            })
    }

    /// The keys of all documents this batch writes.
    pub fn keys(&self) -> BTreeSet<DocumentKey> {
        self.mutations
            .iter()
            .map(|mutation| mutation.key().clone())
            .collect()
    }

    /// True for a batch without mutations, left behind when all of its writes were dropped.
    pub fn is_tombstone(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// The server's acknowledgement of a [`MutationBatch`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct MutationBatchResult {
    batch_id: u64,
    commit_version: SnapshotVersion,
    mutation_results: Vec<MutationResult>,
}

impl MutationBatchResult {
    /// # Panics
    ///
    /// If there is not exactly one result per mutation of `batch`.
    pub fn new(
        batch: &MutationBatch,
        commit_version: SnapshotVersion,
        mutation_results: Vec<MutationResult>,
    ) -> Self {
        assert_eq!(
            batch.mutations().len(),
            mutation_results.len(),
            "mutations sent and results received don't match"
        );
        Self {
            batch_id: batch.batch_id(),
            commit_version,
            mutation_results,
        }
    }

    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    pub fn commit_version(&self) -> SnapshotVersion {
        self.commit_version
    }

    pub fn mutation_results(&self) -> &[MutationResult] {
        &self.mutation_results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Document, FieldPath, FieldValue, ObjectValue},
        mutation::{
            DeleteMutation, FieldTransform, Precondition, SetMutation, TransformMutation,
            TransformOperation,
        },
        object_value,
    };

    const WRITE_TIME: Timestamp = crate::timestamp!(2024-06-01 08:30:00 Z);
    const COMMIT_TIME: Timestamp = crate::timestamp!(2024-06-01 08:30:01 Z);

    fn alice() -> DocumentKey {
        "users/alice".parse().unwrap()
    }

    fn bob() -> DocumentKey {
        "users/bob".parse().unwrap()
    }

    fn path(p: &str) -> FieldPath {
        p.parse().unwrap()
    }

    /// A set followed by a server timestamp on the same key, the way a write with a
    /// server timestamp sentinel is split up.
    fn set_with_timestamp(key: DocumentKey, value: ObjectValue) -> Vec<Mutation> {
        vec![
            SetMutation::new(key.clone(), value, Precondition::None).into(),
            TransformMutation::new(
                key,
                vec![FieldTransform::new(path("updated"), TransformOperation::ServerTimestamp)],
            )
            .into(),
        ]
    }

    #[test]
    fn local_view_uses_pre_batch_state_as_base() {
        let mutations = set_with_timestamp(
            alice(),
            object_value! {
                "updated" => FieldValue::Null,
                "name" => "alice",
            },
        );
        let batch = MutationBatch::new(1, WRITE_TIME, mutations);
        let before: MaybeDocument = Document::new(
            alice(),
            SnapshotVersion::new(WRITE_TIME),
            object_value! { "updated" => "yesterday" },
            false,
        )
        .into();

        let result = batch.apply_to_local_view(&alice(), Some(&before)).unwrap();
        let doc = result.as_document().unwrap();
        assert!(doc.has_local_mutations());
        assert_eq!(doc.field(&path("name")), Some(&"alice".into()));
        match doc.field(&path("updated")) {
            Some(FieldValue::ServerTimestamp(pending)) => {
                // not the null written by the set in the same batch
                assert_eq!(pending.previous_value(), Some(&"yesterday".into()));
            }
            other => panic!("expected a pending server timestamp, got {other:?}"),
        }
    }

    #[test]
    fn local_view_ignores_other_keys() {
        let mut mutations = set_with_timestamp(alice(), object_value! { "a" => 1 });
        mutations.push(DeleteMutation::new(bob(), Precondition::None).into());
        let batch = MutationBatch::new(2, WRITE_TIME, mutations);

        assert!(batch.apply_to_local_view(&alice(), None).unwrap().is_document());
        assert!(batch.apply_to_local_view(&bob(), None).unwrap().is_tombstone());
        assert_eq!(batch.keys().into_iter().collect::<Vec<_>>(), vec![alice(), bob()]);
    }

    #[test]
    fn remote_applies_each_result() {
        let mutations = set_with_timestamp(bob(), object_value! { "name" => "bob" });
        let batch = MutationBatch::new(3, WRITE_TIME, mutations);
        let commit = SnapshotVersion::new(COMMIT_TIME);
        let result = MutationBatchResult::new(
            &batch,
            commit,
            vec![
                MutationResult::new(commit),
                MutationResult::with_transform_results(
                    commit,
                    vec![FieldValue::Timestamp(COMMIT_TIME)],
                ),
            ],
        );

        let doc = batch.apply_to_remote_document(&bob(), None, &result).unwrap();
        assert_eq!(doc.version(), commit);
        assert!(!doc.has_pending_writes());
        assert_eq!(
            doc.as_document().unwrap().data(),
            &object_value! { "name" => "bob", "updated" => COMMIT_TIME }
        );
    }

    #[test]
    #[should_panic(expected = "mutations sent and results received don't match")]
    fn batch_result_requires_one_result_per_mutation() {
        let mutations = set_with_timestamp(bob(), ObjectValue::empty());
        let batch = MutationBatch::new(4, WRITE_TIME, mutations);
        MutationBatchResult::new(&batch, SnapshotVersion::NONE, vec![]);
    }

    #[test]
    fn empty_batch_is_tombstone() {
        let batch = MutationBatch::new(5, WRITE_TIME, vec![]);
        assert!(batch.is_tombstone());
        assert!(batch.keys().is_empty());
        assert_eq!(batch.apply_to_local_view(&alice(), None), None);
    }
}
