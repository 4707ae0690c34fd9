// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! A mutation that rewrites individual fields of an existing document through
//! [`FieldTransform`]s.
//!
//! Transform mutations never stand alone: a write that carries transforms is split into a set or
//! patch mutation followed by a transform mutation on the same key. That is why the precondition
//! is always `exists(true)`; once the preceding write applied there is a document to transform,
//! and when there is none, a partial document must not be fabricated.
use super::{FieldTransform, MutationResult, Precondition, verify_key_matches};
use crate::{
    model::{Document, DocumentKey, FieldValue, MaybeDocument, ObjectValue},
    timestamp::Timestamp,
};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct TransformMutation {
    key: DocumentKey,
    field_transforms: Vec<FieldTransform>,
}

impl TransformMutation {
    pub fn new(key: DocumentKey, field_transforms: Vec<FieldTransform>) -> Self {
        Self {
            key,
            field_transforms,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Always `exists(true)`.
    pub fn precondition(&self) -> Precondition {
        Precondition::exists(true)
    }

    /// The transforms, in the order they are folded into the document.
    pub fn field_transforms(&self) -> &[FieldTransform] {
        &self.field_transforms
    }

    /// Applies the transforms using the values the server computed for them.
    ///
    /// Previous values are read from `maybe_doc` itself, which at this point reflects every write
    /// the server acknowledged before this one. The result has the version of `maybe_doc` and no
    /// local mutations.
    ///
    /// # Panics
    ///
    /// If `maybe_doc` belongs to another key, if `mutation_result` carries no transform results,
    /// or if the number of results differs from the number of transforms.
    pub fn apply_to_remote_document(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        mutation_result: &MutationResult,
    ) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying acknowledged transform mutation");
        verify_key_matches(&self.key, maybe_doc);

        let server_results = mutation_result
            .transform_results()
            .unwrap_or_else(|| panic!("transform results missing for {self}"));

        // The backend already checked the precondition, but without a cached document there is
        // nothing to transform and a partial document must not land in the cache.
        if !self.precondition().is_valid_for(maybe_doc) {
            tracing::debug!(key = %self.key, "transform precondition failed, skipping");
            return maybe_doc.cloned();
        }

        let doc = self.require_document(maybe_doc);
        assert_eq!(
            server_results.len(),
            self.field_transforms.len(),
            "server transform result count should match field transform count for {}",
            self.key
        );

        let results = self
            .field_transforms
            .iter()
            .zip(server_results)
            .map(|(transform, server_result)| {
                let previous = doc.field(transform.field_path());
                transform
                    .operation()
                    .apply_to_remote_document(previous, Some(server_result))
            });
        let data = self.transform_object(doc.data(), results);
        Some(Document::new(self.key.clone(), doc.version(), data, false).into())
    }

    /// Applies the transforms tentatively, before the server acknowledged the write.
    ///
    /// Previous values are read from `base_doc`, the state of the document before the batch
    /// that contains this mutation, while the results are folded into `maybe_doc`. The result has
    /// the version of `maybe_doc` and is flagged as having local mutations.
    ///
    /// # Panics
    ///
    /// If `maybe_doc` belongs to another key.
    pub fn apply_to_local_view(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        base_doc: Option<&MaybeDocument>,
        local_write_time: Timestamp,
    ) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying pending transform mutation");
        verify_key_matches(&self.key, maybe_doc);

        if !self.precondition().is_valid_for(maybe_doc) {
            tracing::debug!(key = %self.key, "transform precondition failed, skipping");
            return maybe_doc.cloned();
        }

        let doc = self.require_document(maybe_doc);
        let base = base_doc.and_then(MaybeDocument::as_document);
        let results = self.field_transforms.iter().map(|transform| {
            let previous = base.and_then(|base| base.field(transform.field_path()));
            transform
                .operation()
                .apply_to_local_view(previous, local_write_time)
        });
        let data = self.transform_object(doc.data(), results);
        Some(Document::new(self.key.clone(), doc.version(), data, true).into())
    }

    fn require_document<'d>(&self, maybe_doc: Option<&'d MaybeDocument>) -> &'d Document {
        match maybe_doc.and_then(MaybeDocument::as_document) {
            Some(doc) => doc,
            None => panic!("{self} requires a document, got {maybe_doc:?}"),
        }
    }

    /// Writes each result to its transform's path, in transform order.
    fn transform_object(
        &self,
        data: &ObjectValue,
        results: impl ExactSizeIterator<Item = FieldValue>,
    ) -> ObjectValue {
        assert_eq!(
            results.len(),
            self.field_transforms.len(),
            "transform results length mismatch"
        );
        self.field_transforms
            .iter()
            .zip(results)
            .fold(data.clone(), |data, (transform, value)| {
                data.set(transform.field_path(), value)
            })
    }
}

impl fmt::Display for TransformMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransformMutation{{key={}, precondition={}, field_transforms=[",
            self.key,
            self.precondition()
        )?;
        for (i, transform) in self.field_transforms.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            transform.fmt(f)?;
        }
        f.write_str("]}")
    }
}

impl fmt::Debug for TransformMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{FieldPath, NoDocument},
        mutation::TransformOperation,
        object_value,
        timestamp::SnapshotVersion,
    };

    const LOCAL_TIME: Timestamp = crate::timestamp!(2024-05-01 10:00:00 Z);
    const SERVER_TIME: Timestamp = crate::timestamp!(2024-05-01 10:00:02 Z);

    fn key() -> DocumentKey {
        "rooms/eros".parse().unwrap()
    }

    fn path(p: &str) -> FieldPath {
        p.parse().unwrap()
    }

    fn doc(data: ObjectValue, has_local_mutations: bool) -> MaybeDocument {
        Document::new(key(), SnapshotVersion::new(SERVER_TIME), data, has_local_mutations).into()
    }

    fn server_timestamp(p: &str) -> FieldTransform {
        FieldTransform::new(path(p), TransformOperation::ServerTimestamp)
    }

    #[test]
    fn precondition_is_exists() {
        let mutation = TransformMutation::new(key(), vec![]);
        assert_eq!(mutation.precondition(), Precondition::exists(true));
    }

    #[test]
    fn local_view_reads_previous_from_base() {
        let mutation = TransformMutation::new(key(), vec![server_timestamp("ts")]);
        let current = doc(object_value! { "ts" => "current" }, true);
        let base = doc(object_value! { "ts" => "base" }, false);

        let result = mutation
            .apply_to_local_view(Some(&current), Some(&base), LOCAL_TIME)
            .unwrap();
        let doc = result.as_document().unwrap();
        match doc.field(&path("ts")) {
            Some(FieldValue::ServerTimestamp(pending)) => {
                assert_eq!(pending.previous_value(), Some(&FieldValue::from("base")));
                assert_eq!(pending.local_write_time(), LOCAL_TIME);
            }
            other => panic!("expected a pending server timestamp, got {other:?}"),
        }
        assert!(doc.has_local_mutations());
    }

    #[test]
    fn local_view_without_base_has_no_previous() {
        let mutation = TransformMutation::new(key(), vec![server_timestamp("ts")]);
        let current = doc(object_value! { "ts" => 1 }, false);
        let tombstone: MaybeDocument = NoDocument::new(key(), SnapshotVersion::NONE).into();

        for base in [None, Some(&tombstone)] {
            let result = mutation
                .apply_to_local_view(Some(&current), base, LOCAL_TIME)
                .unwrap();
            let Some(FieldValue::ServerTimestamp(pending)) =
                result.as_document().unwrap().field(&path("ts")).cloned()
            else {
                panic!("expected a pending server timestamp");
            };
            assert_eq!(pending.previous_value(), None);
        }
    }

    #[test]
    fn remote_reads_previous_from_document() {
        let mutation = TransformMutation::new(
            key(),
            vec![FieldTransform::new(
                path("tags"),
                TransformOperation::ArrayUnion(vec!["b".into()]),
            )],
        );
        let current = doc(object_value! { "tags" => ["a"] }, true);
        let result = MutationResult::with_transform_results(
            SnapshotVersion::new(SERVER_TIME),
            vec![FieldValue::Null],
        );

        let result = mutation
            .apply_to_remote_document(Some(&current), &result)
            .unwrap();
        assert_eq!(
            result.as_document().unwrap().data(),
            &object_value! { "tags" => ["a", "b"] }
        );
        assert!(!result.has_pending_writes());
    }

    #[test]
    fn untouched_fields_are_shared() {
        let mutation = TransformMutation::new(key(), vec![server_timestamp("a.ts")]);
        let current = doc(object_value! { "a" => { "x" => 1 }, "b" => { "y" => 2 } }, false);
        let result = mutation
            .apply_to_local_view(Some(&current), Some(&current), LOCAL_TIME)
            .unwrap();

        let before = current.as_document().unwrap().field(&path("b")).unwrap();
        let after = result.as_document().unwrap().field(&path("b")).unwrap();
        assert!(
            before
                .as_object()
                .unwrap()
                .shares_storage_with(after.as_object().unwrap())
        );
    }

    #[test]
    #[should_panic(expected = "transform results missing")]
    fn remote_requires_transform_results() {
        let mutation = TransformMutation::new(key(), vec![server_timestamp("ts")]);
        let current = doc(ObjectValue::empty(), false);
        mutation.apply_to_remote_document(
            Some(&current),
            &MutationResult::new(SnapshotVersion::new(SERVER_TIME)),
        );
    }

    #[test]
    #[should_panic(expected = "should match field transform count")]
    fn remote_requires_one_result_per_transform() {
        let mutation =
            TransformMutation::new(key(), vec![server_timestamp("a"), server_timestamp("b")]);
        let current = doc(ObjectValue::empty(), false);
        mutation.apply_to_remote_document(
            Some(&current),
            &MutationResult::with_transform_results(
                SnapshotVersion::new(SERVER_TIME),
                vec![FieldValue::Timestamp(SERVER_TIME)],
            ),
        );
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn rejects_foreign_documents() {
        let mutation = TransformMutation::new(key(), vec![]);
        let other: MaybeDocument = Document::new(
            "rooms/bob".parse().unwrap(),
            SnapshotVersion::NONE,
            ObjectValue::empty(),
            false,
        )
        .into();
        mutation.apply_to_local_view(Some(&other), None, LOCAL_TIME);
    }

    #[test]
    fn display() {
        let mutation = TransformMutation::new(
            key(),
            vec![
                server_timestamp("ts"),
                FieldTransform::new(path("n"), TransformOperation::increment(1)),
            ],
        );
        insta::assert_snapshot!(
            mutation,
            @"TransformMutation{key=rooms/eros, precondition=exists=true, field_transforms=[FieldTransform{path=ts, op=server_timestamp}, FieldTransform{path=n, op=increment(1)}]}"
        );
    }

    #[test]
    fn structural_equality() {
        let a = TransformMutation::new(key(), vec![server_timestamp("ts")]);
        let b = TransformMutation::new(key(), vec![server_timestamp("ts")]);
        let c = TransformMutation::new(key(), vec![server_timestamp("other")]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = crate::create_set();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }
}
