// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{FieldMask, MutationResult, Precondition, post_mutation_version, verify_key_matches};
use crate::model::{Document, DocumentKey, MaybeDocument, ObjectValue};
use std::fmt;

/// Overwrites the fields named by a [`FieldMask`], leaving the rest of the document alone.
///
/// A masked path that `value` does not contain is deleted from the document.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct PatchMutation {
    key: DocumentKey,
    value: ObjectValue,
    mask: FieldMask,
    precondition: Precondition,
}

impl PatchMutation {
    pub fn new(
        key: DocumentKey,
        value: ObjectValue,
        mask: FieldMask,
        precondition: Precondition,
    ) -> Self {
        Self {
            key,
            value,
            mask,
            precondition,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn value(&self) -> &ObjectValue {
        &self.value
    }

    pub fn mask(&self) -> &FieldMask {
        &self.mask
    }

    pub fn precondition(&self) -> Precondition {
        self.precondition
    }

    pub fn apply_to_remote_document(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        mutation_result: &MutationResult,
    ) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying acknowledged patch mutation");
        verify_key_matches(&self.key, maybe_doc);
        assert!(
            mutation_result.transform_results().is_none(),
            "transform results received by {self}"
        );

        if !self.precondition.is_valid_for(maybe_doc) {
            tracing::debug!(
                key = %self.key,
                precondition = %self.precondition,
                "patch precondition failed, skipping"
            );
            return maybe_doc.cloned();
        }

        let data = self.patch_document(maybe_doc);
        Some(Document::new(self.key.clone(), mutation_result.version(), data, false).into())
    }

    pub fn apply_to_local_view(&self, maybe_doc: Option<&MaybeDocument>) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying pending patch mutation");
        verify_key_matches(&self.key, maybe_doc);

        if !self.precondition.is_valid_for(maybe_doc) {
            tracing::debug!(
                key = %self.key,
                precondition = %self.precondition,
                "patch precondition failed, skipping"
            );
            return maybe_doc.cloned();
        }

        let version = post_mutation_version(maybe_doc);
        let data = self.patch_document(maybe_doc);
        Some(Document::new(self.key.clone(), version, data, true).into())
    }

    fn patch_document(&self, maybe_doc: Option<&MaybeDocument>) -> ObjectValue {
        let data = match maybe_doc.and_then(MaybeDocument::as_document) {
            Some(doc) => doc.data().clone(),
            None => ObjectValue::empty(),
        };
        self.mask
            .paths()
            .fold(data, |data, path| match self.value.get(path) {
                Some(value) => data.set(path, value.clone()),
                None => data.delete(path),
            })
    }
}

impl fmt::Display for PatchMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PatchMutation{{key={}, precondition={}, mask={}, value={}}}",
            self.key, self.precondition, self.mask, self.value
        )
    }
}

impl fmt::Debug for PatchMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{FieldPath, NoDocument},
        object_value,
        timestamp::{SnapshotVersion, Timestamp},
    };

    fn key() -> DocumentKey {
        "users/bob".parse().unwrap()
    }

    fn version(seconds: i64) -> SnapshotVersion {
        SnapshotVersion::new(Timestamp::new(seconds, 0).unwrap())
    }

    fn mask(paths: &[&str]) -> FieldMask {
        paths.iter().map(|p| p.parse::<FieldPath>().unwrap()).collect()
    }

    fn existing() -> MaybeDocument {
        Document::new(
            key(),
            version(5),
            object_value! {
                "name" => "bob",
                "address" => { "city" => "Berlin", "zip" => "10115" },
            },
            false,
        )
        .into()
    }

    #[test]
    fn local_view_merges_masked_fields() {
        let mutation = PatchMutation::new(
            key(),
            object_value! { "address" => { "city" => "Munich" }, "ignored" => true },
            mask(&["address.city", "address.zip"]),
            Precondition::exists(true),
        );
        let result = mutation.apply_to_local_view(Some(&existing())).unwrap();
        let doc = result.as_document().unwrap();
        assert_eq!(
            doc.data(),
            &object_value! { "name" => "bob", "address" => { "city" => "Munich" } }
        );
        assert_eq!(doc.version(), version(5));
        assert!(doc.has_local_mutations());
    }

    #[test]
    fn local_view_skips_missing_documents_under_exists() {
        let mutation = PatchMutation::new(
            key(),
            object_value! { "a" => 1 },
            mask(&["a"]),
            Precondition::exists(true),
        );
        assert_eq!(mutation.apply_to_local_view(None), None);
        let tombstone: MaybeDocument = NoDocument::new(key(), version(1)).into();
        assert_eq!(mutation.apply_to_local_view(Some(&tombstone)), Some(tombstone));
    }

    #[test]
    fn local_view_without_precondition_creates_document() {
        let mutation =
            PatchMutation::new(key(), object_value! { "a" => 1 }, mask(&["a"]), Precondition::None);
        let result = mutation.apply_to_local_view(None).unwrap();
        assert_eq!(result.as_document().unwrap().data(), &object_value! { "a" => 1 });
        assert_eq!(result.version(), SnapshotVersion::NONE);
    }

    #[test]
    fn remote_uses_result_version() {
        let mutation = PatchMutation::new(
            key(),
            object_value! { "name" => "robert" },
            mask(&["name"]),
            Precondition::exists(true),
        );
        let result = mutation
            .apply_to_remote_document(Some(&existing()), &MutationResult::new(version(6)))
            .unwrap();
        let doc = result.as_document().unwrap();
        assert_eq!(doc.version(), version(6));
        assert_eq!(doc.field(&"name".parse().unwrap()), Some(&"robert".into()));
        assert!(!doc.has_local_mutations());
    }

    #[test]
    fn display() {
        let mutation = PatchMutation::new(
            key(),
            object_value! { "a" => 1 },
            mask(&["a"]),
            Precondition::exists(true),
        );
        insta::assert_snapshot!(
            mutation,
            @"PatchMutation{key=users/bob, precondition=exists=true, mask=[a], value={a: 1}}"
        );
    }
}
