// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{MutationResult, Precondition, post_mutation_version, verify_key_matches};
use crate::model::{Document, DocumentKey, MaybeDocument, ObjectValue};
use std::fmt;

/// Replaces the whole document with a new value.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct SetMutation {
    key: DocumentKey,
    value: ObjectValue,
    precondition: Precondition,
}

impl SetMutation {
    pub fn new(key: DocumentKey, value: ObjectValue, precondition: Precondition) -> Self {
        Self {
            key,
            value,
            precondition,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn value(&self) -> &ObjectValue {
        &self.value
    }

    pub fn precondition(&self) -> Precondition {
        self.precondition
    }

    /// The server accepted the write, so its precondition held there and is not re-checked.
    pub fn apply_to_remote_document(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        mutation_result: &MutationResult,
    ) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying acknowledged set mutation");
        verify_key_matches(&self.key, maybe_doc);
        assert!(
            mutation_result.transform_results().is_none(),
            "transform results received by {self}"
        );

        Some(
            Document::new(
                self.key.clone(),
                mutation_result.version(),
                self.value.clone(),
                false,
            )
            .into(),
        )
    }

    pub fn apply_to_local_view(&self, maybe_doc: Option<&MaybeDocument>) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying pending set mutation");
        verify_key_matches(&self.key, maybe_doc);

        if !self.precondition.is_valid_for(maybe_doc) {
            tracing::debug!(
                key = %self.key,
                precondition = %self.precondition,
                "set precondition failed, skipping"
            );
            return maybe_doc.cloned();
        }

        let version = post_mutation_version(maybe_doc);
        Some(Document::new(self.key.clone(), version, self.value.clone(), true).into())
    }
}

impl fmt::Display for SetMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SetMutation{{key={}, precondition={}, value={}}}",
            self.key, self.precondition, self.value
        )
    }
}

impl fmt::Debug for SetMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
