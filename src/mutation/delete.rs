// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{MutationResult, Precondition, verify_key_matches};
use crate::{
    model::{DocumentKey, MaybeDocument, NoDocument},
    timestamp::SnapshotVersion,
};
use std::fmt;

/// Deletes the document, leaving a [`NoDocument`] tombstone behind.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct DeleteMutation {
    key: DocumentKey,
    precondition: Precondition,
}

impl DeleteMutation {
    pub fn new(key: DocumentKey, precondition: Precondition) -> Self {
        Self { key, precondition }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn precondition(&self) -> Precondition {
        self.precondition
    }

    pub fn apply_to_remote_document(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        mutation_result: &MutationResult,
    ) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying acknowledged delete mutation");
        verify_key_matches(&self.key, maybe_doc);
        assert!(
            mutation_result.transform_results().is_none(),
            "transform results received by {self}"
        );

        Some(NoDocument::new(self.key.clone(), SnapshotVersion::NONE).into())
    }

    pub fn apply_to_local_view(&self, maybe_doc: Option<&MaybeDocument>) -> Option<MaybeDocument> {
        tracing::trace!(key = %self.key, "applying pending delete mutation");
        verify_key_matches(&self.key, maybe_doc);

        if !self.precondition.is_valid_for(maybe_doc) {
            tracing::debug!(
                key = %self.key,
                precondition = %self.precondition,
                "delete precondition failed, skipping"
            );
            return maybe_doc.cloned();
        }

        Some(NoDocument::new(self.key.clone(), SnapshotVersion::NONE).into())
    }
}

impl fmt::Display for DeleteMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeleteMutation{{key={}, precondition={}}}",
            self.key, self.precondition
        )
    }
}

impl fmt::Debug for DeleteMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
