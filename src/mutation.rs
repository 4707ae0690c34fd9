// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Mutations and how they reconcile with documents.
//!
//! A write issued by the application is queued as a [`MutationBatch`] and applied twice:
//!
//! - While it is pending, [`Mutation::apply_to_local_view`] computes the document the
//!   application should see, on top of whatever the client last heard from the server.
//! - Once the server acknowledges it, [`Mutation::apply_to_remote_document`] computes the
//!   authoritative document from the server's [`MutationResult`].
//!
//! Both paths are pure: they take the prior state of a document by reference and return its new
//! state, leaving the input untouched. `None` as input or output stands for a document the client
//! knows nothing about. A precondition that does not hold turns either path into a no-op that
//! returns its input. Violations of the calling contract, such as passing a document of another
//! key or a result that does not fit the mutation, panic.
use crate::{
    model::{DocumentKey, MaybeDocument},
    timestamp::{SnapshotVersion, Timestamp},
};
use std::fmt;

mod batch;
mod delete;
mod field_mask;
mod patch;
mod precondition;
mod result;
mod set;
mod transform;
mod transform_mutation;

pub use batch::{MutationBatch, MutationBatchResult};
pub use delete::DeleteMutation;
pub use field_mask::FieldMask;
pub use patch::PatchMutation;
pub use precondition::Precondition;
pub use result::MutationResult;
pub use set::SetMutation;
pub use transform::{FieldTransform, Numeric, TransformOperation};
pub use transform_mutation::TransformMutation;

/// A single write to a single document.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Mutation {
    Set(SetMutation),
    Patch(PatchMutation),
    Delete(DeleteMutation),
    Transform(TransformMutation),
}

impl Mutation {
    pub fn key(&self) -> &DocumentKey {
        match self {
            Mutation::Set(m) => m.key(),
            Mutation::Patch(m) => m.key(),
            Mutation::Delete(m) => m.key(),
            Mutation::Transform(m) => m.key(),
        }
    }

    pub fn precondition(&self) -> Precondition {
        match self {
            Mutation::Set(m) => m.precondition(),
            Mutation::Patch(m) => m.precondition(),
            Mutation::Delete(m) => m.precondition(),
            Mutation::Transform(m) => m.precondition(),
        }
    }

    /// The field transforms of a transform mutation; empty for every other kind.
    pub fn field_transforms(&self) -> &[FieldTransform] {
        match self {
            Mutation::Transform(m) => m.field_transforms(),
            Mutation::Set(_) | Mutation::Patch(_) | Mutation::Delete(_) => &[],
        }
    }

    /// Applies the mutation to `maybe_doc` as the server acknowledged it.
    ///
    /// # Panics
    ///
    /// If `maybe_doc` belongs to another key or `mutation_result` does not fit the mutation.
    pub fn apply_to_remote_document(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        mutation_result: &MutationResult,
    ) -> Option<MaybeDocument> {
        match self {
            Mutation::Set(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
            Mutation::Patch(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
            Mutation::Delete(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
            Mutation::Transform(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
        }
    }

    /// Applies the mutation to `maybe_doc` while it is still pending.
    ///
    /// `base_doc` is the state of the document before the batch containing this mutation, which
    /// is where field transforms read their previous values from. Other kinds ignore it.
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
        match self {
            Mutation::Set(m) => m.apply_to_local_view(maybe_doc),
            Mutation::Patch(m) => m.apply_to_local_view(maybe_doc),
            Mutation::Delete(m) => m.apply_to_local_view(maybe_doc),
            Mutation::Transform(m) => m.apply_to_local_view(maybe_doc, base_doc, local_write_time),
        }
    }
}

impl From<SetMutation> for Mutation {
    fn from(m: SetMutation) -> Self {
        Mutation::Set(m)
    }
}

impl From<PatchMutation> for Mutation {
    fn from(m: PatchMutation) -> Self {
        Mutation::Patch(m)
    }
}

impl From<DeleteMutation> for Mutation {
    fn from(m: DeleteMutation) -> Self {
        Mutation::Delete(m)
    }
}

impl From<TransformMutation> for Mutation {
    fn from(m: TransformMutation) -> Self {
        Mutation::Transform(m)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Set(m) => m.fmt(f),
            Mutation::Patch(m) => m.fmt(f),
            Mutation::Delete(m) => m.fmt(f),
            Mutation::Transform(m) => m.fmt(f),
        }
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

fn verify_key_matches(key: &DocumentKey, maybe_doc: Option<&MaybeDocument>) {
    if let Some(doc) = maybe_doc {
        assert_eq!(
            doc.key(),
            key,
            "document key {} does not match mutation key {key}",
            doc.key()
        );
    }
}

/// The version a document has after a local write: that of the existing document, or
/// [`SnapshotVersion::NONE`] if the write creates it.
fn post_mutation_version(maybe_doc: Option<&MaybeDocument>) -> SnapshotVersion {
    maybe_doc
        .and_then(MaybeDocument::as_document)
        .map_or(SnapshotVersion::NONE, |doc| doc.version())
}
