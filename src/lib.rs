// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # pendwrite: reconciling pending writes with server state
//!
//! This crate implements the mutation core of an offline-first document database client. The
//! client keeps a local cache of documents and a queue of writes the server has not acknowledged
//! yet. Every read has to answer the question "what does this document look like with my pending
//! writes on top?", and every acknowledgement has to answer "what does the document look like
//! now that the server has applied my write?". Both questions are answered by the same
//! [`Mutation`] value, evaluated along two paths:
//!
//! - [`Mutation::apply_to_local_view`] computes a tentative document for the application while
//!   the write is pending. Values only the server can know, such as its clock, are represented
//!   by placeholders.
//! - [`Mutation::apply_to_remote_document`] computes the authoritative document from the
//!   [`MutationResult`] the server returned, replacing every placeholder.
//!
//! ## Data model
//!
//! Documents live in the [`model`] module. A [`Document`] is identified by a [`DocumentKey`],
//! carries a [`SnapshotVersion`] and an [`ObjectValue`] of fields, and remembers whether it
//! contains writes the server has not acknowledged. [`MaybeDocument`] additionally represents
//! deleted documents ([`NoDocument`]) and documents known to exist at some version whose content
//! is unknown ([`UnknownDocument`]). Everything in the model is immutable: operations return new
//! values and share the parts they did not touch.
//!
//! ## Mutations
//!
//! The [`mutation`] module contains the four kinds of writes:
//!
//! - [`SetMutation`] replaces a document.
//! - [`PatchMutation`] updates the fields named by a [`FieldMask`].
//! - [`DeleteMutation`] leaves a tombstone.
//! - [`TransformMutation`] rewrites individual fields through [`FieldTransform`]s, whose
//!   operations ([`TransformOperation`]) compute a field's new value from its previous one:
//!   server timestamps, numeric increments and array unions/removals.
//!
//! Each mutation carries a [`Precondition`]. A precondition that does not hold turns
//! application into a no-op.
//!
//! ## Getting Started: A Server Timestamp
//!
//! ```rust
//! use pendwrite::{
//!     mutation::{FieldTransform, MutationResult, TransformMutation, TransformOperation},
//!     model::{Document, DocumentKey, FieldPath, FieldValue, MaybeDocument},
//!     object_value,
//!     timestamp::{SnapshotVersion, Timestamp},
//! };
//!
//! let key: DocumentKey = "rooms/lobby".parse().unwrap();
//! let doc: MaybeDocument = Document::new(
//!     key.clone(),
//!     SnapshotVersion::NONE,
//!     object_value! { "topic" => "hello" },
//!     false,
//! )
//! .into();
//!
//! let mutation = TransformMutation::new(
//!     key,
//!     vec![FieldTransform::new(
//!         "touched".parse().unwrap(),
//!         TransformOperation::ServerTimestamp,
//!     )],
//! );
//!
//! // While pending, the field holds a placeholder that remembers the local clock.
//! let local_time = Timestamp::new(1_700_000_000, 0).unwrap();
//! let pending = mutation
//!     .apply_to_local_view(Some(&doc), Some(&doc), local_time)
//!     .unwrap();
//! let touched: FieldPath = "touched".parse().unwrap();
//! assert!(pending.as_document().unwrap().field(&touched).unwrap().is_pending_server_timestamp());
//! assert!(pending.has_pending_writes());
//!
//! // The server's clock replaces the placeholder once the write is acknowledged.
//! let server_time = Timestamp::new(1_700_000_002, 0).unwrap();
//! let result = MutationResult::with_transform_results(
//!     SnapshotVersion::new(server_time),
//!     vec![FieldValue::Timestamp(server_time)],
//! );
//! let committed = mutation.apply_to_remote_document(Some(&doc), &result).unwrap();
//! assert_eq!(
//!     committed.as_document().unwrap().field(&touched),
//!     Some(&FieldValue::Timestamp(server_time))
//! );
//! ```
//!
//! Writes are usually grouped in a [`MutationBatch`], which applies all mutations for one key
//! in order and keeps the pre-batch state as the base that field transforms read from.
//!
//! ## Contract violations
//!
//! Invalid input that a caller may reasonably produce, such as a malformed path or key, is
//! reported through error types ([`TimestampError`](timestamp::TimestampError),
//! [`FieldPathError`](model::FieldPathError), [`DocumentKeyError`](model::DocumentKeyError)).
//! Applying a mutation to a document of another key, or with a server result that does not fit
//! the mutation, is a bug in the caller and panics.
//!
//! ## Logging
//!
//! Mutations emit [`tracing`] events: `trace` for every application and `debug` when a failed
//! precondition skips one. The crate never installs a subscriber.
//!
//! ## Features
//!
//! - `json`: Renders documents and values to `serde_json::Value`, resolving pending server
//!   timestamps according to a [`ServerTimestampBehavior`](model::ServerTimestampBehavior). This
//!   feature is enabled by default.
//! - `serde`: Provides `serde` support for all model and mutation types.
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for model types, useful for property-based
//!   testing.
//! - `chrono`: Enables `chrono` support for `Timestamp` and the [`timestamp!`] literal. This
//!   feature is enabled by default.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use ahash::RandomState;
use std::{
    collections::HashSet,
    hash::BuildHasher,
    sync::atomic::{AtomicBool, Ordering},
};

// Use a constant seed for hashing to make performance benchmarks have less variance.
pub(crate) const DETERMINISTIC_HASHER: RandomState = RandomState::with_seeds(48, 1516, 23, 42);

pub mod model;
pub use model::{
    Document, DocumentKey, FieldPath, FieldValue, MaybeDocument, NoDocument, ObjectValue,
    UnknownDocument,
};
pub mod mutation;
pub use mutation::{
    DeleteMutation, FieldMask, FieldTransform, Mutation, MutationBatch, MutationBatchResult,
    MutationResult, PatchMutation, Precondition, SetMutation, TransformMutation,
    TransformOperation,
};
pub mod timestamp;
pub use timestamp::{SnapshotVersion, Timestamp};
#[cfg(feature = "chrono")]
pub mod datetime_literal;
#[cfg(feature = "json")]
mod json;
/// Macros usable for tests and initialization
pub mod macros;

// re-export for the datetime-literal macro
#[cfg(feature = "chrono")]
pub use chrono;

static ENABLE_DETERMINISM: AtomicBool = AtomicBool::new(false);

/// Makes all hash-based collections behave deterministically.
///
/// This should only be enabled for testing, as it increases the odds of DoS
/// scenarios.
#[doc(hidden)]
pub fn enable_determinism() {
    ENABLE_DETERMINISM.store(true, Ordering::Release);
}

/// Checks if determinism is enabled.
///
/// Should be used internally and for testing.
#[doc(hidden)]
pub fn determinism_enabled() -> bool {
    ENABLE_DETERMINISM.load(Ordering::Acquire)
}

/// Create a random state for a hash set.
/// If `enable_determinism` has been used, this will return a deterministic
/// decidedly non-random RandomState, useful in tests.
#[inline]
fn make_random_state() -> RandomState {
    if determinism_enabled() {
        DETERMINISTIC_HASHER
    } else {
        RandomState::new()
    }
}

pub(crate) fn create_set<T>() -> HashSet<T, PendwriteRandomState> {
    HashSet::with_hasher(PendwriteRandomState::default())
}

/// This is a small wrapper around the ahash RandomState.
/// This allows us to easily switch to a non-random RandomState for use in tests.
#[derive(Clone)]
pub struct PendwriteRandomState {
    inner: RandomState,
}

// Falls back on a regular ahash::RandomState except when 'enable_determinism' has been
// called, in which case a static only-for-test RandomState is used.
impl Default for PendwriteRandomState {
    #[inline]
    fn default() -> Self {
        Self {
            inner: make_random_state(),
        }
    }
}

impl BuildHasher for PendwriteRandomState {
    type Hasher = <RandomState as BuildHasher>::Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        self.inner.build_hasher()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hash;

    #[test]
    fn deterministic_hasher() {
        enable_determinism();
        assert!(determinism_enabled());
        let hash = |value: &FieldValue| {
            let mut hasher = PendwriteRandomState::default().build_hasher();
            value.hash(&mut hasher);
            std::hash::Hasher::finish(&hasher)
        };
        let value = FieldValue::from("stable");
        assert_eq!(hash(&value), hash(&value.clone()));
    }
}
