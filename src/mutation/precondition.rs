// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::{model::MaybeDocument, timestamp::SnapshotVersion};
use std::fmt;

/// A constraint on the existence or version of a document that must hold for a mutation to
/// apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Precondition {
    /// Always satisfied.
    #[default]
    None,
    /// `Exists(true)` requires a present document; `Exists(false)` requires that the document
    /// is absent or deleted.
    Exists(bool),
    /// Requires a present document at exactly this version.
    UpdateTime(SnapshotVersion),
}

impl Precondition {
    pub fn exists(exists: bool) -> Self {
        Precondition::Exists(exists)
    }

    pub fn update_time(version: SnapshotVersion) -> Self {
        Precondition::UpdateTime(version)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Precondition::None)
    }

    /// Returns true if a mutation with this precondition may be applied to `maybe_doc`.
    ///
    /// `None` stands for a document the client knows nothing about, which counts as absent.
    pub fn is_valid_for(&self, maybe_doc: Option<&MaybeDocument>) -> bool {
        match *self {
            Precondition::None => true,
            Precondition::Exists(true) => maybe_doc.is_some_and(MaybeDocument::is_document),
            Precondition::Exists(false) => maybe_doc.is_none_or(MaybeDocument::is_tombstone),
            Precondition::UpdateTime(version) => maybe_doc
                .and_then(MaybeDocument::as_document)
                .is_some_and(|doc| doc.version() == version),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::None => f.write_str("none"),
            Precondition::Exists(exists) => write!(f, "exists={exists}"),
            Precondition::UpdateTime(version) => write!(f, "update_time={version}"),
        }
    }
}
