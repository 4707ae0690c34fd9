// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{DocumentKey, FieldPath, FieldValue, ObjectValue};
use crate::timestamp::SnapshotVersion;
use std::fmt;

/// A document that exists, together with its data.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Document {
    key: DocumentKey,
    version: SnapshotVersion,
    data: ObjectValue,
    has_local_mutations: bool,
}

impl Document {
    pub fn new(
        key: DocumentKey,
        version: SnapshotVersion,
        data: ObjectValue,
        has_local_mutations: bool,
    ) -> Self {
        Self {
            key,
            version,
            data,
            has_local_mutations,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    pub fn data(&self) -> &ObjectValue {
        &self.data
    }

    /// Returns the value at `path`, if the document has one.
    pub fn field(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.data.get(path)
    }

    /// True if the document reflects writes the server has not acknowledged yet.
    pub fn has_local_mutations(&self) -> bool {
        self.has_local_mutations
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document{{key={}, version={}, data={}, has_local_mutations={}}}",
            self.key, self.version, self.data, self.has_local_mutations
        )
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A tombstone: the document is known not to exist at `version`.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct NoDocument {
    key: DocumentKey,
    version: SnapshotVersion,
}

impl NoDocument {
    pub fn new(key: DocumentKey, version: SnapshotVersion) -> Self {
        Self { key, version }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn version(&self) -> SnapshotVersion {
        self.version
    }
}

impl fmt::Debug for NoDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoDocument{{key={}, version={}}}", self.key, self.version)
    }
}

/// The document exists at `version`, but its contents are not known locally.
///
/// Produced when the server acknowledges a write whose result cannot be reconstructed from the
/// local cache.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct UnknownDocument {
    key: DocumentKey,
    version: SnapshotVersion,
}

impl UnknownDocument {
    pub fn new(key: DocumentKey, version: SnapshotVersion) -> Self {
        Self { key, version }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn version(&self) -> SnapshotVersion {
        self.version
    }
}

impl fmt::Debug for UnknownDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UnknownDocument{{key={}, version={}}}",
            self.key, self.version
        )
    }
}

/// The best known state of a document.
///
/// Mutations take the absence of any knowledge as `Option<&MaybeDocument>::None`, which is
/// distinct from the [`MaybeDocument::NoDocument`] tombstone.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum MaybeDocument {
    Document(Document),
    NoDocument(NoDocument),
    Unknown(UnknownDocument),
}

impl MaybeDocument {
    pub fn key(&self) -> &DocumentKey {
        match self {
            MaybeDocument::Document(doc) => doc.key(),
            MaybeDocument::NoDocument(doc) => doc.key(),
            MaybeDocument::Unknown(doc) => doc.key(),
        }
    }

    pub fn version(&self) -> SnapshotVersion {
        match self {
            MaybeDocument::Document(doc) => doc.version(),
            MaybeDocument::NoDocument(doc) => doc.version(),
            MaybeDocument::Unknown(doc) => doc.version(),
        }
    }

    /// Returns the document if it exists.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            MaybeDocument::Document(doc) => Some(doc),
            MaybeDocument::NoDocument(_) | MaybeDocument::Unknown(_) => None,
        }
    }

    pub fn is_document(&self) -> bool {
        self.as_document().is_some()
    }

    /// True for the [`MaybeDocument::NoDocument`] tombstone.
    pub fn is_tombstone(&self) -> bool {
        matches!(self, MaybeDocument::NoDocument(_))
    }

    /// True if the state includes writes the server has not acknowledged yet.
    pub fn has_pending_writes(&self) -> bool {
        self.as_document().is_some_and(Document::has_local_mutations)
    }
}

impl From<Document> for MaybeDocument {
    fn from(doc: Document) -> Self {
        MaybeDocument::Document(doc)
    }
}

impl From<NoDocument> for MaybeDocument {
    fn from(doc: NoDocument) -> Self {
        MaybeDocument::NoDocument(doc)
    }
}

impl From<UnknownDocument> for MaybeDocument {
    fn from(doc: UnknownDocument) -> Self {
        MaybeDocument::Unknown(doc)
    }
}

impl fmt::Debug for MaybeDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeDocument::Document(doc) => doc.fmt(f),
            MaybeDocument::NoDocument(doc) => doc.fmt(f),
            MaybeDocument::Unknown(doc) => doc.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_value;

    fn key() -> DocumentKey {
        "rooms/eros".parse().unwrap()
    }

    #[test]
    fn accessors_dispatch_over_variants() {
        let doc: MaybeDocument = Document::new(
            key(),
            SnapshotVersion::NONE,
            object_value! { "a" => 1 },
            true,
        )
        .into();
        let tombstone: MaybeDocument = NoDocument::new(key(), SnapshotVersion::NONE).into();
        let unknown: MaybeDocument = UnknownDocument::new(key(), SnapshotVersion::NONE).into();

        assert!(doc.is_document());
        assert!(doc.has_pending_writes());
        assert!(tombstone.is_tombstone());
        assert!(!unknown.is_document() && !unknown.is_tombstone());
        for maybe_doc in [&doc, &tombstone, &unknown] {
            assert_eq!(maybe_doc.key(), &key());
            assert_eq!(maybe_doc.version(), SnapshotVersion::NONE);
        }
    }

    #[test]
    fn field_reads_nested_data() {
        let doc = Document::new(
            key(),
            SnapshotVersion::NONE,
            object_value! { "a" => { "b" => "c" } },
            false,
        );
        assert_eq!(doc.field(&"a.b".parse().unwrap()), Some(&"c".into()));
        assert_eq!(doc.field(&"a.x".parse().unwrap()), None);
    }
}
