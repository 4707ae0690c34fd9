// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use smallvec::SmallVec;
use std::{fmt, str::FromStr, sync::Arc};

/// Error returned when parsing a [`DocumentKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKeyError {
    /// The path has no segments.
    Empty,
    /// Document paths alternate collection and document ids, so they have an even length.
    OddSegmentCount(String),
    /// The path contains an empty segment (for example `users//alice`).
    EmptySegment(String),
}

impl fmt::Display for DocumentKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKeyError::Empty => write!(f, "document path must not be empty"),
            DocumentKeyError::OddSegmentCount(path) => write!(
                f,
                "invalid document path {path}: document paths must have an even number of segments"
            ),
            DocumentKeyError::EmptySegment(path) => {
                write!(f, "invalid document path {path}: paths must not contain empty segments")
            }
        }
    }
}

impl std::error::Error for DocumentKeyError {}

/// Identifies a document by its full resource path, such as `rooms/eros/messages/1`.
///
/// Keys are immutable and cheap to clone; the segments are shared behind an [`Arc`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<String>"))]
pub struct DocumentKey(Arc<SmallVec<[String; 4]>>);

impl DocumentKey {
    /// Builds a key from already-split path segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, DocumentKeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: SmallVec<[String; 4]> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(DocumentKeyError::Empty);
        }
        if segments.iter().any(String::is_empty) {
            return Err(DocumentKeyError::EmptySegment(segments.join("/")));
        }
        if segments.len() % 2 != 0 {
            return Err(DocumentKeyError::OddSegmentCount(segments.join("/")));
        }
        Ok(Self(Arc::new(segments)))
    }

    /// The segments of this key's path.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The id of the collection directly containing the document.
    pub fn collection_id(&self) -> &str {
        &self.0[self.0.len() - 2]
    }

    /// The id of the document within its collection.
    pub fn document_id(&self) -> &str {
        &self.0[self.0.len() - 1]
    }
}

impl TryFrom<Vec<String>> for DocumentKey {
    type Error = DocumentKeyError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_segments(segments)
    }
}

impl FromStr for DocumentKey {
    type Err = DocumentKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DocumentKeyError::Empty);
        }
        Self::from_segments(s.split('/'))
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}
