// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use smallvec::SmallVec;
use std::{fmt, str::FromStr};

/// Error returned when building or parsing a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPathError {
    /// A field path needs at least one segment.
    Empty,
    /// The dotted path contains an empty segment (for example `a..b`).
    EmptySegment(String),
}

impl fmt::Display for FieldPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPathError::Empty => write!(f, "field path must not be empty"),
            FieldPathError::EmptySegment(path) => {
                write!(f, "invalid field path {path}: paths must not contain empty segments")
            }
        }
    }
}

impl std::error::Error for FieldPathError {}

/// Addresses a (possibly nested) field inside a document, such as `address.city`.
///
/// A `FieldPath` always has at least one segment.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<String>"))]
pub struct FieldPath(SmallVec<[String; 4]>);

impl FieldPath {
    /// Builds a path from individual segments, which may contain any characters (including
    /// dots).
    pub fn from_segments<I, S>(segments: I) -> Result<Self, FieldPathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: SmallVec<[String; 4]> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(FieldPathError::Empty);
        }
        Ok(Self(segments))
    }

    /// A path consisting of a single segment.
    pub fn single(segment: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first_segment(&self) -> &str {
        &self.0[0]
    }

    pub fn last_segment(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Returns the path without its first segment, or `None` for a single-segment path.
    pub fn pop_first(&self) -> Option<FieldPath> {
        (self.0.len() > 1).then(|| Self(self.0[1..].iter().cloned().collect()))
    }

    /// Returns a new path with `segment` appended.
    pub fn append(&self, segment: impl Into<String>) -> FieldPath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns true if `self` is equal to `other` or addresses one of its ancestors.
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Renders the path in its canonical form, quoting segments that are not plain identifiers.
    pub fn canonical_string(&self) -> String {
        self.to_string()
    }
}

impl TryFrom<Vec<String>> for FieldPath {
    type Error = FieldPathError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_segments(segments)
    }
}

fn is_simple_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    /// Parses a dotted path. Segments cannot be quoted here; use
    /// [`FieldPath::from_segments`] for field names containing dots.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FieldPathError::Empty);
        }
        if s.split('.').any(str::is_empty) {
            return Err(FieldPathError::EmptySegment(s.to_string()));
        }
        Self::from_segments(s.split('.'))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if is_simple_segment(segment) {
                f.write_str(segment)?;
            } else {
                f.write_str("`")?;
                for c in segment.chars() {
                    if c == '`' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("`")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
