// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::model::FieldPath;
use std::{collections::BTreeSet, fmt};

/// The set of field paths a [`PatchMutation`](super::PatchMutation) writes.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct FieldMask(BTreeSet<FieldPath>);

impl FieldMask {
    pub fn new(paths: impl IntoIterator<Item = FieldPath>) -> Self {
        Self(paths.into_iter().collect())
    }

    /// Paths in the mask, in sorted order.
    pub fn paths(&self) -> impl ExactSizeIterator<Item = &FieldPath> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if writing this mask writes `path` (directly or through an ancestor).
    pub fn covers(&self, path: &FieldPath) -> bool {
        self.0.iter().any(|masked| masked.is_prefix_of(path))
    }
}

impl FromIterator<FieldPath> for FieldMask {
    fn from_iter<T: IntoIterator<Item = FieldPath>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            path.fmt(f)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldMask{self}")
    }
}
