// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The document model mutations operate on.
//!
//! Everything in here is an immutable value: keys, paths, field values, and documents are
//! never modified after construction. Operations that "change" an [`ObjectValue`] return a new
//! one, sharing whatever they did not touch with the original.
mod document;
mod key;
mod path;
mod value;

pub use document::{Document, MaybeDocument, NoDocument, UnknownDocument};
pub use key::{DocumentKey, DocumentKeyError};
pub use path::{FieldPath, FieldPathError};
pub use value::{FieldValue, GeoPoint, ObjectValue, ServerTimestampBehavior, ServerTimestampValue};

#[cfg(any(test, feature = "arbitrary"))]
mod test_util;
