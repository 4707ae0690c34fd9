// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Field transforms: operations that compute a field's new value from its previous value and
//! either the server's result or the local clock.
//!
//! Every [`TransformOperation`] has two evaluation modes. The local mode runs while the write
//! is pending and must make do with the local clock; the remote mode runs once the server has
//! acknowledged the write and returned its own result for the field. The two agree whenever the
//! result is determined by the previous value alone (increments, array operations) and diverge
//! when it depends on state only the server knows (its clock). The remote mode always wins once
//! it runs.
use crate::{
    create_set,
    model::{FieldPath, FieldValue, ServerTimestampValue},
    timestamp::Timestamp,
};
use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
};

/// The amount a [`TransformOperation::Increment`] adds to a field.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Numeric {
    Integer(i64),
    Double(f64),
}

impl Numeric {
    fn of(value: Option<&FieldValue>) -> Option<Numeric> {
        match value {
            Some(FieldValue::Integer(i)) => Some(Numeric::Integer(*i)),
            Some(FieldValue::Double(d)) => Some(Numeric::Double(*d)),
            _ => None,
        }
    }

    fn add(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Integer(a), Numeric::Integer(b)) => Numeric::Integer(a.saturating_add(b)),
            (Numeric::Integer(a), Numeric::Double(b)) => Numeric::Double(a as f64 + b),
            (Numeric::Double(a), Numeric::Integer(b)) => Numeric::Double(a + b as f64),
            (Numeric::Double(a), Numeric::Double(b)) => Numeric::Double(a + b),
        }
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Numeric::Integer(value)
    }
}

impl From<i32> for Numeric {
    fn from(value: i32) -> Self {
        Numeric::Integer(value.into())
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Double(value)
    }
}

impl From<Numeric> for FieldValue {
    fn from(value: Numeric) -> Self {
        match value {
            Numeric::Integer(i) => FieldValue::Integer(i),
            Numeric::Double(d) => FieldValue::Double(d),
        }
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        FieldValue::from(*self) == FieldValue::from(*other)
    }
}
impl Eq for Numeric {}

impl Hash for Numeric {
    fn hash<H: Hasher>(&self, state: &mut H) {
        FieldValue::from(*self).hash(state)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FieldValue::from(*self).fmt(f)
    }
}

impl fmt::Debug for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// The closed set of transforms a [`FieldTransform`] can apply.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum TransformOperation {
    /// Sets the field to the time at which the server processes the write.
    ServerTimestamp,
    /// Adds the operand to the field, treating non-numeric previous values as zero.
    Increment(Numeric),
    /// Appends each element that is not already present in the field's array.
    ArrayUnion(Vec<FieldValue>),
    /// Removes every occurrence of each element from the field's array.
    ArrayRemove(Vec<FieldValue>),
}

impl TransformOperation {
    pub fn increment(operand: impl Into<Numeric>) -> Self {
        TransformOperation::Increment(operand.into())
    }

    /// Computes the tentative value of the field while the write is pending.
    ///
    /// `previous` is the field's value before the mutation batch, if it had one.
    pub fn apply_to_local_view(
        &self,
        previous: Option<&FieldValue>,
        local_write_time: Timestamp,
    ) -> FieldValue {
        match self {
            TransformOperation::ServerTimestamp => FieldValue::ServerTimestamp(
                ServerTimestampValue::new(local_write_time, previous.cloned()),
            ),
            TransformOperation::Increment(operand) => Numeric::of(previous)
                .unwrap_or(Numeric::Integer(0))
                .add(*operand)
                .into(),
            TransformOperation::ArrayUnion(elements) => array_union(previous, elements),
            TransformOperation::ArrayRemove(elements) => array_remove(previous, elements),
        }
    }

    /// Computes the authoritative value of the field once the server acknowledged the write.
    ///
    /// # Panics
    ///
    /// If `server_result` is missing for an operation whose result is computed by the server.
    /// The server does not report results for array operations, so those are recomputed from
    /// `previous` and ignore `server_result`.
    pub fn apply_to_remote_document(
        &self,
        previous: Option<&FieldValue>,
        server_result: Option<&FieldValue>,
    ) -> FieldValue {
        match self {
            TransformOperation::ServerTimestamp | TransformOperation::Increment(_) => {
                let Some(server_result) = server_result else {
                    panic!("server did not return a result for the {self} transform")
                };
                server_result.clone()
            }
            TransformOperation::ArrayUnion(elements) => array_union(previous, elements),
            TransformOperation::ArrayRemove(elements) => array_remove(previous, elements),
        }
    }
}

fn coerce_to_array(previous: Option<&FieldValue>) -> Vec<FieldValue> {
    previous
        .and_then(FieldValue::as_array)
        .map(<[FieldValue]>::to_vec)
        .unwrap_or_default()
}

fn array_union(previous: Option<&FieldValue>, elements: &[FieldValue]) -> FieldValue {
    let mut result = coerce_to_array(previous);
    let mut present: HashSet<FieldValue, _> = create_set();
    present.extend(result.iter().cloned());
    for element in elements {
        if present.insert(element.clone()) {
            result.push(element.clone());
        }
    }
    FieldValue::Array(result)
}

fn array_remove(previous: Option<&FieldValue>, elements: &[FieldValue]) -> FieldValue {
    let mut result = coerce_to_array(previous);
    let mut removed: HashSet<&FieldValue, _> = create_set();
    removed.extend(elements);
    result.retain(|value| !removed.contains(value));
    FieldValue::Array(result)
}

impl fmt::Display for TransformOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformOperation::ServerTimestamp => f.write_str("server_timestamp"),
            TransformOperation::Increment(operand) => write!(f, "increment({operand})"),
            TransformOperation::ArrayUnion(elements) => {
                write!(f, "array_union({})", FieldValue::Array(elements.clone()))
            }
            TransformOperation::ArrayRemove(elements) => {
                write!(f, "array_remove({})", FieldValue::Array(elements.clone()))
            }
        }
    }
}

impl fmt::Debug for TransformOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A transform applied to a single field of a document.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct FieldTransform {
    field_path: FieldPath,
    operation: TransformOperation,
}

impl FieldTransform {
    pub fn new(field_path: FieldPath, operation: TransformOperation) -> Self {
        Self {
            field_path,
            operation,
        }
    }

    pub fn field_path(&self) -> &FieldPath {
        &self.field_path
    }

    pub fn operation(&self) -> &TransformOperation {
        &self.operation
    }
}

impl fmt::Display for FieldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldTransform{{path={}, op={}}}",
            self.field_path, self.operation
        )
    }
}

impl fmt::Debug for FieldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
