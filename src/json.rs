// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! JSON representation
//!
//! Pending server timestamps have no JSON equivalent. They are resolved according to a
//! [`ServerTimestampBehavior`]: as `null`, as the local time of the write, or as the value the
//! field held before the write.
//!
//! # Examples
//!
//! ## A document with a pending server timestamp
//!
//! With [`ServerTimestampBehavior::Estimate`]:
//!
//! ```json
//! {
//!   "name": "John Doe",
//!   "avatar": "aGVsbG8=",
//!   "owner": "users/john",
//!   "updated": "2024-03-01T12:00:00.000000000Z"
//! }
//! ```
use crate::{
    model::{Document, FieldValue, ObjectValue, ServerTimestampBehavior},
    timestamp::Timestamp,
};
use serde_json::{Map, Value};

impl FieldValue {
    /// Renders the value as JSON, resolving pending server timestamps according to `behavior`.
    pub fn to_json(&self, behavior: ServerTimestampBehavior) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(v) => (*v).into(),
            FieldValue::Integer(v) => (*v).into(),
            FieldValue::Double(v) => (*v).into(),
            FieldValue::Timestamp(v) => timestamp_to_json(*v),
            FieldValue::ServerTimestamp(pending) => match behavior {
                ServerTimestampBehavior::None => Value::Null,
                ServerTimestampBehavior::Estimate => timestamp_to_json(pending.local_write_time()),
                ServerTimestampBehavior::Previous => pending
                    .previous_value()
                    .map_or(Value::Null, |previous| previous.to_json(behavior)),
            },
            FieldValue::String(v) => v.as_str().into(),
            FieldValue::Bytes(v) => {
                base64::Engine::encode(&base64::engine::general_purpose::STANDARD, v).into()
            }
            FieldValue::Reference(key) => key.to_string().into(),
            FieldValue::GeoPoint(point) => serde_json::json!({
                "latitude": point.latitude,
                "longitude": point.longitude,
            }),
            FieldValue::Array(values) => values.iter().map(|v| v.to_json(behavior)).collect(),
            FieldValue::Object(object) => object.to_json(behavior),
        }
    }
}

impl ObjectValue {
    /// Renders the object as a JSON object, see [`FieldValue::to_json`].
    pub fn to_json(&self, behavior: ServerTimestampBehavior) -> Value {
        let obj: Map<String, Value> = self
            .fields()
            .map(|(k, v)| (k.to_string(), v.to_json(behavior)))
            .collect();
        Value::Object(obj)
    }
}

impl Document {
    /// Renders the data of the document as a JSON object, see [`FieldValue::to_json`].
    pub fn to_json(&self, behavior: ServerTimestampBehavior) -> Value {
        self.data().to_json(behavior)
    }
}

/// Converts a [`FieldValue`] to a [`serde_json::Value`], rendering pending server timestamps as
/// `null`.
impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        value.to_json(ServerTimestampBehavior::default())
    }
}

/// Converts an [`ObjectValue`] to a [`serde_json::Value`], rendering pending server timestamps
/// as `null`.
impl From<ObjectValue> for Value {
    fn from(value: ObjectValue) -> Self {
        value.to_json(ServerTimestampBehavior::default())
    }
}

#[cfg(feature = "chrono")]
fn timestamp_to_json(v: Timestamp) -> Value {
    v.as_datetime()
        .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
        .into()
}

#[cfg(not(feature = "chrono"))]
fn timestamp_to_json(v: Timestamp) -> Value {
    serde_json::json!({ "seconds": v.seconds(), "nanos": v.nanos() })
}
