// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Immutable field values and the structured object value of a document.
use super::{DocumentKey, FieldPath};
use crate::timestamp::Timestamp;
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Controls how a pending [`FieldValue::ServerTimestamp`] is presented to the application
/// before the server has assigned the real time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum ServerTimestampBehavior {
    /// Pending server timestamps read as null.
    #[default]
    None,
    /// Pending server timestamps read as the local time of the write.
    Estimate,
    /// Pending server timestamps read as the value the field had before the write.
    Previous,
}

/// A geographical point, in degrees.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}
impl Eq for GeoPoint {}

impl PartialOrd for GeoPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for GeoPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

impl Hash for GeoPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

/// The locally-estimated stand-in for a server timestamp that has not been acknowledged yet.
///
/// Distinct from [`FieldValue::Timestamp`] so readers can tell a confirmed time from an
/// estimate.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct ServerTimestampValue {
    local_write_time: Timestamp,
    previous_value: Option<Box<FieldValue>>,
}

impl ServerTimestampValue {
    pub fn new(local_write_time: Timestamp, previous_value: Option<FieldValue>) -> Self {
        Self {
            local_write_time,
            previous_value: previous_value.map(Box::new),
        }
    }

    /// The local clock reading at the time of the write, used as an estimate.
    pub fn local_write_time(&self) -> Timestamp {
        self.local_write_time
    }

    /// The value the field held before the write, if any.
    pub fn previous_value(&self) -> Option<&FieldValue> {
        self.previous_value.as_deref()
    }
}

/// A single value stored in a document field.
///
/// Equality, ordering, and hashing are total: doubles compare via [`f64::total_cmp`], and
/// `Integer(1)` is a different value from `Double(1.0)`.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    ServerTimestamp(ServerTimestampValue),
    String(String),
    Bytes(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>),
    Reference(DocumentKey),
    GeoPoint(GeoPoint),
    Array(Vec<FieldValue>),
    Object(ObjectValue),
}

impl FieldValue {
    /// When ordering values of different types, we order them according to this order.
    const fn type_order(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Boolean(_) => 1,
            FieldValue::Integer(_) => 2,
            FieldValue::Double(_) => 3,
            FieldValue::Timestamp(_) => 4,
            FieldValue::ServerTimestamp(_) => 5,
            FieldValue::String(_) => 6,
            FieldValue::Bytes(_) => 7,
            FieldValue::Reference(_) => 8,
            FieldValue::GeoPoint(_) => 9,
            FieldValue::Array(_) => 10,
            FieldValue::Object(_) => 11,
        }
    }

    /// A short name for the type of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::ServerTimestamp(_) => "server_timestamp",
            FieldValue::String(_) => "string",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Reference(_) => "reference",
            FieldValue::GeoPoint(_) => "geo_point",
            FieldValue::Array(_) => "array",
            FieldValue::Object(_) => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Double(_))
    }

    /// True for a server timestamp that is still awaiting acknowledgment.
    pub fn is_pending_server_timestamp(&self) -> bool {
        matches!(self, FieldValue::ServerTimestamp(_))
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            FieldValue::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}
impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        // For order of cross-variant comparisons, see [`FieldValue::type_order`].
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Boolean(b1), FieldValue::Boolean(b2)) => b1.cmp(b2),
            (FieldValue::Integer(i1), FieldValue::Integer(i2)) => i1.cmp(i2),
            (FieldValue::Double(d1), FieldValue::Double(d2)) => d1.total_cmp(d2),
            (FieldValue::Timestamp(t1), FieldValue::Timestamp(t2)) => t1.cmp(t2),
            (FieldValue::ServerTimestamp(s1), FieldValue::ServerTimestamp(s2)) => s1.cmp(s2),
            (FieldValue::String(s1), FieldValue::String(s2)) => s1.cmp(s2),
            (FieldValue::Bytes(b1), FieldValue::Bytes(b2)) => b1.cmp(b2),
            (FieldValue::Reference(k1), FieldValue::Reference(k2)) => k1.cmp(k2),
            (FieldValue::GeoPoint(g1), FieldValue::GeoPoint(g2)) => g1.cmp(g2),
            (FieldValue::Array(a1), FieldValue::Array(a2)) => a1.cmp(a2),
            (FieldValue::Object(o1), FieldValue::Object(o2)) => o1.cmp(o2),
            (a, b) => {
                let a_order = a.type_order();
                let b_order = b.type_order();
                debug_assert_ne!(
                    a_order, b_order,
                    "match must handle all comparisons between similar variants"
                );
                a_order.cmp(&b_order)
            }
        }
    }
}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_order().hash(state);
        match self {
            FieldValue::Null => {}
            FieldValue::Boolean(b) => b.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            // total_cmp equality is bitwise equality
            FieldValue::Double(d) => d.to_bits().hash(state),
            FieldValue::Timestamp(t) => t.hash(state),
            FieldValue::ServerTimestamp(s) => s.hash(state),
            FieldValue::String(s) => s.hash(state),
            FieldValue::Bytes(b) => b.hash(state),
            FieldValue::Reference(k) => k.hash(state),
            FieldValue::GeoPoint(g) => g.hash(state),
            FieldValue::Array(a) => a.hash(state),
            FieldValue::Object(o) => o.hash(state),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Boolean(b) => b.fmt(f),
            FieldValue::Integer(i) => i.fmt(f),
            // {:?} always prints a decimal, so 1.0 is not mistaken for the integer 1.
            FieldValue::Double(d) => write!(f, "{d:?}"),
            FieldValue::Timestamp(t) => t.fmt(f),
            FieldValue::ServerTimestamp(s) => write!(f, "pending({})", s.local_write_time),
            FieldValue::String(s) => write!(f, "{s:?}"),
            FieldValue::Bytes(b) => write!(f, "b{b:02X?}"),
            FieldValue::Reference(k) => write!(f, "ref({k})"),
            FieldValue::GeoPoint(g) => write!(f, "geo({:?}, {:?})", g.latitude, g.longitude),
            FieldValue::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    value.fmt(f)?;
                }
                f.write_str("]")
            }
            FieldValue::Object(object) => object.fmt(f),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

macro_rules! impl_from {
(
    $(
        $source:ty => $target:ident $(with $conv:ident)?
    ),* $(,)?
    ) => {
        $(
            impl From<$source> for FieldValue {
                fn from(value: $source) -> Self {
                    Self::$target(impl_from!(value$(, $conv)?))
                }
            }
        )*
    };

    ($value:ident, $conv:ident) => {
        $value.$conv()
    };

    ($value:ident) => {
        $value
    };
}

impl_from!(
    bool          => Boolean,
    i32           => Integer with into,
    i64           => Integer,
    u32           => Integer with into,
    f64           => Double,
    String        => String,
    &str          => String with to_string,
    Vec<u8>       => Bytes,
    &[u8]         => Bytes with into,
    Timestamp     => Timestamp,
    DocumentKey   => Reference,
    GeoPoint      => GeoPoint,
    Vec<FieldValue> => Array,
    ObjectValue   => Object,
);

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// The structured value of a document: a sorted map from field names to [`FieldValue`]s.
///
/// `ObjectValue` is immutable. [`ObjectValue::set`] and [`ObjectValue::delete`] return a new
/// value and leave the receiver untouched; the map at every level is shared behind an [`Arc`]
/// and only the levels along the modified path are copied.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ObjectValue(Arc<BTreeMap<String, FieldValue>>);

impl ObjectValue {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        Self(Arc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the top-level fields in name order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the value at `path`, or `None` if any segment along the way is missing or not
    /// an object.
    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        let (last, parents) = path
            .segments()
            .split_last()
            .expect("field paths have at least one segment");
        let mut current = self;
        for segment in parents {
            current = current.0.get(segment)?.as_object()?;
        }
        current.0.get(last)
    }

    /// Returns a new object with `value` stored at `path`.
    ///
    /// Missing intermediate objects are created, and intermediate values that are not objects
    /// are replaced by objects.
    #[must_use = "set returns a new value and leaves the receiver unchanged"]
    pub fn set(&self, path: &FieldPath, value: FieldValue) -> ObjectValue {
        self.set_segments(path.segments(), value)
    }

    fn set_segments(&self, segments: &[String], value: FieldValue) -> ObjectValue {
        let (first, rest) = segments
            .split_first()
            .expect("field paths have at least one segment");
        let child = if rest.is_empty() {
            value
        } else {
            let nested = match self.0.get(first) {
                Some(FieldValue::Object(object)) => object.set_segments(rest, value),
                _ => ObjectValue::empty().set_segments(rest, value),
            };
            FieldValue::Object(nested)
        };
        let mut fields = BTreeMap::clone(&self.0);
        fields.insert(first.clone(), child);
        Self(Arc::new(fields))
    }

    /// Returns a new object without the field at `path`.
    ///
    /// Deleting a path that does not exist returns an object sharing storage with `self`.
    #[must_use = "delete returns a new value and leaves the receiver unchanged"]
    pub fn delete(&self, path: &FieldPath) -> ObjectValue {
        self.delete_segments(path.segments())
    }

    fn delete_segments(&self, segments: &[String]) -> ObjectValue {
        let (first, rest) = segments
            .split_first()
            .expect("field paths have at least one segment");
        let replacement = if rest.is_empty() {
            if !self.0.contains_key(first) {
                return self.clone();
            }
            None
        } else {
            match self.0.get(first) {
                Some(FieldValue::Object(object)) => {
                    let nested = object.delete_segments(rest);
                    if nested.shares_storage_with(object) {
                        return self.clone();
                    }
                    Some(FieldValue::Object(nested))
                }
                _ => return self.clone(),
            }
        };
        let mut fields = BTreeMap::clone(&self.0);
        match replacement {
            Some(value) => fields.insert(first.clone(), value),
            None => fields.remove(first),
        };
        Self(Arc::new(fields))
    }

    /// True if both values point at the same underlying storage.
    pub fn shares_storage_with(&self, other: &ObjectValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {value}", FieldPath::single(name.as_str()))?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl<K> FromIterator<(K, FieldValue)> for ObjectValue
where
    K: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        Self::from_fields(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_value;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    #[test]
    fn get_walks_nested_objects() {
        let obj = object_value! {
            "a" => { "b" => 1, "c" => "x" },
            "d" => true
        };
        assert_eq!(obj.get(&path("a.b")), Some(&FieldValue::Integer(1)));
        assert_eq!(obj.get(&path("d")), Some(&FieldValue::Boolean(true)));
        assert_eq!(obj.get(&path("a.z")), None);
        // "d" is not an object, so there is nothing below it
        assert_eq!(obj.get(&path("d.e")), None);
    }

    #[test]
    fn set_does_not_modify_receiver() {
        let original = object_value! { "a" => { "b" => 1 } };
        let updated = original.set(&path("a.b"), 2.into());
        assert_eq!(original.get(&path("a.b")), Some(&FieldValue::Integer(1)));
        assert_eq!(updated.get(&path("a.b")), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn set_creates_and_replaces_intermediate_objects() {
        let obj = object_value! { "scalar" => 5 };
        let obj = obj.set(&path("new.nested.leaf"), "v".into());
        assert_eq!(obj.get(&path("new.nested.leaf")), Some(&"v".into()));

        let obj = obj.set(&path("scalar.inner"), FieldValue::Null);
        assert_eq!(obj.get(&path("scalar.inner")), Some(&FieldValue::Null));
        assert!(obj.get(&path("scalar")).unwrap().as_object().is_some());
    }

    #[test]
    fn set_shares_untouched_subtrees() {
        let original = object_value! {
            "left" => { "x" => 1 },
            "right" => { "y" => 2 }
        };
        let updated = original.set(&path("right.y"), 3.into());
        let left_before = original.get(&path("left")).unwrap().as_object().unwrap();
        let left_after = updated.get(&path("left")).unwrap().as_object().unwrap();
        assert!(left_before.shares_storage_with(left_after));
        assert!(!original.shares_storage_with(&updated));
    }

    #[test]
    fn delete_removes_nested_fields() {
        let obj = object_value! { "a" => { "b" => 1, "c" => 2 } };
        let deleted = obj.delete(&path("a.b"));
        assert_eq!(deleted, object_value! { "a" => { "c" => 2 } });
        assert_eq!(obj.get(&path("a.b")), Some(&FieldValue::Integer(1)));
    }

    #[test]
    fn delete_of_missing_path_is_a_noop() {
        let obj = object_value! { "a" => { "b" => 1 }, "s" => "x" };
        assert!(obj.delete(&path("zzz")).shares_storage_with(&obj));
        assert!(obj.delete(&path("a.zzz")).shares_storage_with(&obj));
        assert!(obj.delete(&path("s.deeper")).shares_storage_with(&obj));
    }

    #[test]
    fn integers_and_doubles_are_distinct() {
        assert_ne!(FieldValue::Integer(1), FieldValue::Double(1.0));
        assert!(FieldValue::Integer(i64::MAX) < FieldValue::Double(f64::MIN));
        assert_eq!(FieldValue::Double(f64::NAN), FieldValue::Double(f64::NAN));
    }

    #[test]
    fn display_is_human_readable() {
        let obj = object_value! {
            "a" => [1, 2.5, "three"],
            "e.mail" => FieldValue::Null
        };
        assert_eq!(obj.to_string(), r#"{a: [1, 2.5, "three"], `e.mail`: null}"#);
    }

    #[quickcheck]
    fn set_then_get_returns_value(obj: ObjectValue, path: FieldPath, value: FieldValue) -> bool {
        obj.set(&path, value.clone()).get(&path) == Some(&value)
    }

    #[quickcheck]
    fn set_leaves_unrelated_paths_alone(
        obj: ObjectValue,
        target: FieldPath,
        other: FieldPath,
        value: FieldValue,
    ) -> bool {
        if target.is_prefix_of(&other) || other.is_prefix_of(&target) {
            return true;
        }
        obj.set(&target, value).get(&other) == obj.get(&other)
    }

    #[quickcheck]
    fn hash_is_consistent_with_eq(a: FieldValue, b: FieldValue) -> bool {
        use std::hash::BuildHasher;
        let state = ahash::RandomState::with_seeds(1, 2, 3, 4);
        a != b || state.hash_one(&a) == state.hash_one(&b)
    }
}
