// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating an [`ObjectValue`](crate::model::ObjectValue).
///
/// Values nest with `{ .. }` for objects and `[ .. ]` for arrays. Anything else is an
/// expression converted with [`FieldValue::from`](crate::model::FieldValue).
///
/// ```rust
/// # use pendwrite::{object_value, model::FieldValue};
/// let obj = object_value! {
///     "name" => "alice",
///     "address" => {
///         "city" => "Berlin",
///         "zip" => FieldValue::Null
///     },
///     "tags" => ["a", 1, { "nested" => true }]
/// };
/// assert_eq!(obj.len(), 3);
/// ```
#[macro_export]
macro_rules! object_value {
    () => {
        $crate::model::ObjectValue::empty()
    };
    ($($body:tt)+) => {{
        let mut fields: ::std::vec::Vec<(::std::string::String, $crate::model::FieldValue)> =
            ::std::vec::Vec::new();
        $crate::__object_fields!(fields; $($body)+);
        $crate::model::ObjectValue::from_fields(fields)
    }};
}

/// Convenience macro for creating a single [`FieldValue`](crate::model::FieldValue), with the
/// same syntax as the values of [`object_value!`](crate::object_value).
///
/// ```rust
/// # use pendwrite::{field_value, model::FieldValue};
/// assert_eq!(field_value!(42), FieldValue::Integer(42));
/// assert_eq!(field_value!([1, "x"]).as_array().map(<[_]>::len), Some(2));
/// ```
#[macro_export]
macro_rules! field_value {
    ({ $($inner:tt)* }) => {
        $crate::model::FieldValue::Object($crate::object_value!($($inner)*))
    };
    ([ $($inner:tt)* ]) => {{
        #[allow(unused_mut)]
        let mut values: ::std::vec::Vec<$crate::model::FieldValue> = ::std::vec::Vec::new();
        $crate::__array_values!(values; $($inner)*);
        $crate::model::FieldValue::Array(values)
    }};
    ($value:expr) => {
        $crate::model::FieldValue::from($value)
    };
}

// Helper for munching `key => value` pairs
#[doc(hidden)]
#[macro_export]
macro_rules! __object_fields {
    ($fields:ident;) => {};
    ($fields:ident; $k:literal => { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $fields.push(($k.into(), $crate::field_value!({ $($inner)* })));
        $crate::__object_fields!($fields; $($($rest)*)?);
    };
    ($fields:ident; $k:literal => [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $fields.push(($k.into(), $crate::field_value!([ $($inner)* ])));
        $crate::__object_fields!($fields; $($($rest)*)?);
    };
    ($fields:ident; $k:literal => $v:expr $(, $($rest:tt)*)?) => {
        $fields.push(($k.into(), $crate::field_value!($v)));
        $crate::__object_fields!($fields; $($($rest)*)?);
    };
}

// Helper for munching array elements
#[doc(hidden)]
#[macro_export]
macro_rules! __array_values {
    ($values:ident;) => {};
    ($values:ident; { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $values.push($crate::field_value!({ $($inner)* }));
        $crate::__array_values!($values; $($($rest)*)?);
    };
    ($values:ident; [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $values.push($crate::field_value!([ $($inner)* ]));
        $crate::__array_values!($values; $($($rest)*)?);
    };
    ($values:ident; $v:expr $(, $($rest:tt)*)?) => {
        $values.push($crate::field_value!($v));
        $crate::__array_values!($values; $($($rest)*)?);
    };
}

#[cfg(test)]
mod tests {
    use crate::model::{FieldValue, ObjectValue};

    #[test]
    fn object_value_literal() {
        let obj = object_value! {
            "x" => 1,
            "y" => { "z" => "nested" },
            "list" => [1, [2, 3], { "k" => false }],
            "neg" => -4,
            "none" => FieldValue::Null,
        };
        insta::assert_snapshot!(
            obj,
            @r#"{list: [1, [2, 3], {k: false}], neg: -4, none: null, x: 1, y: {z: "nested"}}"#
        );
    }

    #[test]
    fn empty_literals() {
        assert_eq!(object_value! {}, ObjectValue::empty());
        assert_eq!(field_value!({}), FieldValue::Object(ObjectValue::empty()));
        assert_eq!(field_value!([]), FieldValue::Array(vec![]));
    }
}
