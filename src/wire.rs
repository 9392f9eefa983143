//! Outbound serialization: turning typed parameters and request bodies into
//! camelCase JSON.
//!
//! Values implement [`IntoWire`]. Typed payloads implement [`Payload`] (usually
//! through the [`payload!`](crate::payload) macro), which walks an explicit field
//! table, drops absent fields and renames the rest with
//! [`to_camel`](crate::case::to_camel). A [`Serializer`] is the client-level
//! entry point; the default [`SnakeToCamel`] serializer also camel-cases any
//! keys of raw maps handed in directly.

use crate::case::to_camel;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Conversion of an outbound value into its wire form.
///
/// Scalars pass through, sequences map element-wise, maps recurse over their
/// values and typed payloads/records serialize their declared fields.
pub trait IntoWire {
    /// Returns the wire representation of `self`.
    fn to_wire(&self) -> Value;
}

macro_rules! scalar_into_wire {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoWire for $ty {
                fn to_wire(&self) -> Value {
                    Value::from(self.clone())
                }
            }
        )*
    };
}

scalar_into_wire!(String, bool, i32, i64, u32, u64, f64);

impl IntoWire for str {
    fn to_wire(&self) -> Value {
        Value::String(self.to_owned())
    }
}

impl IntoWire for Value {
    fn to_wire(&self) -> Value {
        self.clone()
    }
}

impl IntoWire for Map<String, Value> {
    fn to_wire(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T: IntoWire + ?Sized> IntoWire for &T {
    fn to_wire(&self) -> Value {
        (**self).to_wire()
    }
}

impl<T: IntoWire + ?Sized> IntoWire for Box<T> {
    fn to_wire(&self) -> Value {
        (**self).to_wire()
    }
}

impl<T: IntoWire> IntoWire for Option<T> {
    fn to_wire(&self) -> Value {
        self.as_ref().map_or(Value::Null, IntoWire::to_wire)
    }
}

impl<T: IntoWire> IntoWire for [T] {
    fn to_wire(&self) -> Value {
        Value::Array(self.iter().map(IntoWire::to_wire).collect())
    }
}

impl<T: IntoWire> IntoWire for Vec<T> {
    fn to_wire(&self) -> Value {
        self.as_slice().to_wire()
    }
}

impl<T: IntoWire> IntoWire for BTreeMap<String, T> {
    fn to_wire(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_wire()))
                .collect(),
        )
    }
}

impl<T: IntoWire, S> IntoWire for HashMap<String, T, S> {
    fn to_wire(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_wire()))
                .collect(),
        )
    }
}

/// One entry of a payload's field table.
pub struct PayloadField<P> {
    /// The snake_case field name.
    pub name: &'static str,
    /// Returns the field's wire value, or `None` when the field is absent.
    pub get: fn(&P) -> Option<Value>,
}

impl<P> PayloadField<P> {
    /// Returns the camelCase key this field is emitted under.
    pub fn wire_name(&self) -> String {
        to_camel(self.name)
    }
}

/// A typed outbound object (query parameters or a request body).
///
/// Only the fields listed in [`fields`](Payload::fields) are serialized; absent
/// fields are skipped entirely, never emitted as `null`.
pub trait Payload: Sized + 'static {
    /// The ordered field table.
    fn fields() -> &'static [PayloadField<Self>];

    /// Serializes a single field.
    ///
    /// The default applies the generic recursive rule. Override it to give one
    /// field custom treatment; the override takes priority for that field.
    fn serialize_field(&self, field: &PayloadField<Self>) -> Option<Value> {
        (field.get)(self)
    }

    /// Serializes every present field under its camelCase key.
    fn to_wire_map(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for field in Self::fields() {
            if let Some(value) = self.serialize_field(field) {
                out.insert(field.wire_name(), value);
            }
        }
        out
    }
}

/// Recursively converts every map key from snake_case to camelCase.
///
/// # Examples
///
/// ```
/// use camrest::wire::camelize_keys;
/// use serde_json::json;
///
/// let value = camelize_keys(json!({"outer_key": {"inner_key": [{"sort_by": "name"}]}}));
/// assert_eq!(value, json!({"outerKey": {"innerKey": [{"sortBy": "name"}]}}));
/// ```
pub fn camelize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (to_camel(&key), camelize_keys(item)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_keys).collect()),
        other => other,
    }
}

/// Client-level serialization of parameters and bodies.
pub trait Serializer: Send + Sync {
    /// Produces the wire value sent to the engine.
    fn serialize(&self, value: &dyn IntoWire) -> Value;
}

/// The default serializer: field mapping followed by a camelCase pass over all
/// map keys, so typed payloads and raw parameter maps end up in the same form.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeToCamel;

impl Serializer for SnakeToCamel {
    fn serialize(&self, value: &dyn IntoWire) -> Value {
        camelize_keys(value.to_wire())
    }
}

/// A serializer that sends values exactly as their [`IntoWire`] form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Serializer for Identity {
    fn serialize(&self, value: &dyn IntoWire) -> Value {
        value.to_wire()
    }
}

/// Flattens a serialized parameter object into query pairs.
///
/// Strings are used verbatim, numbers and booleans by their JSON text, arrays
/// become repeated keys, nulls are skipped and nested objects are sent as
/// compact JSON. A non-object value yields no pairs.
pub fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = params else {
        return Vec::new();
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = query_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = query_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
