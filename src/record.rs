//! Inbound deserialization: mapping engine JSON onto typed records.
//!
//! A [`Record`] declares its fields through an explicit static table of
//! [`Field`] entries. Decoding snake-cases every incoming key, keeps only the
//! declared fields, recursively decodes nested records and stores the full
//! normalized payload alongside the typed view, so unknown keys survive a
//! decode/encode round trip.
//!
//! Records are normally declared with the [`record!`](crate::record) macro,
//! which generates the struct, its field table and the wire conversions.

use crate::case::to_snake;
use crate::error::{json_type, DecodeError};
use serde_json::{Map, Value};

/// Conversion of a wire value into a field value.
///
/// JSON `null` never reaches this trait: it always decodes to an absent field.
pub trait FromWire: Sized {
    /// `true` for record types, whose values are decoded recursively.
    const NESTED: bool = false;

    /// Converts a non-null wire value.
    fn from_wire(value: Value) -> Result<Self, DecodeError>;
}

macro_rules! scalar_from_wire {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromWire for $ty {
                fn from_wire(value: Value) -> Result<Self, DecodeError> {
                    serde_json::from_value(value).map_err(|e| DecodeError::InvalidValue {
                        message: e.to_string(),
                    })
                }
            }
        )*
    };
}

scalar_from_wire!(String, bool, i32, i64, u32, u64, f64);

impl FromWire for Value {
    fn from_wire(value: Value) -> Result<Self, DecodeError> {
        Ok(value)
    }
}

impl FromWire for Map<String, Value> {
    fn from_wire(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(map) => Ok(map),
            other => Err(DecodeError::InvalidValue {
                message: format!("expected an object, found {}", json_type(&other)),
            }),
        }
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_wire).collect(),
            other => Err(DecodeError::InvalidValue {
                message: format!("expected an array, found {}", json_type(&other)),
            }),
        }
    }
}

/// One entry of a record's field table.
pub struct Field<R> {
    /// The snake_case field name, which is also the normalized payload key.
    pub name: &'static str,
    /// Whether the field's type is itself a record.
    pub nested: bool,
    /// Returns the field's encoded value, or `None` when absent.
    pub get: fn(&R) -> Option<Value>,
    /// Decodes a wire value into the field.
    pub set: fn(&mut R, Value) -> Result<(), DecodeError>,
}

impl<R> Field<R> {
    /// Returns the camelCase key the engine uses for this field.
    pub fn wire_name(&self) -> String {
        crate::case::to_camel(self.name)
    }
}

/// A statically declared set of optional fields plus the raw payload it was
/// decoded from.
///
/// Records are immutable snapshots: each decode builds a fresh value, and nested
/// records are owned by their parent.
pub trait Record: Default + Sized + 'static {
    /// Type name used in error messages.
    const NAME: &'static str;

    /// The ordered field table.
    fn fields() -> &'static [Field<Self>];

    /// The full, key-normalized payload captured at decode time.
    fn raw(&self) -> &Map<String, Value>;

    /// Replaces the captured payload.
    fn set_raw(&mut self, raw: Map<String, Value>);

    /// Decodes a record from a wire value, which must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ExpectedObject`] for non-object input, or a field
    /// error when a declared field holds a value of the wrong type.
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(map) => Self::decode_map(map),
            other => Err(DecodeError::ExpectedObject {
                context: Self::NAME.to_string(),
                found: json_type(other),
            }),
        }
    }

    /// Decodes a record from a JSON object.
    ///
    /// # Errors
    ///
    /// See [`Record::decode`].
    fn decode_map(map: &Map<String, Value>) -> Result<Self, DecodeError> {
        let normalized = normalize_keys(map);
        let mut record = Self::default();

        for field in Self::fields() {
            let Some(value) = normalized.get(field.name) else {
                continue;
            };
            if field.nested && !(value.is_object() || value.is_null()) {
                return Err(DecodeError::ExpectedObject {
                    context: format!("{}.{}", Self::NAME, field.name),
                    found: json_type(value),
                });
            }
            (field.set)(&mut record, value.clone())?;
        }

        record.set_raw(normalized);
        Ok(record)
    }

    /// Encodes the record back into a JSON object.
    ///
    /// The captured payload is the base; every present field overwrites its
    /// normalized key, nested records encoding recursively. Keys the record does
    /// not declare are carried through untouched.
    fn encode(&self) -> Map<String, Value> {
        let mut data = self.raw().clone();
        for field in Self::fields() {
            if let Some(value) = (field.get)(self) {
                data.insert(field.name.to_string(), value);
            }
        }
        data
    }
}

/// Snake-cases every top-level key of `map`, leaving values untouched.
///
/// When two keys normalize to the same name the later one wins.
pub fn normalize_keys(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (to_snake(key), value.clone()))
        .collect()
}

/// Decodes one field value, attaching the record and field name to type errors.
///
/// Used by the code generated with [`record!`](crate::record).
#[doc(hidden)]
pub fn decode_field<T: FromWire>(
    record: &'static str,
    field: &'static str,
    value: Value,
) -> Result<Option<T>, DecodeError> {
    if value.is_null() {
        return Ok(None);
    }
    T::from_wire(value).map(Some).map_err(|e| match e {
        DecodeError::InvalidValue { message } => DecodeError::InvalidField {
            record,
            field,
            message,
        },
        nested => nested,
    })
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $key:literal) => {
        $key
    };
}

/// Declares a [`Record`](crate::record::Record) type.
///
/// Every listed field becomes `pub field: Option<T>`, and a `raw` map holds the
/// normalized payload. A field may be given a different payload key with
/// `field as "key"`, for names that are Rust keywords.
///
/// # Examples
///
/// ```
/// use camrest::record::Record;
/// use serde_json::json;
///
/// camrest::record! {
///     /// A user as returned by the engine.
///     pub struct User {
///         first_name: String,
///         kind as "type": String,
///     }
/// }
///
/// let user = User::decode(&json!({"firstName": "John", "type": "admin", "extra": 1}))?;
/// assert_eq!(user.first_name.as_deref(), Some("John"));
/// assert_eq!(user.kind.as_deref(), Some("admin"));
/// assert!(user.raw.contains_key("extra"));
/// # Ok::<(), camrest::DecodeError>(())
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident $(as $key:literal)? : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: ::std::option::Option<$ty>,
            )*
            /// The full, key-normalized payload this value was decoded from.
            pub raw: $crate::__private::Map<::std::string::String, $crate::__private::Value>,
        }

        impl $crate::record::Record for $name {
            const NAME: &'static str = stringify!($name);

            fn fields() -> &'static [$crate::record::Field<Self>] {
                static FIELDS: &[$crate::record::Field<$name>] = &[
                    $(
                        $crate::record::Field {
                            name: $crate::__field_name!($field $(, $key)?),
                            nested: <$ty as $crate::record::FromWire>::NESTED,
                            get: |record: &$name| {
                                record.$field.as_ref().map($crate::wire::IntoWire::to_wire)
                            },
                            set: |record: &mut $name, value: $crate::__private::Value| {
                                record.$field = $crate::record::decode_field::<$ty>(
                                    stringify!($name),
                                    $crate::__field_name!($field $(, $key)?),
                                    value,
                                )?;
                                Ok(())
                            },
                        },
                    )*
                ];
                FIELDS
            }

            fn raw(&self) -> &$crate::__private::Map<::std::string::String, $crate::__private::Value> {
                &self.raw
            }

            fn set_raw(
                &mut self,
                raw: $crate::__private::Map<::std::string::String, $crate::__private::Value>,
            ) {
                self.raw = raw;
            }
        }

        impl $crate::record::FromWire for $name {
            const NESTED: bool = true;

            fn from_wire(
                value: $crate::__private::Value,
            ) -> ::std::result::Result<Self, $crate::DecodeError> {
                <Self as $crate::record::Record>::decode(&value)
            }
        }

        impl $crate::wire::IntoWire for $name {
            fn to_wire(&self) -> $crate::__private::Value {
                $crate::__private::Value::Object($crate::record::Record::encode(self))
            }
        }
    };
}

/// Declares a [`Payload`](crate::wire::Payload) type for outbound parameters or
/// request bodies.
///
/// Every listed field becomes `pub field: Option<T>`; `None` fields are left out
/// of the serialized object.
///
/// # Examples
///
/// ```
/// use camrest::wire::IntoWire;
/// use serde_json::json;
///
/// camrest::payload! {
///     pub struct ListParams {
///         sort_by: String,
///         max_results: i64,
///     }
/// }
///
/// let params = ListParams { sort_by: Some("created".into()), max_results: None };
/// assert_eq!(params.to_wire(), json!({"sortBy": "created"}));
/// ```
#[macro_export]
macro_rules! payload {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: ::std::option::Option<$ty>,
            )*
        }

        impl $crate::wire::Payload for $name {
            fn fields() -> &'static [$crate::wire::PayloadField<Self>] {
                static FIELDS: &[$crate::wire::PayloadField<$name>] = &[
                    $(
                        $crate::wire::PayloadField {
                            name: stringify!($field),
                            get: |payload: &$name| {
                                payload.$field.as_ref().map($crate::wire::IntoWire::to_wire)
                            },
                        },
                    )*
                ];
                FIELDS
            }
        }

        impl $crate::wire::IntoWire for $name {
            fn to_wire(&self) -> $crate::__private::Value {
                $crate::__private::Value::Object($crate::wire::Payload::to_wire_map(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    crate::record! {
        struct Person {
            first_name: String,
            last_name: String,
            age: i64,
        }
    }

    crate::record! {
        struct InnerRecord {
            value: String,
        }
    }

    crate::record! {
        struct OuterRecord {
            inner: InnerRecord,
            children: Vec<InnerRecord>,
        }
    }

    #[test]
    fn test_decode_converts_keys() {
        let person = Person::decode(&json!({"firstName": "John", "lastName": "Doe"})).unwrap();
        assert_eq!(person.first_name.as_deref(), Some("John"));
        assert_eq!(person.last_name.as_deref(), Some("Doe"));
        assert_eq!(person.age, None);
    }

    #[test]
    fn test_unknown_keys_kept_in_raw_only() {
        let person = Person::decode(&json!({"firstName": "John", "extra": "data"})).unwrap();
        assert_eq!(person.first_name.as_deref(), Some("John"));
        assert_eq!(person.raw.get("first_name"), Some(&json!("John")));
        assert_eq!(person.raw.get("extra"), Some(&json!("data")));
    }

    #[test]
    fn test_round_trip_preserves_unknown_keys() {
        let person = Person::decode(&json!({"firstName": "John", "extra": "data"})).unwrap();
        let encoded = person.encode();
        assert_eq!(encoded.get("first_name"), Some(&json!("John")));
        assert_eq!(encoded.get("extra"), Some(&json!("data")));
        assert!(!encoded.contains_key("last_name"));
    }

    #[test]
    fn test_nested_record_decoded() {
        let outer = OuterRecord::decode(&json!({"inner": {"value": "nested"}})).unwrap();
        let inner = outer.inner.as_ref().unwrap();
        assert_eq!(inner.value.as_deref(), Some("nested"));
        assert_eq!(inner.raw.get("value"), Some(&json!("nested")));

        let encoded = outer.encode();
        assert_eq!(encoded["inner"], json!({"value": "nested"}));
    }

    #[test]
    fn test_nested_record_list_decoded() {
        let outer =
            OuterRecord::decode(&json!({"children": [{"value": "a"}, {"value": "b"}]})).unwrap();
        let children = outer.children.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].value.as_deref(), Some("b"));
    }

    #[test]
    fn test_nested_non_object_rejected() {
        let err = OuterRecord::decode(&json!({"inner": "flat"})).unwrap_err();
        assert_eq!(
            err,
            DecodeError::ExpectedObject {
                context: "OuterRecord.inner".to_string(),
                found: "string",
            }
        );
    }

    #[test]
    fn test_null_field_is_absent() {
        let person = Person::decode(&json!({"firstName": null, "age": 0})).unwrap();
        assert_eq!(person.first_name, None);
        assert_eq!(person.age, Some(0));
        assert!(person.raw.contains_key("first_name"));
    }

    #[test]
    fn test_field_type_mismatch() {
        let err = Person::decode(&json!({"age": "forty"})).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidField { record: "Person", field: "age", .. }
        ));
    }

    #[test]
    fn test_decode_requires_object() {
        let err = Person::decode(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, DecodeError::ExpectedObject { found: "array", .. }));
    }

    #[test]
    fn test_empty_object() {
        let person = Person::decode(&json!({})).unwrap();
        assert_eq!(person, Person::default());
        assert!(person.encode().is_empty());
    }

    #[test]
    fn test_absent_fields_not_encoded() {
        let person = Person {
            first_name: Some("yes".to_string()),
            ..Default::default()
        };
        let encoded = person.encode();
        assert!(encoded.contains_key("first_name"));
        assert!(!encoded.contains_key("last_name"));
    }

    #[test]
    fn test_field_table_metadata() {
        let fields = OuterRecord::fields();
        assert_eq!(fields.len(), 2);
        assert!(fields[0].nested);
        assert!(!fields[1].nested);
        assert_eq!(Person::fields()[0].wire_name(), "firstName");
    }
}
