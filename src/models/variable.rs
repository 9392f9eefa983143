use crate::record::Record;
use crate::wire::{camelize_keys, IntoWire, Payload, PayloadField};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

crate::record! {
    /// Serialization metadata attached to a variable value.
    pub struct VariableValueInfo {
        object_type_name: String,
        serialization_data_format: String,
        filename: String,
        mimetype: String,
        encoding: String,
        transient: bool,
    }
}

crate::record! {
    /// A variable as returned by the engine.
    pub struct Variable {
        value: Value,
        kind as "type": String,
        value_info: VariableValueInfo,
    }
}

/// Value metadata for an outbound variable: typed, or a free-form map.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInfo {
    /// Declared metadata fields.
    Typed(VariableValueInfo),
    /// Arbitrary metadata keys, sent camel-cased.
    Map(Map<String, Value>),
}

impl From<VariableValueInfo> for ValueInfo {
    fn from(info: VariableValueInfo) -> Self {
        ValueInfo::Typed(info)
    }
}

impl From<Map<String, Value>> for ValueInfo {
    fn from(map: Map<String, Value>) -> Self {
        ValueInfo::Map(map)
    }
}

impl IntoWire for ValueInfo {
    fn to_wire(&self) -> Value {
        match self {
            ValueInfo::Typed(info) => info.to_wire(),
            ValueInfo::Map(map) => Value::Object(map.clone()),
        }
    }
}

/// Payload used to create or update a variable.
///
/// `value` is always sent, even when it is JSON `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariablePayload {
    /// The variable value. `null` clears the variable.
    pub value: Value,
    /// The engine type name, sent as `type`.
    pub kind: Option<String>,
    /// Serialization metadata, sent as `valueInfo`.
    pub value_info: Option<ValueInfo>,
}

impl VariablePayload {
    /// Creates a payload carrying just a value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Sets the engine type name, e.g. `String` or `Json`.
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the value metadata.
    pub fn with_value_info(mut self, info: impl Into<ValueInfo>) -> Self {
        self.value_info = Some(info.into());
        self
    }
}

static VARIABLE_PAYLOAD_FIELDS: &[PayloadField<VariablePayload>] = &[
    PayloadField {
        name: "value",
        get: |payload: &VariablePayload| Some(payload.value.clone()),
    },
    PayloadField {
        name: "type",
        get: |payload: &VariablePayload| payload.kind.as_ref().map(IntoWire::to_wire),
    },
    PayloadField {
        name: "value_info",
        get: |payload: &VariablePayload| payload.value_info.as_ref().map(IntoWire::to_wire),
    },
];

impl Payload for VariablePayload {
    fn fields() -> &'static [PayloadField<Self>] {
        VARIABLE_PAYLOAD_FIELDS
    }

    // Value info goes out camel-cased whether it was typed or free-form.
    fn serialize_field(&self, field: &PayloadField<Self>) -> Option<Value> {
        if field.name != "value_info" {
            return (field.get)(self);
        }
        match self.value_info.as_ref()? {
            ValueInfo::Map(map) => Some(camelize_keys(Value::Object(map.clone()))),
            ValueInfo::Typed(info) => {
                let declared = VariableValueInfo::fields()
                    .iter()
                    .filter_map(|f| (f.get)(info).map(|value| (f.wire_name(), value)))
                    .collect();
                Some(Value::Object(declared))
            }
        }
    }
}

impl IntoWire for VariablePayload {
    fn to_wire(&self) -> Value {
        Value::Object(self.to_wire_map())
    }
}

crate::payload! {
    /// Payload used to modify and/or delete several variables at once.
    pub struct VariableModificationRequest {
        modifications: BTreeMap<String, VariablePayload>,
        deletions: Vec<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Serializer, SnakeToCamel};
    use serde_json::json;

    #[test]
    fn test_variable_decode_with_value_info() {
        let variable = Variable::decode(&json!({
            "value": {"amount": 10},
            "type": "Json",
            "valueInfo": {"objectTypeName": "com.example.Order", "serializationDataFormat": "application/json"},
        }))
        .unwrap();
        assert_eq!(variable.value, Some(json!({"amount": 10})));
        assert_eq!(variable.kind.as_deref(), Some("Json"));
        let info = variable.value_info.unwrap();
        assert_eq!(info.object_type_name.as_deref(), Some("com.example.Order"));
        assert_eq!(info.serialization_data_format.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_payload_value_always_sent() {
        let payload = VariablePayload::new(Value::Null);
        assert_eq!(payload.to_wire(), json!({"value": null}));
    }

    #[test]
    fn test_payload_typed_value_info() {
        let payload = VariablePayload::new("a.txt")
            .with_type("File")
            .with_value_info(VariableValueInfo {
                mimetype: Some("text/plain".to_string()),
                object_type_name: Some("java.io.File".to_string()),
                ..Default::default()
            });
        assert_eq!(
            payload.to_wire(),
            json!({
                "value": "a.txt",
                "type": "File",
                "valueInfo": {"objectTypeName": "java.io.File", "mimetype": "text/plain"},
            })
        );
    }

    #[test]
    fn test_payload_map_value_info_camelized_by_hook() {
        let mut info = Map::new();
        info.insert("object_type_name".to_string(), json!("java.util.ArrayList"));
        let payload = VariablePayload::new(json!([1, 2])).with_value_info(info);
        let wire = payload.to_wire_map();
        assert_eq!(wire["valueInfo"], json!({"objectTypeName": "java.util.ArrayList"}));
    }

    #[test]
    fn test_modification_request() {
        let mut modifications = BTreeMap::new();
        modifications.insert(
            "amount".to_string(),
            VariablePayload::new(42).with_type("Integer"),
        );
        let request = VariableModificationRequest {
            modifications: Some(modifications),
            deletions: Some(vec!["obsolete".to_string()]),
        };
        assert_eq!(
            SnakeToCamel.serialize(&request),
            json!({
                "modifications": {"amount": {"value": 42, "type": "Integer"}},
                "deletions": ["obsolete"],
            })
        );
    }
}
