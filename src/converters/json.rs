//! JSON payloads
//!
//! Containers become objects, lists become arrays holding the row's single
//! entry, leaf-lists become arrays of one value. Member names are qualified
//! with their module at the top level and wherever the module changes.
//! `empty` leaves are encoded as `[null]`.

use super::base::{ConverterConfig, Element, RowTree, ValueKind};
use super::RowConverter;
use crate::error::Result;
use crate::schema::NodeKind;
use crate::xpath::EMPTY_TRUE;
use serde_json::{Map, Value as JsonValue};

/// Row to JSON converter
#[derive(Debug, Clone, Default)]
pub struct JsonConverter {
    config: ConverterConfig,
}

impl JsonConverter {
    /// Create a converter with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with the given configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Build the JSON value of a row tree
    pub fn to_value(&self, tree: &RowTree) -> JsonValue {
        JsonValue::Object(self.members(&tree.roots, None))
    }

    fn members(&self, elements: &[Element], parent_module: Option<&str>) -> Map<String, JsonValue> {
        let mut map = Map::new();
        for element in elements {
            let qualify = parent_module != Some(element.module.as_str());
            let name = if self.config.qualified_names() && qualify {
                format!("{}:{}", element.module, element.name)
            } else {
                element.name.clone()
            };
            map.insert(name, self.element(element));
        }
        map
    }

    fn element(&self, element: &Element) -> JsonValue {
        match element.kind {
            NodeKind::Leaf => scalar(element),
            NodeKind::LeafList => JsonValue::Array(vec![scalar(element)]),
            NodeKind::List => JsonValue::Array(vec![JsonValue::Object(
                self.members(&element.children, Some(element.module.as_str())),
            )]),
            _ => JsonValue::Object(self.members(&element.children, Some(element.module.as_str()))),
        }
    }
}

fn scalar(element: &Element) -> JsonValue {
    let Some(value) = element.value.as_deref() else {
        return JsonValue::Null;
    };
    if value == EMPTY_TRUE || element.value_kind == ValueKind::Empty {
        return JsonValue::Array(vec![JsonValue::Null]);
    }
    match element.value_kind {
        ValueKind::Number => value
            .parse::<i64>()
            .map(JsonValue::from)
            .unwrap_or_else(|_| JsonValue::String(value.to_string())),
        ValueKind::Bool => match value {
            "true" => JsonValue::Bool(true),
            "false" => JsonValue::Bool(false),
            other => JsonValue::String(other.to_string()),
        },
        _ => JsonValue::String(value.to_string()),
    }
}

impl RowConverter for JsonConverter {
    fn render(&self, tree: &RowTree) -> Result<String> {
        let value = self.to_value(tree);
        let text = if self.config.indent() > 0 {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    fn media_type(&self) -> &'static str {
        "application/yang-data+json"
    }
}
