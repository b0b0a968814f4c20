//! Configuration payload converters
//!
//! This module turns walker rows into configuration payloads a device
//! driver can apply:
//! - JSON: objects, arrays for lists and leaf-lists, `[null]` for `empty`
//! - XML: nested elements, empty elements for `empty`

mod base;
mod json;
mod xml;

pub use base::{ConverterConfig, Element, RowTree, ValueKind};
pub use json::JsonConverter;
pub use xml::XmlConverter;

use crate::error::{Error, Result};
use crate::schema::SchemaTree;
use crate::walker::Row;
use std::fmt;
use std::str::FromStr;

/// Trait for converters that render a row as a configuration payload
pub trait RowConverter {
    /// Render an already folded row
    fn render(&self, tree: &RowTree) -> Result<String>;

    /// Media type of the payload
    fn media_type(&self) -> &'static str;

    /// Fold a row and render it
    fn convert(&self, schema: &SchemaTree, row: &Row) -> Result<String> {
        self.render(&RowTree::build(schema, row))
    }
}

/// Converter type enumeration for selecting the payload format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConverterType {
    /// JSON payload
    #[default]
    Json,
    /// XML payload
    Xml,
}

impl fmt::Display for ConverterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterType::Json => write!(f, "json"),
            ConverterType::Xml => write!(f, "xml"),
        }
    }
}

impl FromStr for ConverterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ConverterType::Json),
            "xml" => Ok(ConverterType::Xml),
            other => Err(Error::Value(format!("unknown payload format '{}'", other))),
        }
    }
}

/// Create a converter by type
pub fn create_converter(conv_type: ConverterType, config: ConverterConfig) -> Box<dyn RowConverter> {
    match conv_type {
        ConverterType::Json => Box::new(JsonConverter::with_config(config)),
        ConverterType::Xml => Box::new(XmlConverter::with_config(config)),
    }
}
