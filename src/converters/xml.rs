//! XML payloads
//!
//! Elements follow the instance-data shape of the row. `empty` leaves are
//! written as empty elements. The payload is wrapped in the configured root
//! element (`<config>` by default).

use super::base::{ConverterConfig, Element, RowTree, ValueKind};
use super::RowConverter;
use crate::error::{Error, Result};
use crate::xpath::EMPTY_TRUE;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Row to XML converter
#[derive(Debug, Clone, Default)]
pub struct XmlConverter {
    config: ConverterConfig,
}

impl XmlConverter {
    /// Create a converter with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with the given configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    fn write_element<W: std::io::Write>(&self, writer: &mut Writer<W>, element: &Element) -> Result<()> {
        let name = element.name.as_str();
        let empty = element.value_kind == ValueKind::Empty
            || element.value.as_deref() == Some(EMPTY_TRUE);
        match &element.value {
            Some(_) if empty => {
                writer.write_event(Event::Empty(BytesStart::new(name)))?;
            }
            Some(value) => {
                writer.write_event(Event::Start(BytesStart::new(name)))?;
                writer.write_event(Event::Text(BytesText::new(value)))?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            None if element.children.is_empty() => {
                writer.write_event(Event::Empty(BytesStart::new(name)))?;
            }
            None => {
                writer.write_event(Event::Start(BytesStart::new(name)))?;
                for child in &element.children {
                    self.write_element(writer, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
        }
        Ok(())
    }
}

impl RowConverter for XmlConverter {
    fn render(&self, tree: &RowTree) -> Result<String> {
        let mut writer = if self.config.indent() > 0 {
            Writer::new_with_indent(Vec::new(), b' ', self.config.indent())
        } else {
            Writer::new(Vec::new())
        };
        match self.config.root_tag() {
            Some(root) => {
                writer.write_event(Event::Start(BytesStart::new(root)))?;
                for element in &tree.roots {
                    self.write_element(&mut writer, element)?;
                }
                writer.write_event(Event::End(BytesEnd::new(root)))?;
            }
            None => {
                for element in &tree.roots {
                    self.write_element(&mut writer, element)?;
                }
            }
        }
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }

    fn media_type(&self) -> &'static str {
        "application/yang-data+xml"
    }
}
