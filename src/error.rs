//! Error types for cfgwalk
//!
//! This module defines all error types used throughout the library.
//! Structural and configuration problems (missing override data, unresolved
//! types, malformed schema input) are fatal. Constraint-driven invalidation
//! during a walk is normal operation and never surfaces here.

use std::fmt;
use thiserror::Error;

/// Result type alias using cfgwalk Error
pub type Result<T> = std::result::Result<T, Error>;

/// Override map consulted when a lookup fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    /// `pattern_map`: pattern text to explicit values
    Pattern,
    /// `xpath_map`: condition text to an external evaluation
    XPath,
    /// `type_map`: type name to explicit values
    Type,
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKind::Pattern => write!(f, "pattern_map"),
            MapKind::XPath => write!(f, "xpath_map"),
            MapKind::Type => write!(f, "type_map"),
        }
    }
}

/// Main error type for cfgwalk operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required override entry is absent
    #[error("missing {map} entry for '{key}' (needed by {node})")]
    MissingMapEntry {
        /// Map that was consulted
        map: MapKind,
        /// Key that was looked up
        key: String,
        /// Schema path of the node that needed it
        node: String,
    },

    /// Type could not be resolved to a synthesizable domain
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Structural defect in the schema input
    #[error("malformed schema input: {0}")]
    MalformedInput(#[from] ParseError),

    /// Value error (malformed facet or setting)
    #[error("value error: {0}")]
    Value(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a malformed-input error with just a message
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput(ParseError::new(message))
    }

    /// Whether this error was raised by a missing override entry
    pub fn is_missing_entry(&self) -> bool {
        matches!(self, Error::MissingMapEntry { .. })
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Schema construction error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Schema path of the offending node
    pub location: Option<String>,
    /// Position in the input document (`file:row:col`)
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Attach the schema path of the offending node
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Attach the document position
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(src) = &self.source {
            write!(f, "{}: ", src)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " (at {})", loc)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("duplicate schema path '/a/b'")
            .with_location("/a/b")
            .with_source("demo.yin:12:5");

        assert_eq!(
            err.to_string(),
            "demo.yin:12:5: duplicate schema path '/a/b' (at /a/b)"
        );
    }

    #[test]
    fn test_missing_entry_display() {
        let err = Error::MissingMapEntry {
            map: MapKind::Pattern,
            key: "[a-z]+".to_string(),
            node: "/sys/hostname".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pattern_map"));
        assert!(msg.contains("[a-z]+"));
        assert!(msg.contains("/sys/hostname"));
        assert!(err.is_missing_entry());
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ParseError::new("test").into();
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
