//! Schema identifier validation and utilities
//!
//! YANG identifiers start with a letter or underscore and continue with
//! letters, digits, underscores, hyphens and dots. References to definitions
//! in other modules use the `prefix:identifier` form.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

/// Check if a string is a valid identifier
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Check if a string is a valid, optionally prefixed, identifier reference
pub fn is_valid_reference(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_valid_identifier(prefix) && is_valid_identifier(local),
        None => is_valid_identifier(name),
    }
}

/// Validate an identifier and return an error if invalid
pub fn validate_identifier(name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Error::Value(format!("Invalid identifier: '{}'", name)))
    }
}

/// Validate a prefixed identifier reference and return an error if invalid
pub fn validate_reference(name: &str) -> Result<()> {
    if is_valid_reference(name) {
        Ok(())
    } else {
        Err(Error::Value(format!("Invalid identifier reference: '{}'", name)))
    }
}

/// Split a reference into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Strip a prefix from a reference, keeping only the local name
pub fn local_name(qname: &str) -> &str {
    split_qname(qname).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("interface"));
        assert!(is_valid_identifier("mtu-size"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("ip.v4"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1st"));
        assert!(!is_valid_identifier("-dash"));
        assert!(!is_valid_identifier("if:name"));
    }

    #[test]
    fn test_is_valid_reference() {
        assert!(is_valid_reference("name"));
        assert!(is_valid_reference("if:name"));

        assert!(!is_valid_reference(":name"));
        assert!(!is_valid_reference("if:"));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("mtu"), (None, "mtu"));
        assert_eq!(split_qname("if:mtu"), (Some("if"), "mtu"));
        assert_eq!(local_name("if:mtu"), "mtu");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("speed").is_ok());
        assert!(validate_identifier("9speed").is_err());
        assert!(validate_reference("a:b:c").is_err());
    }
}
