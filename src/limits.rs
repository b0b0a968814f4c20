//! Limits and constraints for schema loading and walking
//!
//! This module defines limits that keep a walk bounded even when the schema
//! input is hostile or pathological (deep `uses` recursion, huge value
//! domains, walks that never settle).

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting depth of schema statements (includes `uses` expansion)
    pub max_schema_depth: usize,

    /// Maximum number of schema nodes in one tree
    pub max_schema_nodes: usize,

    /// Maximum number of candidates in one value domain
    pub max_domain_size: usize,

    /// Maximum number of walk rounds per session
    pub max_rounds: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_schema_depth: 64,
            max_schema_nodes: 200_000,
            max_domain_size: 4096,
            max_rounds: 1_000_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_schema_depth: 16,
            max_schema_nodes: 10_000,
            max_domain_size: 256,
            max_rounds: 10_000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_schema_depth: 512,
            max_schema_nodes: 10_000_000,
            max_domain_size: 1 << 20,
            max_rounds: 100_000_000,
        }
    }

    /// Check if schema depth is within limits
    pub fn check_schema_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_schema_depth {
            Err(Error::LimitExceeded(format!(
                "Schema depth {} exceeds maximum {}",
                depth, self.max_schema_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of schema nodes is within limits
    pub fn check_schema_nodes(&self, count: usize) -> Result<()> {
        if count > self.max_schema_nodes {
            Err(Error::LimitExceeded(format!(
                "Schema node count {} exceeds maximum {}",
                count, self.max_schema_nodes
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a value domain size is within limits
    pub fn check_domain_size(&self, size: usize, path: &str) -> Result<()> {
        if size > self.max_domain_size {
            Err(Error::LimitExceeded(format!(
                "Value domain of '{}' has {} candidates, maximum is {}",
                path, size, self.max_domain_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the walk round count is within limits
    pub fn check_rounds(&self, rounds: usize) -> Result<()> {
        if rounds > self.max_rounds {
            Err(Error::LimitExceeded(format!(
                "Walk round count {} exceeds maximum {}",
                rounds, self.max_rounds
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_schema_depth, 64);
        assert!(limits.check_schema_depth(10).is_ok());
        assert!(limits.check_schema_depth(100).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_rounds < Limits::default().max_rounds);
        assert!(limits.check_rounds(20_000).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.max_schema_depth > Limits::default().max_schema_depth);
        assert!(limits.check_domain_size(100_000, "/a").is_ok());
    }

    #[test]
    fn test_check_domain_size_names_path() {
        let err = Limits::strict().check_domain_size(1000, "/sys/mtu").unwrap_err();
        assert!(err.to_string().contains("/sys/mtu"));
    }
}
