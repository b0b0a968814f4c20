//! Walk settings and override maps
//!
//! [`Overrides`] carries the five injectable maps that steer domain synthesis
//! and pruning. They can be built in code or loaded from a JSON document:
//!
//! ```json
//! {
//!   "type_map":    { "ietf-inet-types:ipv4-address": ["10.0.0.1"] },
//!   "pattern_map": { "[a-z]+[0-9]": ["eth0"] },
//!   "leaf_map":    { "/system/hostname": ["r1", "r2"] },
//!   "avoid_map":   ["/system/debug", "secret"],
//!   "xpath_map":   { "count(../peer) > 0": "../peer", "derived-from(.)": true }
//! }
//! ```
//!
//! `avoid_map` may also be an object; only its keys matter. In `xpath_map` a
//! boolean fixes the result and a string is an equivalent simple expression.
//! Callbacks can only be registered in code.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::schema::SchemaNode;
use crate::xpath::XPathOverride;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::path::Path;

/// Injectable override maps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// Type name, schema path or data path to explicit values
    pub type_map: IndexMap<String, Vec<String>>,
    /// Pattern text to explicit values
    pub pattern_map: IndexMap<String, Vec<String>>,
    /// Leaf path (schema or data) to explicit values; highest priority
    pub leaf_map: IndexMap<String, Vec<String>>,
    /// Paths or names whose nodes are never walked
    pub avoid_map: IndexSet<String>,
    /// Condition text to external evaluation
    pub xpath_map: IndexMap<String, XPathOverride>,
}

impl Overrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `type_map` entry
    pub fn with_type<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_map
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add a `pattern_map` entry
    pub fn with_pattern<I, S>(mut self, pattern: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pattern_map
            .insert(pattern.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add a `leaf_map` entry
    pub fn with_leaf<I, S>(mut self, path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leaf_map
            .insert(path.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add an `avoid_map` entry
    pub fn avoid(mut self, key: impl Into<String>) -> Self {
        self.avoid_map.insert(key.into());
        self
    }

    /// Add an `xpath_map` entry
    pub fn with_xpath(mut self, expression: impl Into<String>, value: XPathOverride) -> Self {
        self.xpath_map.insert(expression.into(), value);
        self
    }

    /// Entries of `other` replace entries of `self` with the same key
    pub fn merge(&mut self, other: Overrides) {
        self.type_map.extend(other.type_map);
        self.pattern_map.extend(other.pattern_map);
        self.leaf_map.extend(other.leaf_map);
        self.avoid_map.extend(other.avoid_map);
        self.xpath_map.extend(other.xpath_map);
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// `leaf_map` values for a node, by schema path then data path
    pub fn leaf_values(&self, node: &SchemaNode) -> Option<&[String]> {
        self.leaf_map
            .get(&node.path)
            .or_else(|| self.leaf_map.get(&node.data_path))
            .map(Vec::as_slice)
    }

    /// `type_map` values keyed by a node's schema path or data path
    pub fn type_values_for_node(&self, node: &SchemaNode) -> Option<&[String]> {
        self.type_map
            .get(&node.path)
            .or_else(|| self.type_map.get(&node.data_path))
            .map(Vec::as_slice)
    }

    /// `type_map` values keyed by type name
    pub fn type_values(&self, name: &str) -> Option<&[String]> {
        self.type_map.get(name).map(Vec::as_slice)
    }

    /// `pattern_map` values for a pattern
    pub fn pattern_values(&self, pattern: &str) -> Option<&[String]> {
        self.pattern_map.get(pattern).map(Vec::as_slice)
    }

    /// Whether `avoid_map` names this node by schema path, data path or name
    pub fn is_avoided(&self, node: &SchemaNode) -> bool {
        self.avoid_map.contains(&node.path)
            || self.avoid_map.contains(&node.data_path)
            || self.avoid_map.contains(&node.name)
    }

    // =========================================================================
    // JSON
    // =========================================================================

    /// Parse overrides from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: OverridesFile = serde_json::from_str(json)?;
        file.into_overrides()
    }

    /// Load overrides from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading overrides");
        Self::from_json_str(&text)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OverridesFile {
    type_map: IndexMap<String, Vec<Scalar>>,
    pattern_map: IndexMap<String, Vec<Scalar>>,
    leaf_map: IndexMap<String, Vec<Scalar>>,
    avoid_map: AvoidList,
    xpath_map: IndexMap<String, XPathEntry>,
}

/// Values may be written as JSON strings, numbers or booleans
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AvoidList {
    List(Vec<String>),
    Map(IndexMap<String, serde_json::Value>),
}

impl Default for AvoidList {
    fn default() -> Self {
        AvoidList::List(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum XPathEntry {
    Fixed(bool),
    Rewrite(String),
}

impl OverridesFile {
    fn into_overrides(self) -> Result<Overrides> {
        fn values(
            map: IndexMap<String, Vec<Scalar>>,
            name: &str,
        ) -> Result<IndexMap<String, Vec<String>>> {
            map.into_iter()
                .map(|(key, list)| {
                    if list.is_empty() {
                        Err(Error::Value(format!("{} entry '{}' has no values", name, key)))
                    } else {
                        Ok((key, list.into_iter().map(Scalar::into_string).collect()))
                    }
                })
                .collect()
        }

        Ok(Overrides {
            type_map: values(self.type_map, "type_map")?,
            pattern_map: values(self.pattern_map, "pattern_map")?,
            leaf_map: values(self.leaf_map, "leaf_map")?,
            avoid_map: match self.avoid_map {
                AvoidList::List(list) => list.into_iter().collect(),
                AvoidList::Map(map) => map.into_keys().collect(),
            },
            xpath_map: self
                .xpath_map
                .into_iter()
                .map(|(key, entry)| {
                    let value = match entry {
                        XPathEntry::Fixed(b) => XPathOverride::Fixed(b),
                        XPathEntry::Rewrite(s) => XPathOverride::Rewrite(s),
                    };
                    (key, value)
                })
                .collect(),
        })
    }
}

/// Per-session walk settings
#[derive(Debug, Clone, Default)]
pub struct WalkSettings {
    /// Restrict the walk to these subtrees (schema or data paths);
    /// empty walks the whole tree
    pub roots: Vec<String>,
    /// Resource limits
    pub limits: Limits,
}

impl WalkSettings {
    /// Default settings: whole tree, default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subtree root
    pub fn with_root(mut self, path: impl Into<String>) -> Self {
        self.roots.push(path.into());
        self
    }

    /// Replace the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
