//! Base converter types
//!
//! A [`Row`] is a flat list of leaf assignments. Converters first fold it
//! into a [`RowTree`]: the instance-data shape of the row, with choice and
//! case levels removed, one entry per list keyed by its key leaves, and
//! each leaf annotated with the value encoding its type calls for.

use crate::schema::{NodeId, NodeKind, SchemaTree, TypeSpec};
use crate::walker::Row;

/// Configuration for converters
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Indentation for pretty output; 0 renders compactly
    indent: usize,
    /// Prefix member names with their module where the module changes
    qualified_names: bool,
    /// Wrapper element for XML output
    root_tag: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            qualified_names: true,
            root_tag: Some("config".to_string()),
        }
    }
}

impl ConverterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get indentation level
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Whether member names are module-qualified
    pub fn qualified_names(&self) -> bool {
        self.qualified_names
    }

    /// Wrapper element for XML output
    pub fn root_tag(&self) -> Option<&str> {
        self.root_tag.as_deref()
    }

    /// Set indentation
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set module-qualified member names
    pub fn with_qualified_names(mut self, qualified: bool) -> Self {
        self.qualified_names = qualified;
        self
    }

    /// Set the XML wrapper element
    pub fn with_root_tag(mut self, tag: Option<String>) -> Self {
        self.root_tag = tag;
        self
    }
}

/// How a leaf value is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Quoted text (strings, 64-bit integers, decimal64, unions, ...)
    Text,
    /// Integers up to 32 bits
    Number,
    /// boolean
    Bool,
    /// empty
    Empty,
}

impl ValueKind {
    fn of(tree: &SchemaTree, id: NodeId) -> Self {
        let Some(spec) = tree.node(id).type_spec.as_ref() else {
            return ValueKind::Text;
        };
        match tree.resolve_type(spec) {
            Ok(TypeSpec::Integer { kind, .. }) if kind.bits() <= 32 => ValueKind::Number,
            Ok(TypeSpec::Boolean) => ValueKind::Bool,
            Ok(TypeSpec::Empty) => ValueKind::Empty,
            _ => ValueKind::Text,
        }
    }
}

/// One data node of a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Schema node
    pub node: NodeId,
    /// Local name
    pub name: String,
    /// Defining module
    pub module: String,
    /// Container, list, leaf or leaf-list
    pub kind: NodeKind,
    /// Value encoding (leaves)
    pub value_kind: ValueKind,
    /// Assigned value (leaves)
    pub value: Option<String>,
    /// Child elements, list keys first
    pub children: Vec<Element>,
}

impl Element {
    fn new(tree: &SchemaTree, id: NodeId) -> Self {
        let node = tree.node(id);
        Self {
            node: id,
            name: node.name.clone(),
            module: node.module.clone(),
            kind: node.kind,
            value_kind: ValueKind::of(tree, id),
            value: None,
            children: Vec::new(),
        }
    }

    /// Look up a direct child by name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Nested instance-data view of a row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowTree {
    /// Top-level elements in schema order
    pub roots: Vec<Element>,
}

impl RowTree {
    /// Fold a row into nested elements
    pub fn build(tree: &SchemaTree, row: &Row) -> Self {
        let mut out = RowTree::default();
        for assignment in &row.assignments {
            let mut chain: Vec<NodeId> = tree
                .ancestors(assignment.node)
                .filter(|&id| !tree.node(id).kind.is_schema_only())
                .collect();
            chain.reverse();
            chain.push(assignment.node);

            let mut level: &mut Vec<Element> = &mut out.roots;
            for &id in &chain {
                let pos = match level.iter().position(|e| e.node == id) {
                    Some(pos) => pos,
                    None => {
                        level.push(Element::new(tree, id));
                        level.len() - 1
                    }
                };
                let element = &mut level[pos];
                if id == assignment.node {
                    element.value = Some(assignment.value.clone());
                }
                level = &mut element.children;
            }
        }
        keys_first(tree, &mut out.roots);
        out
    }

    /// True for a row without assignments
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Look up an element by data path (`/a/b/c`)
    pub fn find(&self, data_path: &str) -> Option<&Element> {
        let mut steps = data_path.split('/').filter(|s| !s.is_empty());
        let first = steps.next()?;
        let mut current = self.roots.iter().find(|e| e.name == first)?;
        for step in steps {
            current = current.child(step)?;
        }
        Some(current)
    }
}

fn keys_first(tree: &SchemaTree, elements: &mut [Element]) {
    for element in elements {
        if element.kind == NodeKind::List {
            let keys = &tree.node(element.node).keys;
            element
                .children
                .sort_by_key(|c| keys.iter().position(|k| *k == c.node).unwrap_or(usize::MAX));
        }
        keys_first(tree, &mut element.children);
    }
}
