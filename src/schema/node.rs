//! Schema nodes
//!
//! One [`SchemaNode`] per schema position. Nodes live in the
//! [`SchemaTree`](super::SchemaTree) arena and refer to each other by
//! [`NodeId`]; the tree owns all of them.

use super::types::TypeSpec;
use std::fmt;

/// Stable index of a node in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// container
    Container,
    /// list
    List,
    /// leaf
    Leaf,
    /// leaf-list
    LeafList,
    /// choice
    Choice,
    /// case
    Case,
}

impl NodeKind {
    /// Parse from a statement keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "container" => Some(Self::Container),
            "list" => Some(Self::List),
            "leaf" => Some(Self::Leaf),
            "leaf-list" => Some(Self::LeafList),
            "choice" => Some(Self::Choice),
            "case" => Some(Self::Case),
            _ => None,
        }
    }

    /// Leaves and leaf-lists carry values
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf | Self::LeafList)
    }

    /// Choice and case exist only in the schema, never in instance data
    pub fn is_schema_only(&self) -> bool {
        matches!(self, Self::Choice | Self::Case)
    }

    /// Kinds that may have children
    pub fn is_interior(&self) -> bool {
        !self.is_leaf()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Container => "container",
            Self::List => "list",
            Self::Leaf => "leaf",
            Self::LeafList => "leaf-list",
            Self::Choice => "choice",
            Self::Case => "case",
        };
        write!(f, "{}", s)
    }
}

/// CLI rendering hints that constrain which sibling combinations a device
/// command line accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliHints {
    /// Leaf needs a following sibling to form a complete command
    pub incomplete_command: bool,
    /// Children are rendered as one ordered command; skipping an optional
    /// child ends the command
    pub sequence_commands: bool,
    /// Children are rendered on one line
    pub compact_syntax: bool,
    /// Leaf ends the command line it appears on
    pub full_command: bool,
}

impl CliHints {
    /// Look up a hint by extension statement name and enable it.
    /// Returns false for unknown extensions.
    pub fn enable(&mut self, extension: &str) -> bool {
        match extension {
            "cli-incomplete-command" => self.incomplete_command = true,
            "cli-sequence-commands" => self.sequence_commands = true,
            "cli-compact-syntax" => self.compact_syntax = true,
            "cli-full-command" => self.full_command = true,
            _ => return false,
        }
        true
    }
}

/// One position in the schema tree
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Arena index
    pub id: NodeId,
    /// Local name
    pub name: String,
    /// Module that defines the node
    pub module: String,
    /// Node kind
    pub kind: NodeKind,
    /// Canonical schema path (includes choice and case names)
    pub path: String,
    /// Instance data path (choice and case names removed)
    pub data_path: String,
    /// Parent node (non-owning)
    pub parent: Option<NodeId>,
    /// Children in declaration order
    pub children: Vec<NodeId>,
    /// `when` conditions
    pub when: Vec<String>,
    /// `must` conditions
    pub must: Vec<String>,
    /// `mandatory true`
    pub mandatory: bool,
    /// `presence` (containers)
    pub presence: bool,
    /// `config false` marks state data
    pub config: bool,
    /// Key leaf names (lists)
    pub key_names: Vec<String>,
    /// Key leaves (lists), resolved when the tree is finalized
    pub keys: Vec<NodeId>,
    /// This leaf is a key of its parent list
    pub is_key: bool,
    /// Declared type (leaves and leaf-lists)
    pub type_spec: Option<TypeSpec>,
    /// Default value
    pub default: Option<String>,
    /// CLI rendering hints
    pub hints: CliHints,
    /// Leafref target, resolved when the tree is finalized
    pub leafref_target: Option<NodeId>,
    /// Whether the leafref requires an existing instance
    pub leafref_strict: bool,
}

impl SchemaNode {
    pub(crate) fn new(id: NodeId, module: &str, name: &str, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            module: module.to_string(),
            kind,
            path: String::new(),
            data_path: String::new(),
            parent: None,
            children: Vec::new(),
            when: Vec::new(),
            must: Vec::new(),
            mandatory: false,
            presence: false,
            config: true,
            key_names: Vec::new(),
            keys: Vec::new(),
            is_key: false,
            type_spec: None,
            default: None,
            hints: CliHints::default(),
            leafref_target: None,
            leafref_strict: true,
        }
    }

    /// Leaves and leaf-lists
    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Optional leaves may be left out of a configuration
    pub fn is_optional(&self) -> bool {
        !self.mandatory && !self.is_key
    }
}
