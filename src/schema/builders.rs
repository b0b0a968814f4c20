//! Schema builder
//!
//! [`SchemaBuilder`] assembles a [`SchemaTree`] statement by statement. The
//! YIN loader drives it while reading module files; tests and embedding
//! applications use it directly.
//!
//! ```rust
//! use cfgwalk::schema::{SchemaBuilder, TypeSpec};
//!
//! let mut b = SchemaBuilder::new("demo");
//! let sys = b.container(None, "system").unwrap();
//! let mode = b.leaf(Some(sys), "mode", TypeSpec::enumeration(["A", "B"])).unwrap();
//! let extra = b.leaf(Some(sys), "extra", TypeSpec::Boolean).unwrap();
//! b.when(extra, "../mode = 'A'");
//! let tree = b.build().unwrap();
//! assert_eq!(tree.leaves(), vec![mode, extra]);
//! ```

use super::node::{CliHints, NodeId, NodeKind, SchemaNode};
use super::tree::SchemaTree;
use super::types::{Identity, TypeSpec, Typedef};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::names;

/// Incremental schema tree builder
#[derive(Debug)]
pub struct SchemaBuilder {
    tree: SchemaTree,
    module: String,
}

impl SchemaBuilder {
    /// Create a builder whose nodes belong to `module`
    pub fn new(module: impl Into<String>) -> Self {
        Self::with_limits(module, Limits::default())
    }

    /// Create a builder with custom limits
    pub fn with_limits(module: impl Into<String>, limits: Limits) -> Self {
        Self {
            tree: SchemaTree::with_limits(limits),
            module: module.into(),
        }
    }

    /// Switch the module new nodes and definitions belong to
    pub fn set_module(&mut self, module: impl Into<String>) -> &mut Self {
        self.module = module.into();
        self
    }

    /// Current module name
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Qualify a definition name with the current module unless already prefixed
    pub fn qualify(&self, name: &str) -> String {
        if name.contains(':') {
            name.to_string()
        } else {
            format!("{}:{}", self.module, name)
        }
    }

    // =========================================================================
    // Data nodes
    // =========================================================================

    /// Add a node of any kind. Non-case nodes added directly below a choice
    /// get an implicit case of the same name.
    pub fn child(&mut self, parent: Option<NodeId>, name: &str, kind: NodeKind) -> Result<NodeId> {
        let parent = match parent {
            Some(pid) if self.tree.node(pid).kind == NodeKind::Choice && kind != NodeKind::Case => {
                let module = self.module.clone();
                Some(self.tree.add_node(Some(pid), &module, name, NodeKind::Case)?)
            }
            other => other,
        };
        let module = self.module.clone();
        self.tree.add_node(parent, &module, name, kind)
    }

    /// Add a container
    pub fn container(&mut self, parent: Option<NodeId>, name: &str) -> Result<NodeId> {
        self.child(parent, name, NodeKind::Container)
    }

    /// Add a list with the given key leaf names (the keys are added separately)
    pub fn list(&mut self, parent: Option<NodeId>, name: &str, keys: &[&str]) -> Result<NodeId> {
        let id = self.child(parent, name, NodeKind::List)?;
        self.tree.node_mut(id).key_names = keys.iter().map(|k| k.to_string()).collect();
        Ok(id)
    }

    /// Add a leaf
    pub fn leaf(&mut self, parent: Option<NodeId>, name: &str, type_spec: TypeSpec) -> Result<NodeId> {
        let id = self.child(parent, name, NodeKind::Leaf)?;
        self.tree.node_mut(id).type_spec = Some(type_spec);
        Ok(id)
    }

    /// Add a leaf-list
    pub fn leaf_list(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        type_spec: TypeSpec,
    ) -> Result<NodeId> {
        let id = self.child(parent, name, NodeKind::LeafList)?;
        self.tree.node_mut(id).type_spec = Some(type_spec);
        Ok(id)
    }

    /// Add a choice
    pub fn choice(&mut self, parent: Option<NodeId>, name: &str) -> Result<NodeId> {
        self.child(parent, name, NodeKind::Choice)
    }

    /// Add a case to a choice
    pub fn case(&mut self, choice: NodeId, name: &str) -> Result<NodeId> {
        self.child(Some(choice), name, NodeKind::Case)
    }

    // =========================================================================
    // Constraints
    // =========================================================================

    /// Set the type of a leaf or leaf-list
    pub fn type_spec(&mut self, id: NodeId, type_spec: TypeSpec) -> &mut Self {
        self.tree.node_mut(id).type_spec = Some(type_spec);
        self
    }

    /// Add a `when` condition
    pub fn when(&mut self, id: NodeId, condition: impl Into<String>) -> &mut Self {
        self.tree.node_mut(id).when.push(condition.into());
        self
    }

    /// Add a `must` condition
    pub fn must(&mut self, id: NodeId, condition: impl Into<String>) -> &mut Self {
        self.tree.node_mut(id).must.push(condition.into());
        self
    }

    /// Set `mandatory`
    pub fn mandatory(&mut self, id: NodeId, mandatory: bool) -> &mut Self {
        self.tree.node_mut(id).mandatory = mandatory;
        self
    }

    /// Mark a container as a presence container
    pub fn presence(&mut self, id: NodeId) -> &mut Self {
        self.tree.node_mut(id).presence = true;
        self
    }

    /// Set `config`
    pub fn config(&mut self, id: NodeId, config: bool) -> &mut Self {
        self.tree.node_mut(id).config = config;
        self
    }

    /// Set the default value
    pub fn default_value(&mut self, id: NodeId, value: impl Into<String>) -> &mut Self {
        self.tree.node_mut(id).default = Some(value.into());
        self
    }

    /// Replace list keys
    pub fn keys(&mut self, id: NodeId, keys: &[&str]) -> &mut Self {
        self.tree.node_mut(id).key_names = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Enable a CLI hint by extension name; unknown names are ignored
    pub fn hint(&mut self, id: NodeId, extension: &str) -> bool {
        self.tree.node_mut(id).hints.enable(extension)
    }

    /// Replace all CLI hints
    pub fn hints(&mut self, id: NodeId, hints: CliHints) -> &mut Self {
        self.tree.node_mut(id).hints = hints;
        self
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    /// Register a typedef in the current module, returning its qualified key
    pub fn typedef(&mut self, name: &str, base: TypeSpec) -> Result<String> {
        self.typedef_with_default(name, base, None)
    }

    /// Register a typedef with a default value
    pub fn typedef_with_default(
        &mut self,
        name: &str,
        base: TypeSpec,
        default: Option<String>,
    ) -> Result<String> {
        names::validate_identifier(name)
            .map_err(|_| Error::malformed(format!("invalid typedef name '{}'", name)))?;
        let key = self.qualify(name);
        self.tree.add_typedef(Typedef {
            key: key.clone(),
            name: name.to_string(),
            module: self.module.clone(),
            base,
            default,
        })?;
        Ok(key)
    }

    /// Register an identity in the current module, returning its qualified key
    pub fn identity(&mut self, name: &str, bases: &[&str]) -> Result<String> {
        names::validate_identifier(name)
            .map_err(|_| Error::malformed(format!("invalid identity name '{}'", name)))?;
        let key = self.qualify(name);
        let bases = bases.iter().map(|b| self.qualify(b)).collect();
        self.tree.add_identity(Identity {
            key: key.clone(),
            name: name.to_string(),
            module: self.module.clone(),
            bases,
        })?;
        Ok(key)
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Look at a node under construction
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        self.tree.node(id)
    }

    /// The tree under construction
    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    /// Finalize and return the tree
    pub fn build(mut self) -> Result<SchemaTree> {
        self.tree.finalize()?;
        Ok(self.tree)
    }

    /// Return the tree without finalizing it
    pub fn into_unfinalized(self) -> SchemaTree {
        self.tree
    }
}
