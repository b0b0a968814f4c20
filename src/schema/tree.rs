//! Schema tree arena
//!
//! All nodes of a schema live in one `Vec`, addressed by [`NodeId`].
//! Parent, child, key and leafref relations are stored as indices, so the
//! tree has no cyclic ownership and can be shared read-only between any
//! number of walk sessions.

use super::node::{NodeId, NodeKind, SchemaNode};
use super::types::{Identity, TypeSpec, Typedef};
use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::names;
use crate::xpath::selectors::{PathStepKind, SchemaPath};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// The compiled schema: nodes, typedefs and identities
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    nodes: Vec<SchemaNode>,
    roots: Vec<NodeId>,
    path_index: HashMap<String, NodeId>,
    data_index: HashMap<String, NodeId>,
    typedefs: IndexMap<String, Typedef>,
    identities: IndexMap<String, Identity>,
    modules: Vec<String>,
    limits: Limits,
    finalized: bool,
}

impl SchemaTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with custom limits
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    /// Limits the tree was built under
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Add a node below `parent` (or as a root). Paths must be unique.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        module: &str,
        name: &str,
        kind: NodeKind,
    ) -> Result<NodeId> {
        if self.finalized {
            return Err(Error::malformed(format!(
                "cannot add '{}' to a finalized schema tree",
                name
            )));
        }
        names::validate_identifier(name)
            .map_err(|_| Error::malformed(format!("invalid node name '{}'", name)))?;
        self.limits.check_schema_nodes(self.nodes.len() + 1)?;

        let (parent_path, parent_data_path) = match parent {
            Some(pid) => {
                let p = self.get(pid)?;
                if !p.kind.is_interior() {
                    return Err(Error::MalformedInput(
                        ParseError::new(format!("{} '{}' cannot have children", p.kind, p.name))
                            .with_location(p.path.clone()),
                    ));
                }
                if p.kind == NodeKind::Choice && kind != NodeKind::Case {
                    return Err(Error::MalformedInput(
                        ParseError::new(format!("choice child '{}' must be a case", name))
                            .with_location(p.path.clone()),
                    ));
                }
                (p.path.clone(), p.data_path.clone())
            }
            None => (String::new(), String::new()),
        };
        if kind == NodeKind::Case && parent.map(|p| self.nodes[p.0].kind) != Some(NodeKind::Choice) {
            return Err(Error::malformed(format!("case '{}' must be inside a choice", name)));
        }

        let path = format!("{}/{}", parent_path, name);
        if self.path_index.contains_key(&path) {
            return Err(Error::MalformedInput(
                ParseError::new("duplicate schema path").with_location(path),
            ));
        }
        let data_path = if kind.is_schema_only() {
            parent_data_path
        } else {
            format!("{}/{}", parent_data_path, name)
        };
        if !kind.is_schema_only() && self.data_index.contains_key(&data_path) {
            return Err(Error::MalformedInput(
                ParseError::new("duplicate data path").with_location(data_path),
            ));
        }

        let id = NodeId(self.nodes.len());
        let mut node = SchemaNode::new(id, module, name, kind);
        node.path = path.clone();
        node.data_path = data_path.clone();
        node.parent = parent;
        self.nodes.push(node);
        self.path_index.insert(path, id);
        if !kind.is_schema_only() {
            self.data_index.insert(data_path, id);
        }

        match parent {
            Some(pid) => self.nodes[pid.0].children.push(id),
            None => self.roots.push(id),
        }
        if !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
        }
        Ok(id)
    }

    /// Register a typedef under its qualified key
    pub fn add_typedef(&mut self, typedef: Typedef) -> Result<()> {
        if self.typedefs.contains_key(&typedef.key) {
            return Err(Error::malformed(format!("duplicate typedef '{}'", typedef.key)));
        }
        self.typedefs.insert(typedef.key.clone(), typedef);
        Ok(())
    }

    /// Register an identity under its qualified key
    pub fn add_identity(&mut self, identity: Identity) -> Result<()> {
        if self.identities.contains_key(&identity.key) {
            return Err(Error::malformed(format!("duplicate identity '{}'", identity.key)));
        }
        self.identities.insert(identity.key.clone(), identity);
        Ok(())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    // =========================================================================
    // Access
    // =========================================================================

    fn get(&self, id: NodeId) -> Result<&SchemaNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::malformed(format!("unknown node {}", id)))
    }

    /// Get a node by id
    ///
    /// # Panics
    /// Panics if the id does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in declaration order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.nodes.iter()
    }

    /// Modules that contributed nodes, in load order
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Look up a typedef by qualified key
    pub fn typedef(&self, key: &str) -> Option<&Typedef> {
        self.typedefs.get(key)
    }

    /// All typedefs
    pub fn typedefs(&self) -> impl Iterator<Item = &Typedef> {
        self.typedefs.values()
    }

    /// Look up an identity by qualified key
    pub fn identity(&self, key: &str) -> Option<&Identity> {
        self.identities.get(key)
    }

    /// Whether `finalize` has run
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Find a node by schema path, falling back to its data path
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let trimmed = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        self.path_index
            .get(trimmed)
            .or_else(|| self.data_index.get(trimmed))
            .copied()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// Nearest ancestor that appears in instance data
    pub fn data_parent(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| !self.nodes[a.0].kind.is_schema_only())
    }

    /// Number of ancestors
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// True when `ancestor` is a proper ancestor of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Pre-order traversal of the subtrees rooted at `starts`
    pub fn depth_first(&self, starts: &[NodeId]) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = starts.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Pre-order traversal of one subtree, including its root
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        self.depth_first(&[id])
    }

    /// All leaves and leaf-lists in depth-first order
    pub fn leaves(&self) -> Vec<NodeId> {
        self.depth_first(&self.roots)
            .into_iter()
            .filter(|id| self.nodes[id.0].is_leaf())
            .collect()
    }

    /// Find a data child by local name, looking through choice and case
    pub fn find_data_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        let children: &[NodeId] = match parent {
            Some(pid) => &self.nodes[pid.0].children,
            None => &self.roots,
        };
        for &child in children {
            let node = &self.nodes[child.0];
            if node.kind.is_schema_only() {
                if let Some(found) = self.find_data_child(Some(child), name) {
                    return Some(found);
                }
            } else if node.name == name {
                return Some(child);
            }
        }
        None
    }

    /// Resolve a path expression against the schema, relative to `context`.
    ///
    /// `..` climbs to the nearest data ancestor, names descend through
    /// choice and case transparently, predicates are ignored.
    pub fn resolve_path(&self, context: NodeId, path: &SchemaPath) -> Option<NodeId> {
        if !path.is_well_formed() {
            return None;
        }
        let mut current = if path.absolute { None } else { Some(context) };
        for step in path.steps() {
            current = match step.kind {
                PathStepKind::Self_ => current,
                PathStepKind::Current => Some(context),
                PathStepKind::Parent => Some(self.data_parent(current?)?),
                PathStepKind::Child => Some(self.find_data_child(current, &step.name)?),
            };
        }
        current
    }

    /// The node a condition on `id` is evaluated for: the node itself for
    /// data nodes, the nearest data ancestor for choice and case
    pub fn condition_context(&self, id: NodeId) -> Option<NodeId> {
        if self.nodes[id.0].kind.is_schema_only() {
            self.data_parent(id)
        } else {
            Some(id)
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Follow typedef indirection until a built-in type is reached,
    /// applying refinements along the way
    pub fn resolve_type(&self, spec: &TypeSpec) -> Result<TypeSpec> {
        let mut current = spec.clone();
        let mut seen = HashSet::new();
        while let TypeSpec::Typedef { name, restrictions } = &current {
            if !seen.insert(name.clone()) {
                return Err(Error::UnsupportedType(format!("typedef cycle through '{}'", name)));
            }
            let typedef = self
                .lookup_typedef(name)
                .ok_or_else(|| Error::UnsupportedType(format!("unknown typedef '{}'", name)))?;
            current = typedef.base.refine(restrictions);
        }
        Ok(current)
    }

    /// Typedef lookup by qualified key, falling back to a unique local name
    pub fn lookup_typedef(&self, name: &str) -> Option<&Typedef> {
        if let Some(found) = self.typedefs.get(name) {
            return Some(found);
        }
        let local = names::local_name(name);
        let mut matches = self.typedefs.values().filter(|t| t.name == local);
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Identities derived (directly or transitively) from `base`,
    /// in declaration order
    pub fn derived_identities(&self, base: &str) -> Vec<&Identity> {
        let mut derived: HashSet<&str> = HashSet::new();
        derived.insert(base);
        // Declaration order does not guarantee bases precede derivations
        loop {
            let before = derived.len();
            for identity in self.identities.values() {
                if identity.bases.iter().any(|b| derived.contains(b.as_str())) {
                    derived.insert(identity.key.as_str());
                }
            }
            if derived.len() == before {
                break;
            }
        }
        self.identities
            .values()
            .filter(|i| i.key != base && derived.contains(i.key.as_str()))
            .collect()
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Resolve list keys and leafref targets, then freeze the tree.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }

        for idx in 0..self.nodes.len() {
            let id = NodeId(idx);
            let node = &self.nodes[idx];
            if node.kind == NodeKind::List && !node.key_names.is_empty() {
                let mut keys = Vec::with_capacity(node.key_names.len());
                for key in &node.key_names {
                    let key_id = self
                        .find_data_child(Some(id), names::local_name(key))
                        .filter(|k| self.nodes[k.0].kind == NodeKind::Leaf)
                        .ok_or_else(|| {
                            Error::MalformedInput(
                                ParseError::new(format!("list key '{}' is not a child leaf", key))
                                    .with_location(node.path.clone()),
                            )
                        })?;
                    keys.push(key_id);
                }
                for &key in &keys {
                    self.nodes[key.0].is_key = true;
                }
                self.nodes[idx].keys = keys;
            }
            let node = &self.nodes[idx];
            if node.is_leaf() && node.type_spec.is_none() {
                return Err(Error::MalformedInput(
                    ParseError::new("leaf without a type").with_location(node.path.clone()),
                ));
            }
        }

        for idx in 0..self.nodes.len() {
            let Some(spec) = self.nodes[idx].type_spec.clone() else {
                continue;
            };
            let reference = self.first_leafref(&spec)?;
            if let Some((path, strict)) = reference {
                let parsed = SchemaPath::parse(&path);
                let target = self
                    .resolve_path(NodeId(idx), &parsed)
                    .filter(|t| self.nodes[t.0].is_leaf())
                    .ok_or_else(|| {
                        Error::MalformedInput(
                            ParseError::new(format!("leafref path '{}' does not resolve to a leaf", path))
                                .with_location(self.nodes[idx].path.clone()),
                        )
                    })?;
                let node = &mut self.nodes[idx];
                node.leafref_target = Some(target);
                node.leafref_strict = strict;
            }
        }

        for idx in 0..self.nodes.len() {
            let mut seen = HashSet::new();
            let mut cursor = Some(NodeId(idx));
            while let Some(id) = cursor {
                if !seen.insert(id) {
                    return Err(Error::MalformedInput(
                        ParseError::new("leafref cycle").with_location(self.nodes[idx].path.clone()),
                    ));
                }
                cursor = self.nodes[id.0].leafref_target;
            }
        }

        self.finalized = true;
        Ok(())
    }

    /// First leafref reachable from a type, looking through typedefs and unions
    fn first_leafref(&self, spec: &TypeSpec) -> Result<Option<(String, bool)>> {
        let resolved = self.resolve_type(spec)?;
        match &resolved {
            TypeSpec::Leafref {
                path,
                require_instance,
            } => Ok(Some((path.clone(), *require_instance))),
            TypeSpec::Union(members) => {
                for member in members {
                    if let Some(found) = self.first_leafref(member)? {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

/// Iterator over the ancestors of a node
pub struct Ancestors<'a> {
    tree: &'a SchemaTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes[current.0].parent;
        Some(current)
    }
}
