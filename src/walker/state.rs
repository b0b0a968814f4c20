//! Per-session iteration state
//!
//! The schema tree is immutable and shared; everything a walk mutates lives
//! here, in an arena indexed by [`NodeId`] parallel to the tree's own arena.
//! A fresh [`WalkState`] is built by every `init_walk`.

use super::domains::LeafCursor;
use crate::schema::{NodeId, SchemaTree};
use crate::xpath::{XPathContext, EMPTY_FALSE};

/// Iteration state of one walkable leaf
#[derive(Debug, Clone)]
pub struct LeafState {
    /// Position in the value domain
    pub cursor: LeafCursor,
    /// Value for this round (rendered from the cursor or adopted from a leafref target)
    pub value: String,
    /// Invited this round
    pub invited: bool,
    /// Valid in at least one round so far
    pub participated: bool,
    /// Completed at least one full pass over its domain
    pub exhausted: bool,
}

impl LeafState {
    /// Fresh state at the start of the domain
    pub fn new(cursor: LeafCursor) -> Self {
        let value = cursor.value();
        Self {
            cursor,
            value,
            invited: false,
            participated: false,
            exhausted: false,
        }
    }
}

/// Round-scoped flags of any node
#[derive(Debug, Clone, Default)]
pub struct NodeState {
    /// Part of the walk (inside the selected roots and not state data)
    pub in_scope: bool,
    /// Valid this round
    pub valid: bool,
    /// A `must` on this node already signalled this round
    pub must_signalled: bool,
    /// Leaf iteration state for walkable leaves
    pub leaf: Option<LeafState>,
}

/// Arena of node and leaf state for one session
#[derive(Debug, Clone, Default)]
pub struct WalkState {
    nodes: Vec<NodeState>,
    round: usize,
}

impl WalkState {
    /// State for every node of `tree`, nothing in scope yet
    pub fn new(tree: &SchemaTree) -> Self {
        Self {
            nodes: vec![NodeState::default(); tree.len()],
            round: 0,
        }
    }

    /// Rounds started so far
    pub fn round(&self) -> usize {
        self.round
    }

    /// Node state
    pub fn node(&self, id: NodeId) -> &NodeState {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeState {
        &mut self.nodes[id.0]
    }

    /// Leaf state, for walkable leaves
    pub fn leaf(&self, id: NodeId) -> Option<&LeafState> {
        self.nodes.get(id.0).and_then(|n| n.leaf.as_ref())
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> Option<&mut LeafState> {
        self.nodes.get_mut(id.0).and_then(|n| n.leaf.as_mut())
    }

    /// Valid this round
    pub fn is_valid(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).map_or(false, |n| n.valid)
    }

    /// Current value of a valid leaf
    pub fn value(&self, id: NodeId) -> Option<&str> {
        let node = self.nodes.get(id.0)?;
        if !node.valid {
            return None;
        }
        node.leaf.as_ref().map(|l| l.value.as_str())
    }

    /// Present in the configuration this round: a valid leaf whose value is
    /// not `<empty-false>`, or an interior node with a present leaf below it
    pub fn is_present(&self, tree: &SchemaTree, id: NodeId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        match &self.nodes[id.0].leaf {
            Some(leaf) => leaf.value != EMPTY_FALSE,
            None if tree.node(id).is_leaf() => false,
            None => tree.node(id).children.iter().any(|&c| self.is_present(tree, c)),
        }
    }

    /// Clear round flags and reload leaf values from the cursors
    pub(crate) fn begin_round(&mut self) {
        self.round += 1;
        for node in &mut self.nodes {
            node.valid = false;
            node.must_signalled = false;
            if let Some(leaf) = node.leaf.as_mut() {
                leaf.invited = false;
                leaf.value = leaf.cursor.value();
            }
        }
    }

    /// Clear `valid` on a subtree. Disabling a list key also disables the
    /// list. Returns true when anything changed.
    pub(crate) fn disable(&mut self, tree: &SchemaTree, id: NodeId) -> bool {
        let mut changed = false;
        let mut pending = vec![id];
        while let Some(root) = pending.pop() {
            for n in tree.subtree(root) {
                if !self.nodes[n.0].valid {
                    continue;
                }
                self.nodes[n.0].valid = false;
                changed = true;
                let node = tree.node(n);
                if node.is_key {
                    if let Some(list) = tree.data_parent(n) {
                        if self.nodes[list.0].valid {
                            tracing::trace!(key = %node.path, "key disabled; disabling list");
                            pending.push(list);
                        }
                    }
                }
            }
        }
        changed
    }

    /// Leaves valid in at least one round
    pub fn participated(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walkable()
            .filter(move |id| self.nodes[id.0].leaf.as_ref().map_or(false, |l| l.participated))
    }

    /// All walkable leaves in arena order
    pub fn walkable(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.leaf.is_some())
            .map(|(i, _)| NodeId(i))
    }
}

/// Condition evaluation view of the state, anchored at one context node
pub struct EvalContext<'s> {
    tree: &'s SchemaTree,
    state: &'s WalkState,
    node: NodeId,
}

impl<'s> EvalContext<'s> {
    /// Create a view anchored at `node`
    pub fn new(tree: &'s SchemaTree, state: &'s WalkState, node: NodeId) -> Self {
        Self { tree, state, node }
    }
}

impl XPathContext for EvalContext<'_> {
    fn tree(&self) -> &SchemaTree {
        self.tree
    }

    fn context_node(&self) -> NodeId {
        self.node
    }

    fn is_present(&self, node: NodeId) -> bool {
        self.state.is_present(self.tree, node)
    }

    fn value(&self, node: NodeId) -> Option<&str> {
        self.state.value(node)
    }
}
