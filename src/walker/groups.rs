//! Choice groups
//!
//! A [`ChoiceGroup`] holds mutually exclusive branches of the schema and
//! tracks which one is active. Leaves below an inactive branch are not
//! invited, so at most one branch contributes values to a row.
//!
//! Natural groups come from `choice` statements (one branch per `case`).
//! Synthetic groups come from containers rendered in compact syntax: each
//! full-command leaf child is a branch of its own, plus a trailing `none`
//! branch in which no full-command leaf is invited.

use crate::schema::NodeId;
use std::collections::HashMap;
use std::fmt;

/// Label of the trailing branch of a synthetic group
pub const NONE_BRANCH: &str = "none";

/// Index of a group in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Where a group comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// A `choice` node
    Natural,
    /// A compact-syntax container with full-command leaves
    Synthetic,
}

/// One alternative of a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Case name, full-command leaf name, or `none`
    pub label: String,
    /// Nodes whose subtrees belong to the branch
    pub members: Vec<NodeId>,
}

impl Branch {
    /// Create a branch
    pub fn new(label: impl Into<String>, members: Vec<NodeId>) -> Self {
        Self {
            label: label.into(),
            members,
        }
    }
}

/// Result of [`ChoiceGroup::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAdvance {
    /// Moved to the next branch
    Stepped,
    /// Completed a full cycle and restarted at the first branch
    Wrapped,
}

/// A set of mutually exclusive branches
#[derive(Debug, Clone)]
pub struct ChoiceGroup {
    owner: NodeId,
    kind: GroupKind,
    depth: usize,
    branches: Vec<Branch>,
    active: usize,
    done: bool,
    reached: bool,
}

impl ChoiceGroup {
    fn new(owner: NodeId, kind: GroupKind, depth: usize) -> Self {
        Self {
            owner,
            kind,
            depth,
            branches: Vec::new(),
            active: 0,
            done: false,
            reached: false,
        }
    }

    /// Node that owns the group
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Natural or synthetic
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Schema depth of the owner
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Branches in order
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Index of the active branch
    pub fn active(&self) -> usize {
        self.active
    }

    /// The active branch
    pub fn active_branch(&self) -> Option<&Branch> {
        self.branches.get(self.active)
    }

    /// Whether `branch` is the active branch
    pub fn is_joined(&self, branch: usize) -> bool {
        branch == self.active
    }

    /// Every branch has been active at least once
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The group's owner has been joined in some round
    pub fn is_reached(&self) -> bool {
        self.reached
    }

    pub(crate) fn mark_reached(&mut self) {
        self.reached = true;
    }

    /// Step to the next branch. Wrapping around marks the group done.
    pub fn advance(&mut self) -> GroupAdvance {
        self.active += 1;
        if self.active >= self.branches.len() {
            self.active = 0;
            self.done = true;
            GroupAdvance::Wrapped
        } else {
            GroupAdvance::Stepped
        }
    }
}

/// All groups of a walk session
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Vec<ChoiceGroup>,
    by_owner: HashMap<NodeId, GroupId>,
    membership: HashMap<NodeId, (GroupId, usize)>,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the branches of the group owned by `owner`. Registering an
    /// owner again appends branches whose labels are not known yet.
    pub fn register(
        &mut self,
        owner: NodeId,
        kind: GroupKind,
        depth: usize,
        branches: Vec<Branch>,
    ) -> GroupId {
        let id = match self.by_owner.get(&owner) {
            Some(&id) => id,
            None => {
                let id = GroupId(self.groups.len());
                self.groups.push(ChoiceGroup::new(owner, kind, depth));
                self.by_owner.insert(owner, id);
                id
            }
        };
        for branch in branches {
            let group = &mut self.groups[id.0];
            if group.branches.iter().any(|b| b.label == branch.label) {
                continue;
            }
            let index = group.branches.len();
            for &member in &branch.members {
                self.membership.insert(member, (id, index));
            }
            group.branches.push(branch);
        }
        id
    }

    /// Group owned by a node
    pub fn group_of_owner(&self, owner: NodeId) -> Option<GroupId> {
        self.by_owner.get(&owner).copied()
    }

    /// Group and branch a node is a direct member of
    pub fn membership(&self, node: NodeId) -> Option<(GroupId, usize)> {
        self.membership.get(&node).copied()
    }

    /// A node is joined unless it is a member of an inactive branch
    pub fn is_joined(&self, node: NodeId) -> bool {
        match self.membership(node) {
            Some((group, branch)) => self.groups[group.0].is_joined(branch),
            None => true,
        }
    }

    /// Look up a group
    pub fn group(&self, id: GroupId) -> &ChoiceGroup {
        &self.groups[id.0]
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> &mut ChoiceGroup {
        &mut self.groups[id.0]
    }

    /// All groups in registration order
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &ChoiceGroup)> {
        self.groups.iter().enumerate().map(|(i, g)| (GroupId(i), g))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no group is registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group ids ordered deepest owner first
    pub fn deepest_first(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = (0..self.groups.len()).map(GroupId).collect();
        ids.sort_by(|a, b| self.groups[b.0].depth.cmp(&self.groups[a.0].depth));
        ids
    }

    /// Every group that has ever been reached is done
    pub fn all_reached_done(&self) -> bool {
        self.groups.iter().all(|g| !g.reached || g.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (GroupRegistry, GroupId) {
        let mut registry = GroupRegistry::new();
        let id = registry.register(
            NodeId(1),
            GroupKind::Natural,
            2,
            vec![
                Branch::new("a", vec![NodeId(2)]),
                Branch::new("b", vec![NodeId(3)]),
            ],
        );
        (registry, id)
    }

    #[test]
    fn test_register_is_idempotent() {
        let (mut registry, id) = registry();
        let again = registry.register(
            NodeId(1),
            GroupKind::Natural,
            2,
            vec![
                Branch::new("b", vec![NodeId(3)]),
                Branch::new("c", vec![NodeId(4)]),
            ],
        );
        assert_eq!(id, again);
        assert_eq!(registry.len(), 1);
        let labels: Vec<&str> = registry
            .group(id)
            .branches()
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(registry.membership(NodeId(4)), Some((id, 2)));
    }

    #[test]
    fn test_joined_follows_active_branch() {
        let (mut registry, id) = registry();
        assert!(registry.is_joined(NodeId(2)));
        assert!(!registry.is_joined(NodeId(3)));
        assert!(registry.is_joined(NodeId(99)));
        assert_eq!(registry.group_mut(id).advance(), GroupAdvance::Stepped);
        assert!(!registry.is_joined(NodeId(2)));
        assert!(registry.is_joined(NodeId(3)));
    }

    #[test]
    fn test_advance_wraps_and_marks_done() {
        let (mut registry, id) = registry();
        let group = registry.group_mut(id);
        assert!(!group.is_done());
        group.advance();
        assert_eq!(group.advance(), GroupAdvance::Wrapped);
        assert!(group.is_done());
        assert_eq!(group.active(), 0);
    }

    #[test]
    fn test_reached_and_done_bookkeeping() {
        let (mut registry, id) = registry();
        let inner = registry.register(
            NodeId(5),
            GroupKind::Synthetic,
            4,
            vec![Branch::new("x", vec![NodeId(6)]), Branch::new(NONE_BRANCH, vec![])],
        );
        assert!(registry.all_reached_done());
        registry.group_mut(id).mark_reached();
        assert!(!registry.all_reached_done());
        assert_eq!(registry.deepest_first(), vec![inner, id]);
    }
}
