//! Configuration-space walker
//!
//! [`Walker`] enumerates rows: internally consistent partial configurations
//! that together cover every leaf's value domain. Each call to
//! [`Walker::step`] runs one round of the state machine:
//!
//! ```text
//! Inviting -> Pruning -> Emitting -> Advancing -> (Inviting | Terminated)
//! ```
//!
//! - **Inviting**: leaves whose choice-group memberships are all on the
//!   active branch are invited and become valid together with their
//!   ancestors.
//! - **Pruning**: the [`passes`] run to a fixed point.
//! - **Emitting**: valid leaves are collected into a [`Row`] in depth-first
//!   order. `<empty-false>` leaves are absent and left out.
//! - **Advancing**: every invited leaf steps its cursor, then choice groups
//!   step deepest first once everything below their active branch is
//!   exhausted.
//!
//! The walker also implements `Iterator<Item = Result<WalkItem>>`, yielding
//! one [`WalkItem::Assign`] per assignment followed by a
//! [`WalkItem::Boundary`] per row.
//!
//! ```rust
//! use cfgwalk::schema::{IntegerKind, RangeFacet, SchemaBuilder, TypeSpec};
//! use cfgwalk::settings::{Overrides, WalkSettings};
//! use cfgwalk::walker::Walker;
//!
//! let mut b = SchemaBuilder::new("demo");
//! let sys = b.container(None, "system").unwrap();
//! b.leaf(Some(sys), "mtu", TypeSpec::Integer {
//!     kind: IntegerKind::Uint16,
//!     range: Some(RangeFacet::parse("1..10").unwrap()),
//! }).unwrap();
//! let tree = b.build().unwrap();
//!
//! let overrides = Overrides::new();
//! let mut walker = Walker::new(&tree, &overrides, WalkSettings::new());
//! let rows = walker.run().unwrap();
//! let values: Vec<&str> = rows.iter().filter_map(|r| r.value("/system/mtu")).collect();
//! assert_eq!(values, vec!["1", "5", "10"]);
//! ```

pub mod domains;
pub mod groups;
pub mod passes;
pub mod state;

pub use domains::{Candidate, Domain, LeafCursor, ValueDomainSynthesizer, LEAFREF_PLACEHOLDER};
pub use groups::{Branch, ChoiceGroup, GroupAdvance, GroupId, GroupKind, GroupRegistry, NONE_BRANCH};
pub use passes::{Pass, PruneReport};
pub use state::{LeafState, NodeState, WalkState};

use crate::error::{Error, Result};
use crate::schema::{NodeId, NodeKind, SchemaTree};
use crate::settings::{Overrides, WalkSettings};
use crate::xpath::{CompiledCondition, EMPTY_FALSE};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Walker state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkPhase {
    /// Selecting leaves whose groups are joined
    Inviting,
    /// Running the pruning passes
    Pruning,
    /// Collecting the row
    Emitting,
    /// Stepping cursors and groups
    Advancing,
    /// No further rows
    Terminated,
}

/// One (leaf, value) pair of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Leaf id
    #[serde(skip)]
    pub node: NodeId,
    /// Schema path
    pub path: String,
    /// Data path
    pub data_path: String,
    /// Value
    pub value: String,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.data_path, self.value)
    }
}

/// The assignments of one round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    /// 0-based row number
    pub index: usize,
    /// Assignments in depth-first order
    pub assignments: Vec<Assignment>,
}

impl Row {
    /// Number of assignments
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// True for a row without assignments
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Value assigned to a leaf, looked up by schema or data path
    pub fn value(&self, path: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.path == path || a.data_path == path)
            .map(|a| a.value.as_str())
    }

    /// Whether the row assigns the given leaf
    pub fn contains(&self, node: NodeId) -> bool {
        self.assignments.iter().any(|a| a.node == node)
    }
}

/// Item of the flat walk stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkItem {
    /// A (leaf, value) pair
    Assign(Assignment),
    /// End of the current row
    Boundary,
}

/// Statistics of a walk session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Walkable leaves
    pub total_leaves: usize,
    /// Rounds run
    pub rounds: usize,
    /// Rows emitted
    pub rows: usize,
    /// Leaves valid in at least one row
    pub participated: Vec<String>,
    /// Leaves never valid
    pub omitted: Vec<String>,
    /// Leaves removed by `avoid_map`
    pub avoided: Vec<String>,
}

/// Everything fixed for one session
#[derive(Debug, Default)]
struct Session {
    order: Vec<NodeId>,
    leaves: Vec<NodeId>,
    when: Vec<CompiledCondition>,
    must: Vec<CompiledCondition>,
    avoided: Vec<NodeId>,
}

impl Session {
    fn pass_context<'a>(&'a self, tree: &'a SchemaTree) -> passes::PassContext<'a> {
        passes::PassContext {
            tree,
            order: &self.order,
            leaves: &self.leaves,
            when: &self.when,
            must: &self.must,
            avoided: &self.avoided,
        }
    }

    /// Nodes in scope, depth-first, skipping state data
    fn scope(tree: &SchemaTree, roots: &[NodeId]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = tree.node(id);
            if !node.config || !seen.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    fn invite(
        &self,
        tree: &SchemaTree,
        state: &mut WalkState,
        groups: &mut GroupRegistry,
    ) -> Vec<GroupId> {
        let joined =
            |id: NodeId| groups.is_joined(id) && tree.ancestors(id).all(|a| groups.is_joined(a));

        let mut invited = Vec::new();
        for &leaf in &self.leaves {
            if joined(leaf) {
                invited.push(leaf);
            }
        }
        let reached: Vec<GroupId> = groups
            .iter()
            .filter(|(_, g)| joined(g.owner()))
            .map(|(id, _)| id)
            .collect();

        for leaf in invited {
            if let Some(ls) = state.leaf_mut(leaf) {
                ls.invited = true;
            }
            state.node_mut(leaf).valid = true;
            for ancestor in tree.ancestors(leaf) {
                state.node_mut(ancestor).valid = true;
            }
        }
        for &id in &reached {
            groups.group_mut(id).mark_reached();
        }
        reached
    }

    fn emit(&self, tree: &SchemaTree, state: &WalkState, index: usize) -> Row {
        let assignments = self
            .leaves
            .iter()
            .filter(|&&leaf| state.is_valid(leaf))
            .filter_map(|&leaf| {
                let value = &state.leaf(leaf)?.value;
                if value == EMPTY_FALSE {
                    return None;
                }
                let node = tree.node(leaf);
                Some(Assignment {
                    node: leaf,
                    path: node.path.clone(),
                    data_path: node.data_path.clone(),
                    value: value.clone(),
                })
            })
            .collect();
        Row { index, assignments }
    }

    fn advance(
        &self,
        tree: &SchemaTree,
        state: &mut WalkState,
        groups: &mut GroupRegistry,
        reached: &[GroupId],
    ) {
        for &leaf in &self.leaves {
            let valid = state.is_valid(leaf);
            let Some(ls) = state.leaf_mut(leaf) else {
                continue;
            };
            if !ls.invited {
                continue;
            }
            if valid {
                ls.participated = true;
            }
            if ls.cursor.advance() {
                ls.exhausted = true;
            }
        }

        let reached_set: HashSet<GroupId> = reached.iter().copied().collect();
        for id in groups.deepest_first() {
            if !reached_set.contains(&id) {
                continue;
            }
            if !self.is_settled(tree, state, groups, id, reached) {
                continue;
            }
            let group = groups.group_mut(id);
            let outcome = group.advance();
            tracing::debug!(
                group = %id,
                owner = %tree.node(group.owner()).path,
                active = group.active(),
                ?outcome,
                "group advanced"
            );
        }
    }

    /// Everything invited below the active branch is exhausted and every
    /// group reached below it is done
    fn is_settled(
        &self,
        tree: &SchemaTree,
        state: &WalkState,
        groups: &GroupRegistry,
        id: GroupId,
        reached: &[GroupId],
    ) -> bool {
        let Some(branch) = groups.group(id).active_branch() else {
            return true;
        };
        let below = |n: NodeId| {
            branch
                .members
                .iter()
                .any(|&m| m == n || tree.is_ancestor(m, n))
        };
        let leaves_done = self
            .leaves
            .iter()
            .filter(|&&leaf| below(leaf))
            .filter_map(|&leaf| state.leaf(leaf))
            .all(|ls| !ls.invited || ls.exhausted);
        let nested_done = reached
            .iter()
            .filter(|&&other| other != id && below(groups.group(other).owner()))
            .all(|&other| groups.group(other).is_done());
        leaves_done && nested_done
    }

    fn finished(&self, state: &WalkState, groups: &GroupRegistry) -> bool {
        let leaves_done = self
            .leaves
            .iter()
            .filter_map(|&leaf| state.leaf(leaf))
            .all(|ls| !ls.participated || ls.exhausted);
        leaves_done && groups.all_reached_done()
    }
}

/// Walks the configuration space of a schema tree
#[derive(Debug)]
pub struct Walker<'a> {
    tree: &'a SchemaTree,
    overrides: &'a Overrides,
    settings: WalkSettings,
    session: Option<Session>,
    state: WalkState,
    groups: GroupRegistry,
    phase: WalkPhase,
    rows: usize,
    pending: VecDeque<WalkItem>,
    failed: bool,
}

impl<'a> Walker<'a> {
    /// Create a walker; no work happens until [`Walker::init_walk`] or the
    /// first [`Walker::step`]
    pub fn new(tree: &'a SchemaTree, overrides: &'a Overrides, settings: WalkSettings) -> Self {
        Self {
            tree,
            overrides,
            settings,
            session: None,
            state: WalkState::default(),
            groups: GroupRegistry::new(),
            phase: WalkPhase::Inviting,
            rows: 0,
            pending: VecDeque::new(),
            failed: false,
        }
    }

    /// (Re)build all per-session state: scope, value domains, compiled
    /// conditions and choice groups. Missing override entries and
    /// unsupported types are reported here, before any row is produced.
    pub fn init_walk(&mut self) -> Result<()> {
        let tree = self.tree;
        if !tree.is_finalized() {
            return Err(Error::malformed("schema tree is not finalized"));
        }

        let roots = if self.settings.roots.is_empty() {
            tree.roots().to_vec()
        } else {
            self.settings
                .roots
                .iter()
                .map(|path| {
                    tree.find(path)
                        .ok_or_else(|| Error::Value(format!("walk root '{}' not found", path)))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let order = Session::scope(tree, &roots);
        let leaves: Vec<NodeId> = order
            .iter()
            .copied()
            .filter(|&id| tree.node(id).is_leaf())
            .collect();

        let synthesizer = ValueDomainSynthesizer::new(tree, self.overrides)
            .with_limits(self.settings.limits.clone());
        let mut state = WalkState::new(tree);
        for &id in &order {
            state.node_mut(id).in_scope = true;
        }
        for &leaf in &leaves {
            let domain = synthesizer.synthesize(leaf)?;
            state.node_mut(leaf).leaf = Some(LeafState::new(LeafCursor::new(domain)));
        }

        let mut when = Vec::new();
        let mut must = Vec::new();
        for &id in &order {
            let node = tree.node(id);
            for text in &node.when {
                when.push(CompiledCondition::compile(tree, id, text, &self.overrides.xpath_map)?);
            }
            for text in &node.must {
                must.push(CompiledCondition::compile(tree, id, text, &self.overrides.xpath_map)?);
            }
        }

        let avoided: Vec<NodeId> = order
            .iter()
            .copied()
            .filter(|&id| self.overrides.is_avoided(tree.node(id)))
            .collect();

        let groups = Self::build_groups(tree, &order);

        tracing::info!(
            leaves = leaves.len(),
            groups = groups.len(),
            when = when.len(),
            must = must.len(),
            avoided = avoided.len(),
            "walk initialized"
        );

        self.phase = if leaves.is_empty() {
            WalkPhase::Terminated
        } else {
            WalkPhase::Inviting
        };
        self.session = Some(Session {
            order,
            leaves,
            when,
            must,
            avoided,
        });
        self.state = state;
        self.groups = groups;
        self.rows = 0;
        self.pending.clear();
        self.failed = false;
        Ok(())
    }

    fn build_groups(tree: &SchemaTree, order: &[NodeId]) -> GroupRegistry {
        let mut groups = GroupRegistry::new();
        let in_scope: HashSet<NodeId> = order.iter().copied().collect();
        for &id in order {
            let node = tree.node(id);
            if node.kind == NodeKind::Choice {
                let branches: Vec<Branch> = node
                    .children
                    .iter()
                    .filter(|c| in_scope.contains(c))
                    .map(|&case| Branch::new(tree.node(case).name.clone(), vec![case]))
                    .collect();
                if !branches.is_empty() {
                    groups.register(id, GroupKind::Natural, tree.depth(id), branches);
                }
            } else if node.hints.compact_syntax {
                let mut branches: Vec<Branch> = node
                    .children
                    .iter()
                    .filter(|c| in_scope.contains(c))
                    .filter(|&&c| tree.node(c).is_leaf() && tree.node(c).hints.full_command)
                    .map(|&leaf| Branch::new(tree.node(leaf).name.clone(), vec![leaf]))
                    .collect();
                if !branches.is_empty() {
                    branches.push(Branch::new(NONE_BRANCH, Vec::new()));
                    groups.register(id, GroupKind::Synthetic, tree.depth(id), branches);
                }
            }
        }
        groups
    }

    /// Run one round. Returns `None` once the walk has terminated.
    pub fn step(&mut self) -> Result<Option<Row>> {
        if self.failed {
            return Ok(None);
        }
        if self.session.is_none() {
            if let Err(err) = self.init_walk() {
                self.failed = true;
                return Err(err);
            }
        }
        match self.round() {
            Ok(row) => Ok(row),
            Err(err) => {
                self.failed = true;
                self.phase = WalkPhase::Terminated;
                Err(err)
            }
        }
    }

    fn round(&mut self) -> Result<Option<Row>> {
        if self.phase == WalkPhase::Terminated {
            return Ok(None);
        }
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        let tree = self.tree;
        self.settings.limits.check_rounds(self.state.round() + 1)?;

        self.state.begin_round();
        self.phase = WalkPhase::Inviting;
        let reached = session.invite(tree, &mut self.state, &mut self.groups);

        self.phase = WalkPhase::Pruning;
        let report = passes::prune(&session.pass_context(tree), &mut self.state);

        self.phase = WalkPhase::Emitting;
        let row = session.emit(tree, &self.state, self.rows);
        self.rows += 1;
        tracing::debug!(
            round = self.state.round(),
            assignments = row.len(),
            sweeps = report.sweeps,
            groups = reached.len(),
            "row emitted"
        );

        self.phase = WalkPhase::Advancing;
        session.advance(tree, &mut self.state, &mut self.groups, &reached);

        if session.finished(&self.state, &self.groups) {
            self.phase = WalkPhase::Terminated;
            let stats = self.stats();
            tracing::info!(
                rounds = stats.rounds,
                rows = stats.rows,
                participated = stats.participated.len(),
                omitted = stats.omitted.len(),
                "walk terminated"
            );
        } else {
            self.phase = WalkPhase::Inviting;
        }
        Ok(Some(row))
    }

    /// Run to termination and collect all rows
    pub fn run(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.step()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Current phase
    pub fn phase(&self) -> WalkPhase {
        self.phase
    }

    /// Whether the walk is over
    pub fn is_terminated(&self) -> bool {
        self.phase == WalkPhase::Terminated || self.failed
    }

    /// Per-session iteration state
    pub fn state(&self) -> &WalkState {
        &self.state
    }

    /// Choice groups of the session
    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// Walkable leaves in depth-first order (empty before `init_walk`)
    pub fn leaves(&self) -> &[NodeId] {
        self.session.as_ref().map_or(&[], |s| s.leaves.as_slice())
    }

    /// Value domain of a walkable leaf
    pub fn domain(&self, leaf: NodeId) -> Option<&Domain> {
        self.state.leaf(leaf).map(|l| l.cursor.domain())
    }

    /// Statistics so far; complete once the walk has terminated
    pub fn stats(&self) -> WalkStats {
        let mut stats = WalkStats {
            rounds: self.state.round(),
            rows: self.rows,
            ..Default::default()
        };
        let Some(session) = self.session.as_ref() else {
            return stats;
        };
        stats.total_leaves = session.leaves.len();
        for &leaf in &session.leaves {
            let node = self.tree.node(leaf);
            let participated = self.state.leaf(leaf).map_or(false, |l| l.participated);
            if participated {
                stats.participated.push(node.path.clone());
            } else {
                stats.omitted.push(node.path.clone());
            }
            if session
                .avoided
                .iter()
                .any(|&a| a == leaf || self.tree.is_ancestor(a, leaf))
            {
                stats.avoided.push(node.path.clone());
            }
        }
        stats
    }
}

impl Iterator for Walker<'_> {
    type Item = Result<WalkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.pending.pop_front() {
            return Some(Ok(item));
        }
        match self.step() {
            Ok(Some(row)) => {
                self.pending
                    .extend(row.assignments.into_iter().map(WalkItem::Assign));
                self.pending.push_back(WalkItem::Boundary);
                self.pending.pop_front().map(Ok)
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl std::iter::FusedIterator for Walker<'_> {}
