//! Pruning passes
//!
//! After invitation, the walker narrows the set of valid nodes with six
//! passes, repeated in order until a full sweep changes nothing. Every pass
//! only ever clears `valid` flags (or fills in leafref values), so the loop
//! reaches a fixed point.

use super::domains::LEAFREF_PLACEHOLDER;
use super::state::{EvalContext, WalkState};
use crate::schema::{NodeId, SchemaTree};
use crate::xpath::CompiledCondition;

/// Pruning pass identifiers, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// `when` disables, `must` signals
    Conditions,
    /// Dangling incomplete commands
    IncompleteCommand,
    /// Optional child skipped in an ordered command
    SequenceBreak,
    /// Siblings after a full-command leaf
    FullCommand,
    /// Leafref value adoption
    Leafref,
    /// `avoid_map`
    Avoid,
}

impl Pass {
    /// All passes in order
    pub const ALL: [Pass; 6] = [
        Pass::Conditions,
        Pass::IncompleteCommand,
        Pass::SequenceBreak,
        Pass::FullCommand,
        Pass::Leafref,
        Pass::Avoid,
    ];
}

/// Session data the passes read
#[derive(Debug)]
pub struct PassContext<'a> {
    /// Schema
    pub tree: &'a SchemaTree,
    /// Nodes in scope, depth-first
    pub order: &'a [NodeId],
    /// Walkable leaves, depth-first
    pub leaves: &'a [NodeId],
    /// Compiled `when` conditions
    pub when: &'a [CompiledCondition],
    /// Compiled `must` conditions
    pub must: &'a [CompiledCondition],
    /// Nodes named by `avoid_map`
    pub avoided: &'a [NodeId],
}

/// Counters from one fixed-point run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Full sweeps over all passes
    pub sweeps: usize,
    /// Sweeps in which a `must` signalled
    pub must_signals: usize,
}

/// Run all passes until nothing changes
pub fn prune(ctx: &PassContext<'_>, state: &mut WalkState) -> PruneReport {
    let mut report = PruneReport::default();
    loop {
        report.sweeps += 1;
        let mut changed = false;
        for pass in Pass::ALL {
            let pass_changed = match pass {
                Pass::Conditions => {
                    let (disabled, signalled) = conditions(ctx, state);
                    if signalled {
                        report.must_signals += 1;
                    }
                    disabled || signalled
                }
                Pass::IncompleteCommand => incomplete_command(ctx, state),
                Pass::SequenceBreak => sequence_break(ctx, state),
                Pass::FullCommand => full_command(ctx, state),
                Pass::Leafref => leafref(ctx, state),
                Pass::Avoid => avoid(ctx, state),
            };
            if pass_changed {
                tracing::trace!(?pass, sweep = report.sweeps, "pass changed state");
            }
            changed |= pass_changed;
        }
        if !changed {
            return report;
        }
    }
}

/// Pass 1. Returns (something disabled, a `must` signalled).
pub fn conditions(ctx: &PassContext<'_>, state: &mut WalkState) -> (bool, bool) {
    let mut disabled = false;
    for cond in ctx.when {
        if !state.is_valid(cond.owner) {
            continue;
        }
        let holds = cond.evaluate(&EvalContext::new(ctx.tree, state, cond.context));
        if !holds {
            tracing::trace!(node = %ctx.tree.node(cond.owner).path, when = %cond.source, "when is false");
            disabled |= state.disable(ctx.tree, cond.owner);
        }
    }

    let mut signalled = false;
    for cond in ctx.must {
        if !state.is_valid(cond.owner) || state.node(cond.owner).must_signalled {
            continue;
        }
        if cond.evaluate(&EvalContext::new(ctx.tree, state, cond.context)) {
            state.node_mut(cond.owner).must_signalled = true;
            signalled = true;
        }
    }
    (disabled, signalled)
}

/// Pass 2. A run is a sequence of present leaves sharing a parent; a
/// non-present leaf or a parent change closes it. A run that closes right
/// after an incomplete-command leaf is disabled as a whole.
pub fn incomplete_command(ctx: &PassContext<'_>, state: &mut WalkState) -> bool {
    let tree = ctx.tree;
    let mut dangling: Vec<Vec<NodeId>> = Vec::new();
    let mut run: Vec<NodeId> = Vec::new();
    let mut run_parent: Option<NodeId> = None;
    let mut pending = false;

    for &leaf in ctx.leaves {
        let parent = tree.node(leaf).parent;
        let present = state.is_present(tree, leaf);
        if !present || parent != run_parent {
            if pending {
                dangling.push(std::mem::take(&mut run));
            }
            run.clear();
            pending = false;
            run_parent = parent;
        }
        if !present {
            continue;
        }
        run.push(leaf);
        pending = tree.node(leaf).hints.incomplete_command;
    }
    if pending {
        dangling.push(run);
    }

    let mut changed = false;
    for run in dangling {
        for leaf in run {
            changed |= state.disable(tree, leaf);
        }
    }
    changed
}

/// Pass 3. Below a node marked `sequence_commands`, children after the
/// first absent optional child are disabled. Children outside the walk,
/// such as state data, never break the sequence.
pub fn sequence_break(ctx: &PassContext<'_>, state: &mut WalkState) -> bool {
    let tree = ctx.tree;
    let mut changed = false;
    for &id in ctx.order {
        let node = tree.node(id);
        if !node.hints.sequence_commands || !state.is_valid(id) {
            continue;
        }
        let mut broken = false;
        for &child in &node.children {
            if !state.node(child).in_scope {
                continue;
            }
            if broken {
                changed |= state.disable(tree, child);
            } else if tree.node(child).is_optional() && !state.is_present(tree, child) {
                broken = true;
            }
        }
    }
    changed
}

/// Pass 4. Below a node marked `compact_syntax`, siblings after a present
/// full-command leaf are disabled.
pub fn full_command(ctx: &PassContext<'_>, state: &mut WalkState) -> bool {
    let tree = ctx.tree;
    let mut changed = false;
    for &id in ctx.order {
        let node = tree.node(id);
        if !node.hints.compact_syntax || !state.is_valid(id) {
            continue;
        }
        let mut closed = false;
        for &child in &node.children {
            if closed {
                changed |= state.disable(tree, child);
            } else if tree.node(child).hints.full_command && state.is_present(tree, child) {
                closed = true;
            }
        }
    }
    changed
}

/// Pass 5. A leafref whose current candidate is deferred takes its target's
/// value. An absent target disables the reference, strict or not.
pub fn leafref(ctx: &PassContext<'_>, state: &mut WalkState) -> bool {
    let tree = ctx.tree;
    let mut changed = false;
    for &leaf in ctx.leaves {
        let node = tree.node(leaf);
        let Some(target) = node.leafref_target else {
            continue;
        };
        if !state.is_valid(leaf) {
            continue;
        }
        let deferred = state
            .leaf(leaf)
            .map_or(false, |l| l.cursor.candidate().is_deferred());
        if !deferred {
            continue;
        }

        let adopted = if state.is_present(tree, target) {
            match state.leaf(target) {
                // target is itself waiting on a reference
                Some(t) if t.value == LEAFREF_PLACEHOLDER => continue,
                Some(t) => Some(t.value.clone()),
                None => None,
            }
        } else {
            None
        };

        match adopted {
            Some(value) => {
                if let Some(l) = state.leaf_mut(leaf) {
                    if l.value != value {
                        l.value = value;
                        changed = true;
                    }
                }
            }
            None => {
                tracing::trace!(node = %node.path, "leafref target absent");
                changed |= state.disable(tree, leaf);
            }
        }
    }
    changed
}

/// Pass 6. Nodes named in `avoid_map` are disabled with their subtrees.
pub fn avoid(ctx: &PassContext<'_>, state: &mut WalkState) -> bool {
    let mut changed = false;
    for &id in ctx.avoided {
        changed |= state.disable(ctx.tree, id);
    }
    changed
}
