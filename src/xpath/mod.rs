//! Condition language
//!
//! Schema `when` and `must` statements are XPath expressions. The walker
//! only needs a small, schema-level subset of XPath: presence tests and
//! comparisons of a leaf's current value with a literal, combined with
//! `and`/`or`/`not()`. This module provides:
//!
//! - [`selectors`]: path splitting into steps
//! - [`parsers`]: the condition parser and its AST
//! - [`CompiledCondition`]: a parsed condition whose paths are resolved to
//!   schema nodes once, at session start
//! - [`XPathOverride`]: the `xpath_map` fallback for expressions the parser
//!   rejects (a fixed result, an equivalent rewrite or a callback)
//!
//! ## Evaluation
//!
//! A path is *present* when its target node is valid in the current round
//! and, for leaves, its value is not the `<empty-false>` sentinel.
//! Comparisons against an absent target are false for both `=` and `!=`.

pub mod parsers;
pub mod selectors;

pub use parsers::{parse_condition, CompareOp, ConditionParser, Expr, XPathParseError};
pub use selectors::{is_identifier, is_identifier_char, split_path, PathStep, PathStepKind, SchemaPath};

use crate::error::{Error, MapKind, Result};
use crate::names;
use crate::schema::{NodeId, SchemaTree};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Sentinel value of an `empty` leaf that is left out of the configuration
pub const EMPTY_FALSE: &str = "<empty-false>";

/// Sentinel value of an `empty` leaf that is set
pub const EMPTY_TRUE: &str = "<empty-true>";

/// Read access to the walk state, as seen by a condition
pub trait XPathContext {
    /// Schema the walk runs over
    fn tree(&self) -> &SchemaTree;

    /// The node the condition is evaluated for
    fn context_node(&self) -> NodeId;

    /// Whether a node is valid this round (and, for leaves, not `<empty-false>`)
    fn is_present(&self, node: NodeId) -> bool;

    /// Current value of a leaf, if it has one this round
    fn value(&self, node: NodeId) -> Option<&str>;

    /// Resolve a path relative to the context node
    fn resolve(&self, path: &str) -> Option<NodeId> {
        self.tree()
            .resolve_path(self.context_node(), &SchemaPath::parse(path))
    }

    /// Current value of the leaf a path points at, when present
    fn value_of(&self, path: &str) -> Option<String> {
        let node = self.resolve(path)?;
        if !self.is_present(node) {
            return None;
        }
        self.value(node).map(str::to_string)
    }

    /// Whether the node a path points at is present
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map_or(false, |n| self.is_present(n))
    }
}

/// Callback evaluating a condition the built-in parser cannot handle
pub type XPathCallback = Arc<dyn Fn(&dyn XPathContext) -> bool + Send + Sync>;

/// `xpath_map` entry
#[derive(Clone)]
pub enum XPathOverride {
    /// The condition always evaluates to this value
    Fixed(bool),
    /// An equivalent expression the built-in parser understands
    Rewrite(String),
    /// Evaluate with external code
    Callback(XPathCallback),
}

impl XPathOverride {
    /// Wrap a closure as a callback override
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&dyn XPathContext) -> bool + Send + Sync + 'static,
    {
        XPathOverride::Callback(Arc::new(f))
    }
}

impl fmt::Debug for XPathOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Rewrite(expr) => f.debug_tuple("Rewrite").field(expr).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl PartialEq for XPathOverride {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::Rewrite(a), Self::Rewrite(b)) => a == b,
            (Self::Callback(a), Self::Callback(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// =============================================================================
// Compiled conditions
// =============================================================================

/// A condition expression with its paths resolved to schema nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Disjunction
    Or(Box<Resolved>, Box<Resolved>),
    /// Conjunction
    And(Box<Resolved>, Box<Resolved>),
    /// Negation
    Not(Box<Resolved>),
    /// Constant
    Const(bool),
    /// Presence of a node (`None`: the path matched nothing in the schema)
    Exists(Option<NodeId>),
    /// Comparison of a leaf value with a literal
    Compare {
        /// Target leaf
        target: Option<NodeId>,
        /// Operator
        op: CompareOp,
        /// Literal
        value: String,
    },
}

impl Resolved {
    fn evaluate(&self, ctx: &dyn XPathContext) -> bool {
        match self {
            Resolved::Or(a, b) => a.evaluate(ctx) || b.evaluate(ctx),
            Resolved::And(a, b) => a.evaluate(ctx) && b.evaluate(ctx),
            Resolved::Not(inner) => !inner.evaluate(ctx),
            Resolved::Const(value) => *value,
            Resolved::Exists(target) => target.map_or(false, |t| ctx.is_present(t)),
            Resolved::Compare { target, op, value } => {
                let Some(target) = *target else {
                    return false;
                };
                if !ctx.is_present(target) {
                    return false;
                }
                let Some(current) = ctx.value(target) else {
                    return false;
                };
                let equal = values_equal(current, value);
                match op {
                    CompareOp::Eq => equal,
                    CompareOp::Ne => !equal,
                }
            }
        }
    }
}

/// How a compiled condition is evaluated
#[derive(Clone)]
pub enum ConditionKind {
    /// Built-in evaluator
    Builtin(Resolved),
    /// External callback from `xpath_map`
    External(XPathCallback),
}

impl fmt::Debug for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(expr) => f.debug_tuple("Builtin").field(expr).finish(),
            Self::External(_) => f.write_str("External(..)"),
        }
    }
}

/// A `when` or `must` condition ready for evaluation
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    /// Expression text as written in the schema
    pub source: String,
    /// Node carrying the condition
    pub owner: NodeId,
    /// Node the condition is evaluated for
    pub context: NodeId,
    /// Evaluation strategy
    pub kind: ConditionKind,
}

impl CompiledCondition {
    /// Parse and resolve `source`, falling back to `xpath_map`
    pub fn compile(
        tree: &SchemaTree,
        owner: NodeId,
        source: &str,
        xpath_map: &IndexMap<String, XPathOverride>,
    ) -> Result<Self> {
        let context = tree.condition_context(owner).unwrap_or(owner);
        let kind = match parse_condition(source) {
            Ok(expr) => ConditionKind::Builtin(resolve(tree, context, &expr, source)),
            Err(parse_err) => {
                let entry = xpath_map
                    .get(source)
                    .or_else(|| xpath_map.get(source.trim()))
                    .ok_or_else(|| Error::MissingMapEntry {
                        map: MapKind::XPath,
                        key: source.to_string(),
                        node: tree.node(owner).path.clone(),
                    })?;
                tracing::debug!(condition = source, reason = %parse_err, "using xpath_map entry");
                match entry {
                    XPathOverride::Fixed(value) => ConditionKind::Builtin(Resolved::Const(*value)),
                    XPathOverride::Rewrite(rewrite) => {
                        let expr = parse_condition(rewrite).map_err(|e| {
                            Error::Value(format!(
                                "xpath_map rewrite of '{}' does not parse: {}",
                                source, e
                            ))
                        })?;
                        ConditionKind::Builtin(resolve(tree, context, &expr, source))
                    }
                    XPathOverride::Callback(callback) => ConditionKind::External(callback.clone()),
                }
            }
        };
        Ok(Self {
            source: source.to_string(),
            owner,
            context,
            kind,
        })
    }

    /// Evaluate against the walk state. `ctx.context_node()` should be
    /// [`CompiledCondition::context`].
    pub fn evaluate(&self, ctx: &dyn XPathContext) -> bool {
        match &self.kind {
            ConditionKind::Builtin(expr) => expr.evaluate(ctx),
            ConditionKind::External(callback) => callback(ctx),
        }
    }
}

fn resolve(tree: &SchemaTree, context: NodeId, expr: &Expr, source: &str) -> Resolved {
    let lookup = |path: &SchemaPath| {
        let found = tree.resolve_path(context, path);
        if found.is_none() {
            tracing::warn!(
                condition = source,
                path = %path,
                node = %tree.node(context).path,
                "condition path does not resolve; treated as absent"
            );
        }
        found
    };
    match expr {
        Expr::Or(a, b) => Resolved::Or(
            Box::new(resolve(tree, context, a, source)),
            Box::new(resolve(tree, context, b, source)),
        ),
        Expr::And(a, b) => Resolved::And(
            Box::new(resolve(tree, context, a, source)),
            Box::new(resolve(tree, context, b, source)),
        ),
        Expr::Not(inner) => Resolved::Not(Box::new(resolve(tree, context, inner, source))),
        Expr::Const(value) => Resolved::Const(*value),
        Expr::Exists(path) => Resolved::Exists(lookup(path)),
        Expr::Compare { path, op, value } => Resolved::Compare {
            target: lookup(path),
            op: *op,
            value: value.clone(),
        },
    }
}

/// Value equality as conditions see it: exact text, numeric equality, or
/// equal local names when either side carries a module prefix
pub fn values_equal(current: &str, literal: &str) -> bool {
    if current == literal {
        return true;
    }
    if let (Ok(a), Ok(b)) = (Decimal::from_str(current), Decimal::from_str(literal)) {
        return a == b;
    }
    if current.contains(':') || literal.contains(':') {
        return names::local_name(current) == names::local_name(literal);
    }
    false
}
