//! Schema model
//!
//! The in-memory form of a configuration schema: an arena of typed nodes
//! with their structural constraints. Built once per session (by the YIN
//! loader or a [`SchemaBuilder`]) and read-only afterwards.

pub mod builders;
pub mod builtins;
pub mod facets;
pub mod node;
pub mod tree;
pub mod types;

// Re-exports
pub use builders::SchemaBuilder;
pub use builtins::IntegerKind;
pub use facets::{PatternFacet, RangeBound, RangeFacet};
pub use node::{CliHints, NodeId, NodeKind, SchemaNode};
pub use tree::{Ancestors, SchemaTree};
pub use types::{Identity, Restrictions, TypeSpec, Typedef};
