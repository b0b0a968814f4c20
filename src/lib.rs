//! # cfgwalk
//!
//! A constraint-driven configuration-space walker for YANG-style device
//! configuration schemas.
//!
//! Given a schema tree annotated with types, `when`/`must` conditions,
//! choices and leafrefs, the walker produces a sequence of internally
//! consistent partial configurations ("rows") that together exercise every
//! leaf's value domain at least once. Rows feed device-driver tests; the
//! layer that applies them to a device is out of scope.
//!
//! ## Features
//!
//! - YIN (XML form of YANG) schema loading
//! - Boundary-value domains for every built-in type, with override maps
//! - Choice exclusivity, including compact-syntax CLI groups
//! - `when`/`must` evaluation over a small XPath subset
//! - Leafref value adoption
//! - JSON and XML payloads per row
//! - Coverage accumulation across walk sessions
//!
//! ## Example
//!
//! ```rust
//! use cfgwalk::schema::{SchemaBuilder, TypeSpec};
//! use cfgwalk::settings::{Overrides, WalkSettings};
//! use cfgwalk::walker::Walker;
//!
//! let mut b = SchemaBuilder::new("demo");
//! let sys = b.container(None, "system").unwrap();
//! b.leaf(Some(sys), "mode", TypeSpec::enumeration(["A", "B"])).unwrap();
//! let extra = b.leaf(Some(sys), "extra", TypeSpec::Boolean).unwrap();
//! b.when(extra, "../mode = 'A'");
//! let tree = b.build().unwrap();
//!
//! let overrides = Overrides::new();
//! let rows = Walker::new(&tree, &overrides, WalkSettings::new()).run().unwrap();
//! for row in &rows {
//!     if row.value("/system/mode") == Some("B") {
//!         assert!(row.value("/system/extra").is_none());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod names;

// Schema model and loading
pub mod loaders;
pub mod schema;

// Walk inputs
pub mod settings;
pub mod xpath;

// Walking
pub mod walker;

// Outputs
pub mod converters;
pub mod coverage;

// Re-exports for convenience
pub use error::{Error, Result};
pub use loaders::YinLoader;
pub use schema::{SchemaBuilder, SchemaTree};
pub use settings::{Overrides, WalkSettings};
pub use walker::{Row, WalkItem, Walker};

/// Version of the cfgwalk library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
