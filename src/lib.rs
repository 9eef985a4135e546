//! # figtree-base
//!
//! Core library for resolving component instances in design documents:
//! building node trees, translating instance overrides onto symbol
//! subtrees, and realizing instance children.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! resolve     → Override translation, cloning, nested resolution
//!   ↓
//! node        → Node tree, override entries, tree builder, index
//!   ↓
//! diagnostics → Warnings, sinks, collectors
//!   ↓
//! base        → Primitives (Guid, Size, Affine)
//! ```

/// Foundation types: Guid, geometry
pub mod base;

/// Recoverable warnings and the sinks that collect them
pub mod diagnostics;

/// Document model: nodes, overrides, tree builder
pub mod node;

/// Instance resolution: translation map, cloning, driver, cache
pub mod resolve;

// Re-export commonly needed items
pub use base::{Affine, Guid, Size};
pub use diagnostics::{Diagnostic, DiagnosticCollector, ResolveWarning, WarningSink};
pub use node::{Document, Node, NodeIndex, NodeType, OverrideEntry, OverrideInputs};
pub use resolve::{InstanceResolver, ResolveError, ResolveOptions, ResolvedSymbolCache};
