//! Instance resolution: translating overrides and realizing instances.
//!
//! ## Pipeline (per instance)
//!
//! ```text
//! descendants → collect the symbol subtree (preorder)
//!   ↓
//! classify    → type hint per override id
//!   ↓
//! translate   → override id → descendant id (offset voting, fallbacks)
//!   ↓
//! rewrite     → replace guid_path[0] through the map
//!   ↓
//! clone       → deep copy + apply, demote deeper paths
//!   ↓
//! driver      → recurse into nested instances (depth + cycle bound)
//! ```
//!
//! The [`ResolvedSymbolCache`] memoizes override-free symbol realizations
//! so nested instances without overrides skip the pipeline.

mod cache;
mod classify;
mod clone;
mod descendants;
mod driver;
mod options;
mod rewrite;
pub mod translate;

pub use cache::ResolvedSymbolCache;
pub use classify::{OverrideFacts, OverrideProfile, TypeHint};
pub use clone::{CloneInputs, clone_symbol_children};
pub use descendants::{DescendantInfo, collect_descendants};
pub use driver::{
    InstanceResolution, InstanceResolver, ResolveError, StoredTarget, SymbolTargetResolver,
};
pub use options::ResolveOptions;
pub use rewrite::translate_overrides;
pub use translate::{GuidTranslationMap, build_translation_map, sizes_consistent};
