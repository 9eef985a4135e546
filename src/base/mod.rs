//! Foundation types for figtree.
//!
//! This module provides the value types used throughout the crate:
//! - [`Guid`] - Two-part node identifiers
//! - [`Size`], [`Affine`] - Geometry, re-exported from `kurbo`
//!
//! This module has NO dependencies on other figtree modules.

mod guid;

pub use guid::{Guid, ParseGuidError};

// Re-export kurbo geometry for convenience
pub use kurbo::{Affine, Size};
