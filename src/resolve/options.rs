//! Resolution settings.

/// Knobs for translation and nested resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "interchange",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ResolveOptions {
    /// How many levels of nested instances are realized below the
    /// instance being resolved.
    pub max_depth: usize,
    /// Enable the sibling-swap correction after matching.
    ///
    /// Off by default: it improves raw identifier matches but regresses
    /// rendering of variant-switching instances.
    pub sibling_swap: bool,
    /// Largest accepted `max/min` ratio, per dimension, between an
    /// override's size and the descendant it was voted onto.
    pub size_ratio_limit: f64,
}

impl ResolveOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 10;
    pub const DEFAULT_SIZE_RATIO_LIMIT: f64 = 1.5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_sibling_swap(mut self, enabled: bool) -> Self {
        self.sibling_swap = enabled;
        self
    }

    pub fn with_size_ratio_limit(mut self, limit: f64) -> Self {
        self.size_ratio_limit = limit;
        self
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            sibling_swap: false,
            size_ratio_limit: Self::DEFAULT_SIZE_RATIO_LIMIT,
        }
    }
}
