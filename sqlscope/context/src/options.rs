/// The default limit on how many scopes may be stacked on top of a root scope.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options which can be used to configure binding.
///
/// # Examples
/// ```
/// use sqlscope_context::options::BindOptions;
///
/// let mut options = BindOptions::new();
/// options.max_depth(8);
/// assert_eq!(options.get_max_depth(), 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindOptions(BindOptionsInner);

impl BindOptions {
    /// Create a default set of bind options for configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how deep scopes may nest before construction is refused.
    ///
    /// Each subquery, extraction or read-through layer adds one level. The limit guards
    /// against runaway recursive binding; it defaults to [`DEFAULT_MAX_DEPTH`].
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.0.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn get_max_depth(&self) -> usize {
        self.0.max_depth
    }
}

#[derive(Debug, Clone)]
struct BindOptionsInner {
    max_depth: usize,
}

impl Default for BindOptionsInner {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
