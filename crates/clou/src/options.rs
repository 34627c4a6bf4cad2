//! engine settings

/// Settings shared by substitution and composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Deepest document nesting substitution walks into
    pub max_depth: usize,
    /// Appended to the (sanitized) spec name to form the key prefix of composed templates
    pub prefix_suffix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: 256,
            prefix_suffix: "xx".to_string(),
        }
    }
}
