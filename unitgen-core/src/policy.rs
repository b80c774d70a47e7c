//! Which definitions count toward a snippet's function arity
//!
//! By default every `def` at any depth counts and `async def` does not.

use serde::{Deserialize, Serialize};

/// Arity counting rules passed explicitly into each validation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Count functions nested inside other functions or classes
    pub count_nested_functions: bool,
    /// Count `async def` definitions
    pub count_async_functions: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            count_nested_functions: true,
            count_async_functions: false,
        }
    }
}

impl ValidationPolicy {
    /// Decide whether a definition found during traversal counts
    ///
    /// `nested` is true when the definition sits inside a function or class body.
    pub fn counts(&self, is_async: bool, nested: bool) -> bool {
        (self.count_async_functions || !is_async) && (self.count_nested_functions || !nested)
    }
}
