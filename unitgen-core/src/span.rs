//! Source span representation
//!
//! Parsers convert their native node positions to this representation so the
//! rest of the crate never touches tree-sitter coordinates directly.

use serde::{Deserialize, Serialize};

/// Contiguous region of the original snippet text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Byte offset of the start of the span (inclusive)
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
    /// Line number of the start (1-indexed)
    pub start_line: u32,
    /// Line number of the end (1-indexed)
    pub end_line: u32,
    /// Column number of the start (0-indexed, in bytes)
    pub start_col: u32,
}

impl SourceSpan {
    /// Create a new source span
    pub fn new(start: usize, end: usize, start_line: u32, end_line: u32, start_col: u32) -> Self {
        SourceSpan {
            start,
            end,
            start_line,
            end_line,
            start_col,
        }
    }

    /// Build a span from a tree-sitter node
    pub fn from_node(node: tree_sitter::Node<'_>) -> Self {
        SourceSpan {
            start: node.start_byte(),
            end: node.end_byte(),
            // tree-sitter rows are 0-indexed
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
            start_col: node.start_position().column as u32,
        }
    }
}
