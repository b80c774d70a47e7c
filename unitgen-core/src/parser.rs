//! Python snippet parser using tree-sitter
//!
//! Global invariants enforced:
//! - A snippet either parses completely or is rejected; no partial trees escape
//! - Input text is never normalized before parsing
//! - The first offending token in document order determines the error location
//!
//! tree-sitter recovers from errors by inserting `ERROR`/`MISSING` nodes, and
//! its grammar accepts more than CPython does: Python 2 statements, misordered
//! parameters and arguments, malformed literals, stray indentation. All of
//! these become `Rejection::SyntaxError` here so later stages only ever see
//! valid Python 3.

use crate::rejection::Rejection;
use crate::span::SourceSpan;
use crate::syntax::{SyntaxNode, SyntaxTree, ATOMIC_KINDS};
use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, TreeCursor};

mod indentation;
mod strictness;

/// Python parser using tree-sitter
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE;
        parser
            .set_language(&language.into())
            .context("Failed to set Python language for parser")?;
        Ok(PythonParser { parser })
    }

    /// Parse a snippet into an owned syntax tree
    pub fn parse(&mut self, source: &str) -> std::result::Result<SyntaxTree, Rejection> {
        // No timeout or cancellation flag is ever installed, so tree-sitter
        // only returns None when it could not produce a tree at all.
        let Some(tree) = self.parser.parse(source, None) else {
            return Err(Rejection::SyntaxError { line: 1, column: 1 });
        };

        let root = tree.root_node();
        if root.has_error() {
            let span = first_error_node(root)
                .map(SourceSpan::from_node)
                .unwrap_or_else(|| SourceSpan::from_node(root));
            return Err(syntax_error_at(span));
        }

        if let Some((line, column)) = indentation::check_indentation(source) {
            return Err(Rejection::SyntaxError { line, column });
        }

        let mut cursor = tree.walk();
        let root = build_node(&mut cursor, source);

        if let Some(offending) = strictness::find_violation(&root) {
            return Err(syntax_error_at(offending.span));
        }

        Ok(SyntaxTree { root })
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new().expect("Failed to create Python parser")
    }
}

/// Parse Python source text into a [`SyntaxTree`]
///
/// The only failure this stage reports is `Rejection::SyntaxError`.
pub fn parse_source(source: &str) -> std::result::Result<SyntaxTree, Rejection> {
    PythonParser::default().parse(source)
}

fn syntax_error_at(span: SourceSpan) -> Rejection {
    Rejection::SyntaxError {
        line: span.start_line,
        column: span.start_col + 1,
    }
}

/// Find the first `ERROR` or `MISSING` node in document order
fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }

    None
}

/// Copy the tree under the cursor into owned nodes
fn build_node(cursor: &mut TreeCursor<'_>, source: &str) -> SyntaxNode {
    let node = cursor.node();
    let field = cursor.field_name();

    let mut children = Vec::new();
    if cursor.goto_first_child() {
        loop {
            children.push(build_node(cursor, source));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }

    let keeps_text = children.is_empty() || ATOMIC_KINDS.contains(&node.kind());
    SyntaxNode {
        kind: node.kind(),
        field,
        named: node.is_named(),
        span: SourceSpan::from_node(node),
        text: keeps_text.then(|| source[node.start_byte()..node.end_byte()].to_string()),
        children,
    }
}
