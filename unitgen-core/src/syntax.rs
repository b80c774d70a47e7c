//! Owned syntax tree for a parsed snippet
//!
//! tree-sitter nodes borrow from their `Tree`, so a validated function could
//! not outlive the parse. The parser therefore copies the concrete syntax tree
//! into `SyntaxNode` values once, and everything downstream (eligibility,
//! rendering, reports) walks this owned form.
//!
//! Global invariants enforced:
//! - Children are stored in document order
//! - Node kinds are the grammar's own kind names (closed set)
//! - Leaves and string literals keep their exact source text

use crate::render::render_fragment;
use crate::span::SourceSpan;

/// Node kinds whose source text is kept verbatim even though they have children.
///
/// String literals are reproduced byte-for-byte so escapes, prefixes and
/// embedded newlines survive rendering untouched.
pub(crate) const ATOMIC_KINDS: &[&str] = &["string"];

/// A node of the owned syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub(crate) kind: &'static str,
    pub(crate) field: Option<&'static str>,
    pub(crate) named: bool,
    pub(crate) span: SourceSpan,
    pub(crate) text: Option<String>,
    pub(crate) children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Grammar kind of this node (`function_definition`, `pass_statement`, `(` ...)
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Field name this node occupies in its parent, if any
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Whether the node is a named grammar node (as opposed to a punctuation token)
    pub fn is_named(&self) -> bool {
        self.named
    }

    /// Location of the node in the original snippet
    pub fn span(&self) -> SourceSpan {
        self.span
    }

    /// Source text of leaves and string literals
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// All children, including punctuation and comments
    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }

    /// Whether this node is rendered from its source text rather than its children
    pub fn is_atomic(&self) -> bool {
        self.children.is_empty() || ATOMIC_KINDS.contains(&self.kind)
    }

    /// First child stored under the given field name
    pub fn child_by_field(&self, field: &str) -> Option<&SyntaxNode> {
        self.children
            .iter()
            .find(|child| child.field == Some(field))
    }

    /// Named children, skipping comments
    pub fn named_children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children
            .iter()
            .filter(|child| child.named && child.kind != "comment")
    }
}

/// Structural parse of a whole snippet
///
/// Produced only by [`crate::parser::parse_source`], which guarantees the tree
/// is free of error nodes.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub(crate) root: SyntaxNode,
}

impl SyntaxTree {
    /// The `module` node
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }
}

/// The single function extracted from a snippet
///
/// Never built by hand: the eligibility checker clones it out of a
/// [`SyntaxTree`] together with the decorators attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    pub(crate) definition: SyntaxNode,
    pub(crate) decorators: Vec<SyntaxNode>,
}

impl FunctionNode {
    pub(crate) fn new(definition: SyntaxNode, decorators: Vec<SyntaxNode>) -> Self {
        FunctionNode {
            definition,
            decorators,
        }
    }

    /// Function identifier
    pub fn name(&self) -> &str {
        self.definition
            .child_by_field("name")
            .and_then(SyntaxNode::text)
            .unwrap_or_default()
    }

    /// Whether this is an `async def`
    pub fn is_async(&self) -> bool {
        is_async_definition(&self.definition)
    }

    /// Parameters in declaration order, each rendered canonically (`a`, `b=1`, `*args`)
    pub fn parameters(&self) -> Vec<String> {
        self.definition
            .child_by_field("parameters")
            .map(|params| params.named_children().map(render_fragment).collect())
            .unwrap_or_default()
    }

    /// Body statements in order, comments excluded
    pub fn statements(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.definition
            .child_by_field("body")
            .into_iter()
            .flat_map(|body| body.named_children())
    }

    /// Decorators applied to the function, outermost first
    pub fn decorators(&self) -> &[SyntaxNode] {
        &self.decorators
    }

    /// The `function_definition` node itself
    pub fn syntax(&self) -> &SyntaxNode {
        &self.definition
    }

    /// Location of the definition in the original snippet (decorators excluded)
    pub fn span(&self) -> SourceSpan {
        self.definition.span
    }
}

/// `async def` is a `function_definition` whose first token is `async`
pub(crate) fn is_async_definition(node: &SyntaxNode) -> bool {
    node.children
        .first()
        .is_some_and(|first| first.kind == "async")
}
