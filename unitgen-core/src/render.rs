//! Canonical re-serialization of a validated function
//!
//! Global invariants enforced:
//! - Output depends only on the syntax tree, never on input formatting
//! - One statement per line, four spaces per indentation level
//! - String literals are emitted byte-for-byte
//! - Comments and line continuations are dropped
//! - Rendering a re-parsed rendering yields identical text
//!
//! Python's tokenizer accepts whitespace between any two tokens, so the spacing
//! rules below only choose the most conventional layout; correctness never
//! depends on them.

use crate::syntax::{FunctionNode, SyntaxNode};

const INDENT: &str = "    ";

/// Clauses that continue a compound statement on a new line at its indentation
const CLAUSE_KINDS: &[&str] = &[
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
];

/// Render the function (decorators included) as canonical Python source
pub fn render(function: &FunctionNode) -> String {
    let mut writer = Writer::default();
    for decorator in function.decorators() {
        writer.emit(decorator, 0);
    }
    writer.statement(function.syntax(), 0);
    writer.finish()
}

/// Render an expression-level node on a single line
pub fn render_fragment(node: &SyntaxNode) -> String {
    let mut writer = Writer::default();
    writer.emit(node, 0);
    writer.line
}

/// Line-oriented token writer
#[derive(Default)]
struct Writer {
    out: String,
    line: String,
    indent: usize,
    glue: bool,
}

impl Writer {
    fn statement(&mut self, node: &SyntaxNode, indent: usize) {
        self.newline();
        self.indent = indent;
        self.emit(node, indent);
        self.newline();
    }

    fn emit(&mut self, node: &SyntaxNode, indent: usize) {
        match node.kind() {
            "comment" | "line_continuation" => {}
            "block" => {
                self.newline();
                for statement in node.named_children() {
                    self.statement(statement, indent + 1);
                }
            }
            "decorator" => {
                self.newline();
                self.indent = indent;
                self.emit_children(node, indent);
                self.newline();
            }
            kind if CLAUSE_KINDS.contains(&kind) => {
                self.newline();
                self.indent = indent;
                self.emit_children(node, indent);
            }
            _ if node.is_atomic() => self.token(node.text().unwrap_or_default()),
            _ => self.emit_children(node, indent),
        }
    }

    fn emit_children(&mut self, node: &SyntaxNode, indent: usize) {
        let mut previous: Option<&SyntaxNode> = None;
        for child in node.children() {
            if matches!(child.kind(), "comment" | "line_continuation") {
                continue;
            }
            if glues(node, previous, child) {
                self.glue = true;
            }
            self.emit(child, indent);
            previous = Some(child);
        }
    }

    fn token(&mut self, text: &str) {
        let tight = self.glue
            || self.line.is_empty()
            || matches!(text, ")" | "]" | "}" | "," | ":" | ";");
        if !tight {
            self.line.push(' ');
        }
        self.line.push_str(text);
        self.glue = matches!(text, "(" | "[" | "{");
    }

    fn newline(&mut self) {
        if !self.line.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str(INDENT);
            }
            self.out.push_str(&self.line);
            self.out.push('\n');
            self.line.clear();
        }
        self.glue = false;
    }

    fn finish(mut self) -> String {
        self.newline();
        self.out
    }
}

/// Whether `child` attaches to the previous token without a space
fn glues(parent: &SyntaxNode, previous: Option<&SyntaxNode>, child: &SyntaxNode) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    match parent.kind() {
        // f(x), def f(x), class A(B), f[T]
        "call" => child.field() == Some("arguments"),
        "function_definition" | "class_definition" => matches!(
            child.kind(),
            "parameters" | "argument_list" | "type_parameter"
        ),
        "subscript" | "generic_type" => matches!(child.kind(), "[" | "type_parameter"),
        "class_pattern" => child.kind() == "(",
        // `1 .real` needs the space to stay an attribute access
        "attribute" => {
            (child.kind() == "." && previous.kind() != "integer") || previous.kind() == "."
        }
        "keyword_argument" | "default_parameter" | "keyword_pattern" => {
            child.kind() == "=" || previous.kind() == "="
        }
        "slice" => child.kind() == ":" || previous.kind() == ":",
        // -x, *args, **kwargs, @decorator, from .pkg import x
        "unary_operator" | "list_splat" | "dictionary_splat" | "list_splat_pattern"
        | "dictionary_splat_pattern" | "decorator" | "import_prefix" => true,
        "relative_import" => previous.kind() == "import_prefix",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::check;
    use crate::parser::parse_source;
    use crate::policy::ValidationPolicy;

    fn render_source(src: &str) -> String {
        let tree = parse_source(src).unwrap();
        let function = check(tree, &ValidationPolicy::default()).unwrap();
        render(&function)
    }

    #[test]
    fn test_simple_function() {
        assert_eq!(
            render_source("def add(a, b):\n    return a + b\n"),
            "def add(a, b):\n    return a + b\n"
        );
    }

    #[test]
    fn test_normalizes_spacing_and_indentation() {
        assert_eq!(
            render_source("def add( a,b ) :\n  return a+b\n"),
            "def add(a, b):\n    return a + b\n"
        );
    }

    #[test]
    fn test_one_line_body_is_expanded() {
        assert_eq!(
            render_source("def inc(x): return x + 1\n"),
            "def inc(x):\n    return x + 1\n"
        );
    }

    #[test]
    fn test_semicolon_statements_are_split() {
        assert_eq!(
            render_source("def f():\n    a = 1; b = 2\n    return a + b\n"),
            "def f():\n    a = 1\n    b = 2\n    return a + b\n"
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(
            render_source("def f(x):  # entry\n    # double it\n    return x * 2  # done\n"),
            "def f(x):\n    return x * 2\n"
        );
    }

    #[test]
    fn test_calls_attributes_and_subscripts() {
        assert_eq!(
            render_source("def f(items):\n    return items [0].strip( ).split(',' , 1)\n"),
            "def f(items):\n    return items[0].strip().split(',', 1)\n"
        );
    }

    #[test]
    fn test_parameters_with_defaults_and_annotations() {
        assert_eq!(
            render_source(
                "def f(a, b = 1, *args, c: int = 2, **kwargs) -> int:\n    return a\n"
            ),
            "def f(a, b=1, *args, c: int = 2, **kwargs) -> int:\n    return a\n"
        );
    }

    #[test]
    fn test_keyword_arguments_and_unary() {
        assert_eq!(
            render_source("def f(x):\n    return round(x, ndigits = -2)\n"),
            "def f(x):\n    return round(x, ndigits=-2)\n"
        );
    }

    #[test]
    fn test_if_elif_else() {
        let src = "def sign(x):\n  if x > 0:\n    return 1\n  elif x < 0:\n    return -1\n  else:\n    return 0\n";
        assert_eq!(
            render_source(src),
            "def sign(x):\n    if x > 0:\n        return 1\n    elif x < 0:\n        return -1\n    else:\n        return 0\n"
        );
    }

    #[test]
    fn test_try_except_finally() {
        let src = "def load(p):\n    try:\n        return open(p).read()\n    except (IOError, ValueError) as e:\n        raise RuntimeError(p) from e\n    finally:\n        log(p)\n";
        assert_eq!(
            render_source(src),
            "def load(p):\n    try:\n        return open(p).read()\n    except (IOError, ValueError) as e:\n        raise RuntimeError(p) from e\n    finally:\n        log(p)\n"
        );
    }

    #[test]
    fn test_loops_with_else() {
        let src = "def find(xs, t):\n    for i, x in enumerate(xs):\n        if x == t:\n            break\n    else:\n        return None\n    return i\n";
        assert_eq!(render_source(src), src);
    }

    #[test]
    fn test_string_literals_verbatim() {
        let src = "def f():\n    \"\"\"Line one.\n\n    Line two.\n    \"\"\"\n    return f\"{value!r:>4}\" + 'it\\'s'\n";
        assert_eq!(render_source(src), src);
    }

    #[test]
    fn test_decorators_are_rendered() {
        assert_eq!(
            render_source("@ cache\n@app.route( '/x' )\ndef f():\n    return 1\n"),
            "@cache\n@app.route('/x')\ndef f():\n    return 1\n"
        );
    }

    #[test]
    fn test_only_the_function_is_rendered() {
        assert_eq!(
            render_source("import math\n\nclass Circle:\n    def area(self):\n        return math.pi * self.r ** 2\n"),
            "def area(self):\n    return math.pi * self.r ** 2\n"
        );
    }

    #[test]
    fn test_line_continuations_are_joined() {
        assert_eq!(
            render_source("def f(a, b):\n    total = a + \\\n        b\n    return (total,\n            a)\n"),
            "def f(a, b):\n    total = a + b\n    return (total, a)\n"
        );
    }

    #[test]
    fn test_comprehension_and_lambda() {
        let src = "def f(xs):\n    key = lambda x: -x\n    return sorted({x: x ** 2 for x in xs if x}, key=key)\n";
        assert_eq!(render_source(src), src);
    }

    #[test]
    fn test_slices() {
        assert_eq!(
            render_source("def f(xs):\n    return xs[1 : -1], xs[::2]\n"),
            "def f(xs):\n    return xs[1:-1], xs[::2]\n"
        );
    }

    #[test]
    fn test_integer_attribute_keeps_space() {
        assert_eq!(
            render_source("def f():\n    return 1 .bit_length()\n"),
            "def f():\n    return 1 .bit_length()\n"
        );
    }

    #[test]
    fn test_with_and_while() {
        let src = "def f(path):\n    with open(path) as fh, lock:\n        data = fh.read()\n    while data:\n        data = data[1:]\n    return data\n";
        assert_eq!(render_source(src), src);
    }

    #[test]
    fn test_render_is_idempotent() {
        let src = "@wraps( fn )\ndef f(a,b=2,*,c):\n  # comment\n  x=[a,\n     b]\n  if x: return {'k':c}\n  return None\n";
        let first = render_source(src);
        let second = render_source(&first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_fragment() {
        let tree = parse_source("f(a, *rest, key = 1)\n").unwrap();
        let statement = tree.root().named_children().next().unwrap();
        assert_eq!(render_fragment(statement), "f(a, *rest, key=1)");
    }
}
