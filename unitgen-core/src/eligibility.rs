//! Eligibility checking: exactly one function with a non-trivial body
//!
//! Global invariants enforced:
//! - Function discovery walks every depth, in document order
//! - Arity is decided before the body is looked at
//! - Body classification is a closed case analysis over statement kinds

use crate::policy::ValidationPolicy;
use crate::rejection::Rejection;
use crate::syntax::{is_async_definition, FunctionNode, SyntaxNode, SyntaxTree};

/// A function definition found during traversal
#[derive(Debug, Clone, Copy)]
pub struct DiscoveredFunction<'t> {
    pub definition: &'t SyntaxNode,
    /// The enclosing `decorated_definition`, when the function is decorated
    pub decorated_by: Option<&'t SyntaxNode>,
}

impl<'t> DiscoveredFunction<'t> {
    /// Decorators applied to the definition, outermost first
    pub fn decorators(&self) -> impl Iterator<Item = &'t SyntaxNode> {
        self.decorated_by
            .into_iter()
            .flat_map(|parent| parent.children().iter())
            .filter(|node| node.kind() == "decorator")
    }
}

/// Decide whether the tree holds exactly one non-trivial function
pub fn check(tree: SyntaxTree, policy: &ValidationPolicy) -> Result<FunctionNode, Rejection> {
    let discovered = discover_functions(&tree, policy);
    let [only] = discovered.as_slice() else {
        return Err(Rejection::WrongArity {
            found: discovered.len(),
        });
    };

    let decorators = only.decorators().cloned().collect();
    let function = FunctionNode::new(only.definition.clone(), decorators);

    if is_trivial_body(&function) {
        return Err(Rejection::EmptyFunction {
            name: function.name().to_string(),
        });
    }

    Ok(function)
}

/// Collect every counted function definition in document order
pub fn discover_functions<'t>(
    tree: &'t SyntaxTree,
    policy: &ValidationPolicy,
) -> Vec<DiscoveredFunction<'t>> {
    let mut functions = Vec::new();
    discover_recursive(tree.root(), None, false, policy, &mut functions);
    functions
}

fn discover_recursive<'t>(
    node: &'t SyntaxNode,
    decorated_by: Option<&'t SyntaxNode>,
    nested: bool,
    policy: &ValidationPolicy,
    functions: &mut Vec<DiscoveredFunction<'t>>,
) {
    let mut inner_nested = nested;
    match node.kind() {
        "function_definition" => {
            if policy.counts(is_async_definition(node), nested) {
                functions.push(DiscoveredFunction {
                    definition: node,
                    decorated_by,
                });
            }
            inner_nested = true;
        }
        "class_definition" => inner_nested = true,
        _ => {}
    }

    // Decorators are siblings of the definition they apply to
    let is_decorated = node.kind() == "decorated_definition";
    for child in node.children() {
        let parent = (is_decorated && child.field() == Some("definition")).then_some(node);
        discover_recursive(child, parent, inner_nested, policy, functions);
    }
}

/// A body is trivial when every statement is a placeholder
///
/// Placeholders are `pass` and bare constant expressions such as a docstring
/// or `...`. A single substantive statement anywhere makes the body non-trivial.
pub fn is_trivial_body(function: &FunctionNode) -> bool {
    function.statements().all(is_placeholder_statement)
}

fn is_placeholder_statement(statement: &SyntaxNode) -> bool {
    match statement.kind() {
        "pass_statement" => true,
        "expression_statement" => {
            let mut values = statement.named_children();
            match (values.next(), values.next()) {
                (Some(value), None) => is_constant_literal(value),
                _ => false,
            }
        }
        _ => false,
    }
}

fn is_constant_literal(expression: &SyntaxNode) -> bool {
    match expression.kind() {
        "integer" | "float" | "true" | "false" | "none" | "ellipsis" => true,
        "string" => !is_format_string(expression),
        "concatenated_string" => expression
            .named_children()
            .all(|part| part.kind() == "string" && !is_format_string(part)),
        "parenthesized_expression" => {
            let mut inner = expression.named_children();
            match (inner.next(), inner.next()) {
                (Some(value), None) => is_constant_literal(value),
                _ => false,
            }
        }
        _ => false,
    }
}

/// f-strings build a value at runtime even when they contain no placeholders
fn is_format_string(string: &SyntaxNode) -> bool {
    string
        .children()
        .iter()
        .find(|child| child.kind() == "string_start")
        .and_then(SyntaxNode::text)
        .is_some_and(|prefix| prefix.contains(['f', 'F']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn check_default(src: &str) -> Result<FunctionNode, Rejection> {
        check(parse_source(src).unwrap(), &ValidationPolicy::default())
    }

    fn function_names(src: &str, policy: &ValidationPolicy) -> Vec<String> {
        let tree = parse_source(src).unwrap();
        discover_functions(&tree, policy)
            .iter()
            .map(|f| {
                f.definition
                    .child_by_field("name")
                    .and_then(SyntaxNode::text)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    fn assert_empty(src: &str) {
        match check_default(src) {
            Err(Rejection::EmptyFunction { .. }) => {}
            other => panic!("expected empty function for {:?}, got {:?}", src, other),
        }
    }

    fn assert_accepted(src: &str) {
        assert!(
            check_default(src).is_ok(),
            "expected {:?} to be accepted",
            src
        );
    }

    #[test]
    fn test_discovers_nested_functions_in_document_order() {
        let src = r#"
def outer(x):
    def inner(y):
        return y * 2
    return inner(x)

class Shape:
    def area(self):
        return 0
"#;
        assert_eq!(
            function_names(src, &ValidationPolicy::default()),
            vec!["outer", "inner", "area"]
        );
    }

    #[test]
    fn test_discovery_skips_async_by_default() {
        let src = "async def fetch():\n    return 1\n\ndef parse():\n    return 2\n";
        assert_eq!(
            function_names(src, &ValidationPolicy::default()),
            vec!["parse"]
        );

        let policy = ValidationPolicy {
            count_async_functions: true,
            ..ValidationPolicy::default()
        };
        assert_eq!(function_names(src, &policy), vec!["fetch", "parse"]);
    }

    #[test]
    fn test_discovery_finds_functions_inside_async_functions() {
        let src = "async def outer():\n    def helper():\n        return 1\n    return helper()\n";
        assert_eq!(
            function_names(src, &ValidationPolicy::default()),
            vec!["helper"]
        );
    }

    #[test]
    fn test_discovery_top_level_only() {
        let policy = ValidationPolicy {
            count_nested_functions: false,
            ..ValidationPolicy::default()
        };
        let src = "def outer():\n    def inner():\n        return 1\n    return inner()\n\nclass A:\n    def m(self):\n        return 2\n";
        assert_eq!(function_names(src, &policy), vec!["outer"]);
    }

    #[test]
    fn test_lambda_is_not_a_function_definition() {
        assert_eq!(
            function_names("square = lambda x: x * x\n", &ValidationPolicy::default()),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_decorators_are_attached() {
        let src = "@cache\n@trace(level=2)\ndef f(x):\n    return x\n";
        let function = check_default(src).unwrap();
        assert_eq!(function.decorators().len(), 2);
        assert_eq!(function.name(), "f");
    }

    #[test]
    fn test_zero_functions() {
        assert_eq!(
            check_default("x = 1\n").unwrap_err(),
            Rejection::WrongArity { found: 0 }
        );
    }

    #[test]
    fn test_two_functions() {
        assert_eq!(
            check_default("def a():\n    return 1\ndef b():\n    return 2\n").unwrap_err(),
            Rejection::WrongArity { found: 2 }
        );
    }

    #[test]
    fn test_arity_checked_before_body() {
        // Both bodies are trivial, but arity wins
        assert_eq!(
            check_default("def a():\n    pass\ndef b():\n    pass\n").unwrap_err(),
            Rejection::WrongArity { found: 2 }
        );
    }

    #[test]
    fn test_pass_body_is_empty() {
        assert_eq!(
            check_default("def f():\n    pass\n").unwrap_err(),
            Rejection::EmptyFunction {
                name: "f".to_string()
            }
        );
    }

    #[test]
    fn test_placeholder_bodies_are_empty() {
        assert_empty("def f():\n    \"\"\"Docstring only.\"\"\"\n");
        assert_empty("def f():\n    ...\n");
        assert_empty("def f(): ...\n");
        assert_empty("def f():\n    'doc'\n    pass\n    ...\n");
        assert_empty("def f():\n    42\n");
        assert_empty("def f():\n    None\n");
        assert_empty("def f():\n    (...)\n");
        assert_empty("def f():\n    'part one' 'part two'\n");
        assert_empty("def f():\n    # nothing yet\n    pass\n");
    }

    #[test]
    fn test_substantive_bodies_are_accepted() {
        assert_accepted("def f(x):\n    return x + 1\n");
        assert_accepted("def f():\n    return\n");
        assert_accepted("def f():\n    x = 1\n");
        assert_accepted("def f():\n    print('hi')\n");
        assert_accepted("def f():\n    -1\n");
        assert_accepted("def f():\n    (1, 2)\n");
        assert_accepted("def f():\n    f'template'\n");
        assert_accepted("def f():\n    raise NotImplementedError\n");
    }

    #[test]
    fn test_placeholder_before_substance_is_accepted() {
        assert_accepted("def f(x):\n    \"\"\"Doubles x.\"\"\"\n    return x * 2\n");
        assert_accepted("def f(x):\n    if x:\n        pass\n");
        assert_accepted("def f(x):\n    pass\n    x += 1\n");
    }

    #[test]
    fn test_method_in_class_is_the_single_function() {
        let function =
            check_default("class Counter:\n    def bump(self):\n        self.n += 1\n").unwrap();
        assert_eq!(function.name(), "bump");
    }
}
