//! Constructs tree-sitter-python accepts but CPython's parser rejects
//!
//! The grammar is permissive: it keeps Python 2 statements, does
//! not order parameters or call arguments, and takes literal tokens at face
//! value. Each rule below matches one of those gaps and reports the node that
//! CPython would point at.

use crate::syntax::SyntaxNode;

/// Find a node CPython would refuse to parse, outermost first, then in document order
pub(super) fn find_violation(node: &SyntaxNode) -> Option<&SyntaxNode> {
    let offending = match node.kind() {
        "block" if node.named_children().next().is_none() => Some(node),
        "print_statement" | "exec_statement" => python2_statement(node),
        "<>" => Some(node),
        "parameters" | "lambda_parameters" => parameter_order(node),
        "argument_list" => argument_order(node),
        "delete_statement" => node.named_children().find_map(invalid_delete_target),
        "integer" => invalid_integer(node),
        "string" => invalid_string(node),
        _ => None,
    };

    offending.or_else(|| node.children().iter().find_map(find_violation))
}

/// `print x` and `exec code` without parentheses
///
/// `print (x), y` is a call inside a tuple and `print >> f, x` a shift inside
/// a tuple, so both stay valid.
fn python2_statement(statement: &SyntaxNode) -> Option<&SyntaxNode> {
    let argument = statement.children().get(1)?;
    match argument.kind() {
        "chevron" => None,
        _ if first_token(argument) == Some("(") => None,
        _ => Some(statement),
    }
}

fn first_token(node: &SyntaxNode) -> Option<&str> {
    if node.is_atomic() {
        return node.text();
    }
    node.children().iter().find_map(first_token)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parameter {
    Positional,
    Defaulted,
    /// `*` on its own
    BareStar,
    /// `*args`
    VarArgs,
    /// `**kwargs`, `/`
    Other,
}

fn classify_parameter(parameter: &SyntaxNode) -> Parameter {
    match parameter.kind() {
        "identifier" | "tuple_pattern" => Parameter::Positional,
        "typed_parameter" => match parameter.named_children().next().map(SyntaxNode::kind) {
            Some("list_splat_pattern") => Parameter::VarArgs,
            Some("dictionary_splat_pattern") => Parameter::Other,
            _ => Parameter::Positional,
        },
        "default_parameter" | "typed_default_parameter" => Parameter::Defaulted,
        "keyword_separator" => Parameter::BareStar,
        "list_splat_pattern" => Parameter::VarArgs,
        _ => Parameter::Other,
    }
}

/// A plain parameter after a defaulted one, or a bare `*` with no named parameter after it
///
/// Keyword-only parameters (after `*` or `*args`) may mix defaults freely.
fn parameter_order(parameters: &SyntaxNode) -> Option<&SyntaxNode> {
    let mut seen_default = false;
    let mut after_star = false;
    let mut bare_star = None;

    for parameter in parameters.named_children() {
        match (classify_parameter(parameter), after_star) {
            (Parameter::Positional | Parameter::Defaulted, true) => bare_star = None,
            (Parameter::Positional, false) if seen_default => return Some(parameter),
            (Parameter::Defaulted, false) => seen_default = true,
            (Parameter::BareStar, _) => {
                after_star = true;
                bare_star = Some(parameter);
            }
            (Parameter::VarArgs, _) => after_star = true,
            _ => {}
        }
    }

    bare_star
}

/// Positional after keyword, anything unpacked with `*` after `**`, repeated keywords
fn argument_order(arguments: &SyntaxNode) -> Option<&SyntaxNode> {
    let mut keywords: Vec<&str> = Vec::new();
    let mut seen_double_splat = false;

    for argument in arguments.named_children() {
        match argument.kind() {
            "keyword_argument" => {
                let name = argument
                    .child_by_field("name")
                    .and_then(SyntaxNode::text)
                    .unwrap_or_default();
                if keywords.contains(&name) {
                    return Some(argument);
                }
                keywords.push(name);
            }
            "dictionary_splat" => seen_double_splat = true,
            "list_splat" if seen_double_splat => return Some(argument),
            "list_splat" => {}
            _ if seen_double_splat || !keywords.is_empty() => return Some(argument),
            _ => {}
        }
    }

    None
}

/// Only names, attributes, subscripts and sequences of them can be deleted
fn invalid_delete_target(target: &SyntaxNode) -> Option<&SyntaxNode> {
    match target.kind() {
        "identifier" | "attribute" | "subscript" => None,
        "expression_list" | "tuple" | "list" | "parenthesized_expression" => {
            target.named_children().find_map(invalid_delete_target)
        }
        _ => Some(target),
    }
}

/// `0777`, `10L` and misplaced underscores
fn invalid_integer(integer: &SyntaxNode) -> Option<&SyntaxNode> {
    let text = integer.text()?.to_ascii_lowercase();

    if text.ends_with('l') || text.ends_with('_') || text.contains("__") {
        return Some(integer);
    }
    if text.ends_with('j') || ["0x", "0o", "0b"].iter().any(|p| text.starts_with(p)) {
        return None;
    }

    // Decimal literals may start with zero only when every digit is zero
    let leading_zero = text.starts_with('0') && text.chars().any(|c| !matches!(c, '0' | '_'));
    leading_zero.then_some(integer)
}

/// Non-ASCII bytes literals and malformed escapes
fn invalid_string(string: &SyntaxNode) -> Option<&SyntaxNode> {
    let text = string.text()?;
    let quote = text.find(['\'', '"'])?;
    let prefix = text[..quote].to_ascii_lowercase();
    let body = &text[quote..];

    let is_bytes = prefix.contains('b');
    let invalid = if is_bytes && !body.is_ascii() {
        true
    } else if prefix.contains('r') {
        false
    } else {
        has_malformed_escape(body, is_bytes)
    };

    invalid.then_some(string)
}

/// Escapes the literal decoder rejects: short `\x`/`\u`/`\U`, out-of-range `\U`, unknown `\N{...}`
fn has_malformed_escape(body: &str, is_bytes: bool) -> bool {
    let mut rest = body;
    while let Some(backslash) = rest.find('\\') {
        let mut chars = rest[backslash + 1..].chars();
        let Some(escape) = chars.next() else {
            return false;
        };
        let tail = chars.as_str();

        let consumed = match escape {
            'x' => hex_digits(tail, 2),
            'u' if !is_bytes => hex_digits(tail, 4),
            'U' if !is_bytes => hex_digits(tail, 8).filter(|_| {
                u32::from_str_radix(&tail[..8], 16).is_ok_and(|value| value <= 0x10FFFF)
            }),
            'N' if !is_bytes => named_escape(tail),
            _ => Some(0),
        };

        match consumed {
            Some(length) => rest = &tail[length..],
            None => return true,
        }
    }
    false
}

fn hex_digits(tail: &str, count: usize) -> Option<usize> {
    let digits = tail.get(..count)?;
    digits
        .chars()
        .all(|c| c.is_ascii_hexdigit())
        .then_some(count)
}

/// Length of `{NAME}` when NAME is a known character name (matched case-insensitively)
fn named_escape(tail: &str) -> Option<usize> {
    let name = tail.strip_prefix('{')?;
    let end = name.find('}')?;
    unicode_names2::character(&name[..end].to_ascii_uppercase())?;
    Some(end + 2)
}
