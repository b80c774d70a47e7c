//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::rejection::{Rejection, RejectionKind};
use crate::render::render;
use crate::syntax::FunctionNode;
use crate::ValidationResult;
use serde::{Deserialize, Serialize};

/// Validation outcome for one snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SnippetReport {
    /// File path, or `<stdin>`
    pub source: String,
    pub status: SnippetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RejectionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetStatus {
    Valid,
    Invalid,
}

/// What a report says about the accepted function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSummary {
    pub name: String,
    pub line: u32,
    pub parameters: Vec<String>,
    pub is_async: bool,
    pub statements: usize,
    pub rendered: String,
}

impl FunctionSummary {
    pub fn new(function: &FunctionNode) -> Self {
        FunctionSummary {
            name: function.name().to_string(),
            line: function.span().start_line,
            parameters: function.parameters(),
            is_async: function.is_async(),
            statements: function.statements().count(),
            rendered: render(function),
        }
    }
}

impl SnippetReport {
    /// Build a report from a validation result
    pub fn new(source: impl Into<String>, result: &ValidationResult) -> Self {
        match result {
            Ok(function) => SnippetReport {
                source: source.into(),
                status: SnippetStatus::Valid,
                kind: None,
                message: None,
                function: Some(FunctionSummary::new(function)),
            },
            Err(rejection) => SnippetReport::rejected(source, rejection),
        }
    }

    fn rejected(source: impl Into<String>, rejection: &Rejection) -> Self {
        SnippetReport {
            source: source.into(),
            status: SnippetStatus::Invalid,
            kind: Some(rejection.kind()),
            message: Some(rejection.to_string()),
            function: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == SnippetStatus::Valid
    }
}

/// Sort reports deterministically by source label
pub fn sort_reports(mut reports: Vec<SnippetReport>) -> Vec<SnippetReport> {
    reports.sort_by(|a, b| a.source.cmp(&b.source));
    reports
}

/// Render reports as text output
pub fn render_text(reports: &[SnippetReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<8} {:<15} {:<30} {}\n",
        "STATUS", "KIND", "SOURCE", "DETAIL"
    ));

    for report in reports {
        let (status, kind, detail) = match (&report.function, report.kind) {
            (Some(function), _) => (
                "valid",
                "-".to_string(),
                format!("{}({})", function.name, function.parameters.join(", ")),
            ),
            (None, kind) => (
                "invalid",
                kind.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()),
                report.message.clone().unwrap_or_default(),
            ),
        };
        output.push_str(&format!(
            "{:<8} {:<15} {:<30} {}\n",
            status,
            kind,
            truncate_or_pad(&report.source, 30),
            detail
        ));
    }

    let valid = reports.iter().filter(|r| r.is_valid()).count();
    output.push_str(&format!(
        "\n{} snippet(s): {} valid, {} invalid\n",
        reports.len(),
        valid,
        reports.len() - valid
    ));

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[SnippetReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let keep: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", keep)
    } else {
        format!("{:<width$}", s, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    #[test]
    fn test_valid_report() {
        let report = SnippetReport::new("add.py", &validate("def add(a, b):\n    return a + b\n"));
        assert!(report.is_valid());
        assert_eq!(report.kind, None);
        let function = report.function.unwrap();
        assert_eq!(function.name, "add");
        assert_eq!(function.parameters, vec!["a", "b"]);
        assert_eq!(function.line, 1);
        assert_eq!(function.statements, 1);
        assert!(!function.is_async);
        assert_eq!(function.rendered, "def add(a, b):\n    return a + b\n");
    }

    #[test]
    fn test_invalid_report() {
        let report = SnippetReport::new("stub.py", &validate("def f():\n    pass\n"));
        assert!(!report.is_valid());
        assert_eq!(report.kind, Some(RejectionKind::EmptyFunction));
        assert_eq!(
            report.message.as_deref(),
            Some("The provided function `f` is empty and does not require tests.")
        );
        assert!(report.function.is_none());
    }

    #[test]
    fn test_sort_reports_by_source() {
        let reports = vec![
            SnippetReport::new("b.py", &validate("x = 1\n")),
            SnippetReport::new("a.py", &validate("x = 1\n")),
        ];
        let sorted = sort_reports(reports);
        assert_eq!(sorted[0].source, "a.py");
        assert_eq!(sorted[1].source, "b.py");
    }

    #[test]
    fn test_render_text() {
        let reports = vec![
            SnippetReport::new("add.py", &validate("def add(a, b):\n    return a + b\n")),
            SnippetReport::new("none.py", &validate("x = 1\n")),
        ];
        let text = render_text(&reports);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("STATUS"));
        assert!(lines[1].starts_with("valid"));
        assert!(lines[1].ends_with("add(a, b)"));
        assert!(lines[2].starts_with("invalid  wrong_arity"));
        assert!(text.ends_with("2 snippet(s): 1 valid, 1 invalid\n"));
    }

    #[test]
    fn test_render_json_omits_empty_fields() {
        let reports = vec![SnippetReport::new("bad.py", &validate("def f(:\n"))];
        let json: serde_json::Value = serde_json::from_str(&render_json(&reports)).unwrap();
        let entry = &json[0];
        assert_eq!(entry["source"], "bad.py");
        assert_eq!(entry["status"], "invalid");
        assert_eq!(entry["kind"], "syntax_error");
        assert!(entry.get("function").is_none());
    }

    #[test]
    fn test_truncate_or_pad() {
        assert_eq!(truncate_or_pad("abc", 5), "abc  ");
        assert_eq!(truncate_or_pad("abcdefgh", 6), "abc...");
    }
}
