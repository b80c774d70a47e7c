//! Rejection reasons produced by snippet validation
//!
//! Every failed validation yields exactly one `Rejection`. Messages are the
//! user-facing text the CLI prints after `Error: `.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a snippet is not eligible for test generation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The text is not valid Python source
    #[error("Invalid Python code (line {line}, column {column}).")]
    SyntaxError {
        /// 1-indexed line of the first offending token
        line: u32,
        /// 1-indexed column of the first offending token
        column: u32,
    },

    /// Zero or several function definitions were found
    #[error("This tool only generates unit tests for exactly one function (found {found}).")]
    WrongArity { found: usize },

    /// The single function has a placeholder-only body
    #[error("The provided function `{name}` is empty and does not require tests.")]
    EmptyFunction { name: String },
}

impl Rejection {
    /// Stable, data-free classification of this rejection
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::SyntaxError { .. } => RejectionKind::SyntaxError,
            Rejection::WrongArity { .. } => RejectionKind::WrongArity,
            Rejection::EmptyFunction { .. } => RejectionKind::EmptyFunction,
        }
    }
}

/// Rejection category as it appears in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    SyntaxError,
    WrongArity,
    EmptyFunction,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::SyntaxError => "syntax_error",
            RejectionKind::WrongArity => "wrong_arity",
            RejectionKind::EmptyFunction => "empty_function",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
