//! unitgen core library - validation and canonical rendering of Python function snippets

// Global invariants enforced in this crate:
// - Validation is a pure function of the snippet text and the policy
// - No global mutable state
// - Every rejection is one of three closed variants, decided in a fixed order
// - Deterministic traversal order must be explicit
// - Formatting and comments never affect acceptance, only rendered whitespace
// - Identical input yields byte-for-byte identical output

pub mod config;
pub mod eligibility;
pub mod generator;
pub mod parser;
pub mod policy;
pub mod rejection;
pub mod render;
pub mod report;
pub mod span;
pub mod syntax;

pub use config::ResolvedConfig;
pub use generator::{generate_tests, CommandGenerator, TestGenerator};
pub use policy::ValidationPolicy;
pub use rejection::{Rejection, RejectionKind};
pub use render::render;
pub use report::{render_json, render_text, sort_reports, SnippetReport};
pub use syntax::{FunctionNode, SyntaxNode, SyntaxTree};

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Outcome of validating one snippet
pub type ValidationResult = std::result::Result<FunctionNode, Rejection>;

/// Validate a snippet with the default policy
pub fn validate(source: &str) -> ValidationResult {
    validate_with_policy(source, &ValidationPolicy::default())
}

/// Validate a snippet: parse, then require exactly one non-trivial function
pub fn validate_with_policy(source: &str, policy: &ValidationPolicy) -> ValidationResult {
    let tree = parser::parse_source(source)?;
    eligibility::check(tree, policy)
}

/// Validate labelled snippets in parallel
///
/// Each item is `(label, source)`. Reports come back sorted by label.
pub fn check_sources(sources: &[(String, String)], policy: &ValidationPolicy) -> Vec<SnippetReport> {
    let reports = sources
        .par_iter()
        .map(|(label, source)| {
            SnippetReport::new(label.clone(), &validate_with_policy(source, policy))
        })
        .collect();
    sort_reports(reports)
}

/// Validate every Python file under `path` (a file or a directory)
///
/// Files rejected by the config's include/exclude globs are skipped, as are
/// files that cannot be read as UTF-8 text (with a warning on stderr).
pub fn check_path(path: &Path, config: &ResolvedConfig) -> Result<Vec<SnippetReport>> {
    let files: Vec<PathBuf> = collect_source_files(path)?
        .into_iter()
        .filter(|file| config.should_include(file))
        .collect();

    let mut sources = Vec::with_capacity(files.len());
    let mut skipped_files: usize = 0;
    for file in files {
        match std::fs::read_to_string(&file) {
            Ok(source) => sources.push((file.display().to_string(), source)),
            Err(e) => {
                eprintln!("warning: skipping file {}: {}", file.display(), e);
                skipped_files += 1;
            }
        }
    }
    if skipped_files > 0 {
        eprintln!("Skipped {} file(s) that could not be read", skipped_files);
    }

    Ok(check_sources(&sources, &config.policy))
}

/// Check if a file is a Python source file
fn is_python_source_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "py" | "pyw"))
}

/// Collect all Python source files from a path (file or directory)
///
/// An explicitly named file is always collected, whatever its extension.
fn collect_source_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        collect_source_files_recursive(path, &mut files)?;
    } else {
        anyhow::bail!("path does not exist: {}", path.display());
    }

    // Sort files for deterministic order
    files.sort();

    Ok(files)
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.')
        || name == "__pycache__"
        || name == "venv"
        || name == "site-packages"
        || name == "node_modules"
        || name == "build"
        || name == "dist"
}

/// Process one directory entry, pushing source files or recursing into dirs
fn process_dir_entry(
    path: PathBuf,
    metadata: std::fs::Metadata,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    if metadata.is_symlink() {
        return Ok(());
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if metadata.is_dir() {
        if !is_skipped_dir(name) {
            collect_source_files_recursive(&path, files)?;
        }
    } else if metadata.is_file() && is_python_source_file(name) {
        files.push(path);
    }

    Ok(())
}

/// Recursively collect Python source files from a directory
fn collect_source_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry_result in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry_result?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
        process_dir_entry(path, metadata, files)?;
    }

    Ok(())
}
