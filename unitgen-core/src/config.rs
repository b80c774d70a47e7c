//! Configuration file support for unitgen
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.unitgenrc.json` in project root
//! 3. `unitgen.config.json` in project root
//!
//! All fields are optional.

use crate::policy::ValidationPolicy;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default exclude patterns applied when no config is specified
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/__pycache__/**",
    "**/venv/**",
    "**/.venv/**",
    "**/site-packages/**",
    "**/.tox/**",
];

/// unitgen configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitgenConfig {
    /// Glob patterns for files to check (default: every `.py`/`.pyw` file)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for files to skip (default: caches and virtualenvs)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Count functions defined inside other functions or classes (default: true)
    #[serde(default)]
    pub count_nested_functions: Option<bool>,

    /// Count `async def` functions (default: false)
    #[serde(default)]
    pub count_async_functions: Option<bool>,

    /// External program that turns a rendered function into tests
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
}

/// External test generator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Program to run; receives the rendered function on stdin
    pub command: String,
    /// Extra arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Compiled include patterns (None means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    /// Which function definitions count toward arity
    pub policy: ValidationPolicy,
    pub generator: Option<GeneratorConfig>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl UnitgenConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref generator) = self.generator {
            if generator.command.trim().is_empty() {
                anyhow::bail!("generator.command must not be empty");
            }
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            Some(build_glob_set(self.include.iter().map(String::as_str))?)
        };

        // User excludes replace the defaults
        let exclude = if self.exclude.is_empty() {
            build_glob_set(DEFAULT_EXCLUDES.iter().copied())?
        } else {
            build_glob_set(self.exclude.iter().map(String::as_str))?
        };

        let defaults = ValidationPolicy::default();
        let policy = ValidationPolicy {
            count_nested_functions: self
                .count_nested_functions
                .unwrap_or(defaults.count_nested_functions),
            count_async_functions: self
                .count_async_functions
                .unwrap_or(defaults.count_async_functions),
        };

        Ok(ResolvedConfig {
            include,
            exclude,
            policy,
            generator: self.generator.clone(),
            config_path: None,
        })
    }
}

fn build_glob_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

impl ResolvedConfig {
    /// Check if a file path should be included based on include/exclude patterns
    pub fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        // Check exclude first
        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        // If include patterns exist, file must match at least one
        if let Some(ref include) = self.include {
            return include.is_match(path_str.as_ref());
        }

        true
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        UnitgenConfig::default().resolve()
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.unitgenrc.json`
/// 2. `unitgen.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(UnitgenConfig, PathBuf)>> {
    for name in [".unitgenrc.json", "unitgen.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<UnitgenConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: UnitgenConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (UnitgenConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
