//! unitgen CLI - validate Python function snippets and hand them to a test generator

// Global invariants enforced:
// - Deterministic output ordering
// - stdout carries only the requested output; diagnostics go to stderr

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{BufRead, IsTerminal, Read};
use std::path::{Path, PathBuf};
use unitgen_core::config::{self, ResolvedConfig};
use unitgen_core::{
    check_path, check_sources, generate_tests, render, render_json, render_text, sort_reports,
    validate_with_policy, CommandGenerator,
};

const STDIN_LABEL: &str = "<stdin>";

#[derive(Parser)]
#[command(name = "unitgen")]
#[command(about = "Validate a Python function snippet and generate unit tests for it")]
#[command(version = env!("UNITGEN_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that snippets hold exactly one non-empty function
    Check {
        /// Files or directories to check; `-` or nothing reads standard input
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the canonical source of the snippet's function
    Render {
        /// Snippet file; `-` or nothing reads standard input
        path: Option<PathBuf>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate the snippet and print tests from the configured generator
    Generate {
        /// Snippet file; `-` or nothing reads standard input
        path: Option<PathBuf>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without checking any snippet
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            paths,
            format,
            config: config_path,
        } => {
            let resolved_config = load_config(config_path.as_deref())?;
            let reports = check_all(&paths, &resolved_config)?;

            match format {
                OutputFormat::Text => print!("{}", render_text(&reports)),
                OutputFormat::Json => println!("{}", render_json(&reports)),
            }

            if reports.iter().any(|r| !r.is_valid()) {
                std::process::exit(1);
            }
        }
        Commands::Render {
            path,
            config: config_path,
        } => {
            let resolved_config = load_config(config_path.as_deref())?;
            let (_, source) = read_snippet(path.as_deref())?;
            let function = validate_with_policy(&source, &resolved_config.policy)?;
            print!("{}", render(&function));
        }
        Commands::Generate {
            path,
            config: config_path,
        } => {
            let resolved_config = load_config(config_path.as_deref())?;
            let Some(generator_config) = &resolved_config.generator else {
                anyhow::bail!(
                    "no generator configured; set \"generator\" in .unitgenrc.json or unitgen.config.json"
                );
            };
            let (_, source) = read_snippet(path.as_deref())?;
            let generator = CommandGenerator::from_config(generator_config);
            let tests = generate_tests(&source, &resolved_config.policy, &generator)?;
            println!("{}", tests);
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print!("{}", describe_config(&resolved));
            }
        },
    }

    Ok(())
}

/// Load config from `--config` or the current directory, announcing the source
fn load_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved_config = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;

    if let Some(config_path) = &resolved_config.config_path {
        eprintln!("Using config: {}", config_path.display());
    }

    Ok(resolved_config)
}

/// Check every requested path, reading standard input at most once
fn check_all(
    paths: &[PathBuf],
    resolved_config: &ResolvedConfig,
) -> anyhow::Result<Vec<unitgen_core::SnippetReport>> {
    let mut reports = Vec::new();
    let mut stdin_sources = Vec::new();

    if paths.is_empty() {
        stdin_sources.push(read_snippet(None)?);
    }
    for path in paths {
        if is_stdin_path(path) {
            if stdin_sources.is_empty() {
                stdin_sources.push(read_snippet(None)?);
            }
        } else {
            reports.extend(check_path(path, resolved_config)?);
        }
    }

    reports.extend(check_sources(&stdin_sources, &resolved_config.policy));
    Ok(sort_reports(reports))
}

fn is_stdin_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Read one snippet from a file or standard input as `(label, source)`
fn read_snippet(path: Option<&Path>) -> anyhow::Result<(String, String)> {
    let (label, source) = match path.filter(|p| !is_stdin_path(p)) {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read snippet: {}", path.display()))?;
            (path.display().to_string(), source)
        }
        None => (STDIN_LABEL.to_string(), read_stdin()?),
    };

    if source.trim().is_empty() {
        anyhow::bail!("No input provided.");
    }

    Ok((label, source))
}

/// Read a snippet from standard input
///
/// Interactive sessions end at the first blank line; piped input is read whole.
fn read_stdin() -> anyhow::Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Paste your Python function. Press Enter on a blank line to finish:");
        collect_until_blank(stdin.lock()).context("failed to read standard input")
    } else {
        let mut source = String::new();
        stdin
            .lock()
            .read_to_string(&mut source)
            .context("failed to read standard input")?;
        Ok(source)
    }
}

/// Collect lines until the first whitespace-only line or end of input
fn collect_until_blank<R: BufRead>(reader: R) -> std::io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

fn describe_config(resolved: &ResolvedConfig) -> String {
    let mut out = String::from("Configuration:\n");
    match resolved.config_path {
        Some(ref p) => out.push_str(&format!("  Source: {}\n", p.display())),
        None => out.push_str("  Source: defaults (no config file found)\n"),
    }
    out.push('\n');
    out.push_str("Policy:\n");
    out.push_str(&format!(
        "  count_nested_functions: {}\n",
        resolved.policy.count_nested_functions
    ));
    out.push_str(&format!(
        "  count_async_functions: {}\n",
        resolved.policy.count_async_functions
    ));
    out.push('\n');
    out.push_str("Generator:\n");
    match resolved.generator {
        Some(ref generator) if generator.args.is_empty() => {
            out.push_str(&format!("  command: {}\n", generator.command));
        }
        Some(ref generator) => {
            out.push_str(&format!("  command: {}\n", generator.command));
            out.push_str(&format!("  args: {}\n", generator.args.join(" ")));
        }
        None => out.push_str("  none\n"),
    }
    out.push('\n');
    out.push_str("Files:\n");
    out.push_str(&format!(
        "  include: {}\n",
        if resolved.include.is_some() {
            "custom patterns"
        } else {
            "all .py/.pyw files"
        }
    ));
    out.push_str(&format!(
        "  exclude: {}\n",
        if resolved.config_path.is_some() {
            "from config (defaults when empty)"
        } else {
            "defaults"
        }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_collect_until_blank_stops_at_blank_line() {
        let input = "def f(x):\n    return x\n\nprint(f(1))\n";
        assert_eq!(
            collect_until_blank(Cursor::new(input)).unwrap(),
            "def f(x):\n    return x"
        );
    }

    #[test]
    fn test_collect_until_blank_whitespace_line_counts_as_blank() {
        let input = "def f(x):\n   \t\n    return x\n";
        assert_eq!(collect_until_blank(Cursor::new(input)).unwrap(), "def f(x):");
    }

    #[test]
    fn test_collect_until_blank_reads_to_eof() {
        let input = "def f(x):\n    return x";
        assert_eq!(collect_until_blank(Cursor::new(input)).unwrap(), input);
    }

    #[test]
    fn test_collect_until_blank_empty_input() {
        assert_eq!(collect_until_blank(Cursor::new("")).unwrap(), "");
        assert_eq!(collect_until_blank(Cursor::new("\n")).unwrap(), "");
    }

    #[test]
    fn test_read_snippet_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.py");
        std::fs::write(&path, "def f(x):\n    return x\n").unwrap();
        let (label, source) = read_snippet(Some(&path)).unwrap();
        assert_eq!(label, path.display().to_string());
        assert_eq!(source, "def f(x):\n    return x\n");
    }

    #[test]
    fn test_read_snippet_rejects_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.py");
        std::fs::write(&path, "  \n\t\n").unwrap();
        let err = read_snippet(Some(&path)).unwrap_err();
        assert_eq!(err.to_string(), "No input provided.");
    }

    #[test]
    fn test_is_stdin_path() {
        assert!(is_stdin_path(Path::new("-")));
        assert!(!is_stdin_path(Path::new("a.py")));
    }

    #[test]
    fn test_describe_config_defaults() {
        let resolved = ResolvedConfig::defaults().unwrap();
        let text = describe_config(&resolved);
        assert!(text.contains("Source: defaults"));
        assert!(text.contains("count_nested_functions: true"));
        assert!(text.contains("count_async_functions: false"));
        assert!(text.contains("Generator:\n  none\n"));
    }

    #[test]
    fn test_cli_parses_check_arguments() {
        let cli = Cli::try_parse_from(["unitgen", "check", "a.py", "-", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Check { paths, format, .. } => {
                assert_eq!(paths, vec![PathBuf::from("a.py"), PathBuf::from("-")]);
                assert!(matches!(format, OutputFormat::Json));
            }
            _ => panic!("expected check command"),
        }
    }
}
