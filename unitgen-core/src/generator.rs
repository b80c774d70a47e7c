//! Hand-off of a validated function to a test generator
//!
//! The generator itself lives outside this crate. `CommandGenerator` runs a
//! configured program with the rendered function on stdin and takes whatever
//! it prints on stdout as the generated tests.

use crate::config::GeneratorConfig;
use crate::policy::ValidationPolicy;
use crate::render::render;
use crate::validate_with_policy;
use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Turns the canonical source of one function into unit test source
pub trait TestGenerator {
    fn generate(&self, function_source: &str) -> Result<String>;
}

/// Runs an external program as the test generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandGenerator {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        CommandGenerator::new(config.command.clone(), config.args.clone())
    }
}

impl TestGenerator for CommandGenerator {
    fn generate(&self, function_source: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to invoke generator: {}", self.program))?;

        // stdout is drained concurrently with the stdin write
        let mut stdin = child
            .stdin
            .take()
            .context("generator stdin was not captured")?;
        let input = function_source.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for generator: {}", self.program))?;

        check_stdin_write(writer.join(), output.status.success())?;

        if !output.status.success() {
            anyhow::bail!(
                "generator {} failed ({}): {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).context("generator output is not UTF-8")?;
        Ok(stdout.trim().to_string())
    }
}

/// Result of the thread feeding the generator's stdin
///
/// A generator may exit without reading its input; only its exit status
/// matters then. A broken pipe, or any write error after a failed run, is
/// dropped. A panicked writer is always an error.
fn check_stdin_write(
    joined: std::thread::Result<std::io::Result<()>>,
    exited_ok: bool,
) -> Result<()> {
    match joined {
        Err(_) => anyhow::bail!("generator input writer panicked"),
        Ok(Err(e)) if exited_ok && e.kind() != std::io::ErrorKind::BrokenPipe => {
            Err(e).context("failed to write function to generator")
        }
        Ok(_) => Ok(()),
    }
}

/// Validate a snippet, render the function and hand it to the generator
///
/// A rejected snippet never reaches the generator; the returned error then
/// downcasts to [`crate::Rejection`].
pub fn generate_tests(
    source: &str,
    policy: &ValidationPolicy,
    generator: &dyn TestGenerator,
) -> Result<String> {
    let function = validate_with_policy(source, policy)?;
    generator.generate(&render(&function))
}
