//! GitHub Actions workflow commands: inputs, secret masking, outputs and failure annotations.
//!
//! Commands are written to stdout, which the runner parses line by line.

use anyhow::{Context, Result};
use sharefile_upload_core::contract::SecretMasker;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// True when running inside a GitHub Actions job.
pub fn is_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false)
}

/// Environment variable name the runner uses for input `name`.
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Value of step input `name`, trimmed; empty when unset.
pub fn get_input(name: &str) -> String {
    std::env::var(input_env_name(name))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Escapes a workflow command's data part.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn add_mask_command(value: &str) -> String {
    format!("::add-mask::{}", escape_data(value))
}

pub fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// Registers secrets with the runner's log scrubber.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionsMasker;

impl SecretMasker for ActionsMasker {
    fn mask(&self, value: &str) {
        println!("{}", add_mask_command(value));
    }
}

/// Marks the step failed with `message`.
pub fn set_failed(message: &str) {
    println!("{}", error_command(message));
}

/// Publishes step output `name`.
///
/// Appends to the `$GITHUB_OUTPUT` file when the runner provides one,
/// otherwise prints `name=value`.
pub fn set_output(name: &str, value: &str) -> Result<()> {
    match std::env::var_os("GITHUB_OUTPUT").filter(|v| !v.is_empty()) {
        Some(file) => append_output(Path::new(&file), name, value),
        None => {
            println!("{name}={value}");
            Ok(())
        }
    }
}

fn append_output(file: &Path, name: &str, value: &str) -> Result<()> {
    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("Failed to open output file {}", file.display()))?;
    out.write_all(format_output(name, value).as_bytes())
        .with_context(|| format!("Failed to write output file {}", file.display()))?;
    Ok(())
}

/// `name=value`, or the heredoc form when the value spans lines.
fn format_output(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{name}={value}\n");
    }
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}
