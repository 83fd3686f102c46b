///
/// This module implements the CLI interface for sharefile-upload: command parsing,
/// choosing a configuration source, and reporting the result the way the host expects.
///
/// All resolution, quoting and pipeline logic lives in the [`sharefile-upload-core`] crate.
/// This module is strictly glue.
///
/// ## Commands
/// - `action`: run as a GitHub Actions step. Inputs come from `INPUT_*` variables,
///   secrets are masked with `::add-mask::`, the link is published as the
///   `share-url` step output and failures are annotated with `::error::`.
/// - `upload`: run from a YAML config file with credentials from the environment.
///   `--dry-run` prints the resolved files and the redacted command instead of running it.
///
/// [`sharefile-upload-core`]: ../../sharefile-upload-core/
use crate::actions::{self, ActionsMasker};
use crate::load_config::{load_action_inputs, load_config};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sharefile_upload_core::config::UploadConfig;
use sharefile_upload_core::contract::{NoopMasker, SecretMasker};
use sharefile_upload_core::executor::ProcessExecutor;
use sharefile_upload_core::invocation::ShellKind;
use sharefile_upload_core::upload::{plan, upload, UploadError, UploadReport};
use std::path::{Path, PathBuf};

/// CLI for sharefile-upload: resolve files and upload them to a ShareFile folder.
#[derive(Parser)]
#[clap(
    name = "sharefile-upload",
    version,
    about = "Resolve include/exclude patterns and upload the files to ShareFile, printing a share link"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as a GitHub Actions step using the step's inputs
    Action {
        /// Uploader script (defaults to $GITHUB_ACTION_PATH/Upload-Sharefile.ps1)
        #[clap(long)]
        script: Option<PathBuf>,
        /// PowerShell executable (defaults to powershell, then pwsh, on PATH)
        #[clap(long)]
        shell: Option<PathBuf>,
    },
    /// Upload using a YAML config file; credentials come from SHAREFILE_* variables
    Upload {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Uploader script (defaults to ./Upload-Sharefile.ps1)
        #[clap(long)]
        script: Option<PathBuf>,
        /// PowerShell executable (defaults to powershell, then pwsh, on PATH)
        #[clap(long)]
        shell: Option<PathBuf>,
        /// Print the resolved files and the command without running it
        #[clap(long)]
        dry_run: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Action { script, shell } => {
            tracing::info!(command = "action", "Starting upload step");
            let result = run_action(script, shell).await;
            if let Err(e) = &result {
                tracing::error!(command = "action", error = %e, "Upload step failed");
                actions::set_failed(&format!("{e:#}"));
            }
            result
        }
        Commands::Upload {
            config,
            script,
            shell,
            dry_run,
        } => {
            let config = load_config(config, script)?;
            if dry_run {
                print_plan(&config);
                return Ok(());
            }
            tracing::info!(command = "upload", "Starting upload");
            let report = execute(&config, shell.as_deref(), &NoopMasker).await?;
            println!("{}", report.share_url);
            Ok(())
        }
    }
}

async fn run_action(script: Option<PathBuf>, shell: Option<PathBuf>) -> Result<()> {
    let config = load_action_inputs(script)?;
    let masker: Box<dyn SecretMasker> = if actions::is_github_actions() {
        Box::new(ActionsMasker)
    } else {
        Box::new(NoopMasker)
    };
    let report = execute(&config, shell.as_deref(), masker.as_ref()).await?;
    actions::set_output("share-url", &report.share_url)?;
    Ok(())
}

async fn execute<M>(config: &UploadConfig, shell: Option<&Path>, masker: &M) -> Result<UploadReport>
where
    M: SecretMasker + ?Sized,
{
    let executor = match shell {
        Some(program) => ProcessExecutor::new(program, shell_kind(program)),
        None => ProcessExecutor::locate()?,
    };
    let report = upload(config, &executor, masker)
        .await
        .context("Upload failed")?;
    tracing::info!(?report, "Upload complete");
    Ok(report)
}

/// Process exit status for a failed run: the uploader's own non-zero code when it
/// ran to completion, 1 for everything else.
pub fn failure_exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<UploadError>())
        .and_then(|e| u8::try_from(e.exit_code()).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

/// `powershell`/`powershell.exe` is Windows PowerShell; anything else is treated as `pwsh`.
fn shell_kind(program: &Path) -> ShellKind {
    let is_windows_powershell = program
        .file_stem()
        .map(|stem| stem.eq_ignore_ascii_case("powershell"))
        .unwrap_or(false);
    if is_windows_powershell {
        ShellKind::WindowsPowerShell
    } else {
        ShellKind::PowerShellCore
    }
}

fn print_plan(config: &UploadConfig) {
    let plan = plan(config);
    println!("Files ({}):", plan.files.len());
    for file in plan.files.iter() {
        println!("  {}", file.display());
    }
    println!("Excluded: {}", plan.excludes.len());
    println!("Command: {}", plan.invocation);
}
