//! High-level pipeline: resolve → build → execute, once per run.
//!
//! # Steps
//! 1. Mark the credentials with the host's [`SecretMasker`]
//! 2. Resolve include and exclude pattern text ([`crate::resolve`])
//! 3. Subtract excludes from includes
//! 4. Build the uploader [`Invocation`]
//! 5. Execute it through a [`CommandExecutor`] and trim stdout into the share URL
//!
//! # Error Handling
//! An empty file list is not an error; it is passed on as `@()` and the
//! uploader decides. A process that cannot be launched, exits non-zero or is
//! killed ends the run with an [`UploadError`]. Nothing is retried.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::UploadConfig;
use crate::contract::{CommandExecutor, ExecuteError, SecretMasker};
use crate::invocation::{build_invocation, Invocation};
use crate::resolve::{compute_final_list, resolve_excludes, resolve_includes, ResolvedFileList};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("uploader could not be started: {0}")]
    Launch(#[from] ExecuteError),
    #[error("uploader exited with code {code}")]
    Execution { code: i32 },
    #[error("uploader was terminated before it exited")]
    Terminated,
}

impl UploadError {
    /// Exit code to report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            UploadError::Execution { code } => *code,
            _ => 1,
        }
    }
}

/// Everything decided before the uploader runs.
#[derive(Debug)]
pub struct UploadPlan {
    pub files: ResolvedFileList,
    pub excludes: ResolvedFileList,
    pub invocation: Invocation,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub share_url: String,
    pub files: Vec<PathBuf>,
    /// Number of files matched by the exclude patterns.
    pub excluded: usize,
}

/// Resolves the file lists and builds the invocation without executing it.
pub fn plan(config: &UploadConfig) -> UploadPlan {
    let includes = resolve_includes(&config.include_patterns);
    let excludes = resolve_excludes(&config.exclude_patterns);
    let files = compute_final_list(&includes, &excludes);

    if files.is_empty() {
        warn!(
            included = includes.len(),
            excluded = excludes.len(),
            "No files left to upload after resolving patterns"
        );
    } else {
        info!(
            files = files.len(),
            excluded = includes.len() - files.len(),
            "Resolved files to upload"
        );
    }

    let invocation = build_invocation(config, &files, &excludes);
    debug!(command = %invocation, "Built uploader invocation");
    UploadPlan {
        files,
        excludes,
        invocation,
    }
}

/// Runs one upload and returns the share link printed by the uploader.
pub async fn upload<E, M>(
    config: &UploadConfig,
    executor: &E,
    masker: &M,
) -> Result<UploadReport, UploadError>
where
    E: CommandExecutor + ?Sized,
    M: SecretMasker + ?Sized,
{
    info!("[UPLOAD] Starting upload");
    for secret in config.secrets() {
        if !secret.is_empty() {
            masker.mask(secret.expose());
        }
    }

    let plan = plan(config);

    let output = match executor.execute(&plan.invocation).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "[UPLOAD][ERROR] Uploader launch failed");
            return Err(UploadError::Launch(e));
        }
    };

    match output.exit_code {
        Some(0) => {}
        Some(code) => {
            error!(code, "[UPLOAD][ERROR] Uploader exited with non-zero code");
            return Err(UploadError::Execution { code });
        }
        None => {
            error!("[UPLOAD][ERROR] Uploader terminated by signal");
            return Err(UploadError::Terminated);
        }
    }

    let report = UploadReport {
        share_url: output.stdout.trim().to_string(),
        files: plan.files.to_vec(),
        excluded: plan.excludes.len(),
    };
    info!(share_url = %report.share_url, files = report.files.len(), "[UPLOAD] Upload complete");
    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!(json = %json, "[UPLOAD][DEBUG] Upload report as JSON"),
        Err(e) => error!(error = ?e, "[UPLOAD][DEBUG] Failed to serialize upload report as JSON"),
    }
    Ok(report)
}
