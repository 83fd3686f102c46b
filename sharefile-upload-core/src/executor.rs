//! Real [`CommandExecutor`]: runs the invocation through a PowerShell host.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::contract::{CommandExecutor, ExecuteError, ExecutionOutput};
use crate::invocation::{Invocation, ShellKind};

/// Shell executables looked up on `PATH`, in order of preference.
const SHELL_CANDIDATES: [(&str, ShellKind); 2] = [
    ("powershell", ShellKind::WindowsPowerShell),
    ("pwsh", ShellKind::PowerShellCore),
];

pub struct ProcessExecutor {
    program: PathBuf,
    shell: ShellKind,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<PathBuf>, shell: ShellKind) -> Self {
        Self {
            program: program.into(),
            shell,
        }
    }

    /// Finds `powershell`, falling back to `pwsh`.
    pub fn locate() -> Result<Self, ExecuteError> {
        for (name, shell) in SHELL_CANDIDATES {
            if let Ok(program) = which::which(name) {
                info!(program = %program.display(), ?shell, "Located PowerShell host");
                return Ok(Self::new(program, shell));
            }
            debug!(name, "PowerShell candidate not on PATH");
        }
        let tried = SHELL_CANDIDATES
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        error!(tried = %tried, "No PowerShell host found");
        Err(ExecuteError::ShellNotFound { tried })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn shell(&self) -> ShellKind {
        self.shell
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ExecutionOutput, ExecuteError> {
        info!(
            program = %self.program.display(),
            command = %invocation,
            "Launching uploader"
        );
        let output = Command::new(&self.program)
            .args(invocation.shell_args(self.shell))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| {
                error!(error = ?source, program = %self.program.display(), "Failed to launch uploader");
                ExecuteError::Launch {
                    program: self.program.display().to_string(),
                    source,
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            exit_code = ?output.status.code(),
            stdout_len = stdout.len(),
            "Uploader exited"
        );
        Ok(ExecutionOutput {
            exit_code: output.status.code(),
            stdout,
        })
    }
}
