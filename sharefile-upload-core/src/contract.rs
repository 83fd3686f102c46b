//! # contract: capabilities the upload pipeline depends on
//!
//! The pipeline itself only resolves patterns and builds an invocation. Two
//! things it cannot do on its own are expressed as traits here:
//!
//! - [`CommandExecutor`]: run an [`Invocation`] and hand back its exit status
//!   and captured standard output. The real implementation spawns PowerShell
//!   (see [`crate::executor::ProcessExecutor`]).
//! - [`SecretMasker`]: tell the host environment which values to scrub from
//!   its logs before anything containing them is produced.
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall`; `MockCommandExecutor` and
//! `MockSecretMasker` are exported with the default `test-export-mocks`
//! feature so dependent crates can drive the pipeline without spawning
//! processes.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use thiserror::Error;

use crate::invocation::Invocation;

/// What came back from a finished uploader process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output, untrimmed.
    pub stdout: String,
}

impl ExecutionOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        ExecutionOutput {
            exit_code: Some(0),
            stdout: stdout.into(),
        }
    }

    pub fn failed(code: i32) -> Self {
        ExecutionOutput {
            exit_code: Some(code),
            stdout: String::new(),
        }
    }
}

/// The process could not be started at all.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("no PowerShell executable found on PATH (tried {tried})")]
    ShellNotFound { tried: String },
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a built invocation to completion.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute `invocation`, blocking the caller until the process exits.
    ///
    /// A non-zero exit is reported through [`ExecutionOutput::exit_code`], not as an error.
    async fn execute(&self, invocation: &Invocation) -> Result<ExecutionOutput, ExecuteError>;
}

/// Registers a value for redaction with the host environment's log scrubber.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait SecretMasker: Send + Sync {
    fn mask(&self, value: &str);
}

/// Masker for hosts without a log scrubber.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMasker;

impl SecretMasker for NoopMasker {
    fn mask(&self, _value: &str) {}
}
