//! Upload configuration: the raw input record and the defaulted, immutable
//! [`UploadConfig`] the pipeline runs against.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Control-plane host used when none is configured.
pub const DEFAULT_APPLICATION_CONTROL_PLANE: &str = "sharefile.com";

/// Uploader timeout in milliseconds used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// A credential value. Never printed by `Debug`; read it with [`Secret::expose`].
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

/// Raw configuration values, exactly as a configuration source supplies them.
///
/// Keys follow the action input names (`client-id`, `application-control-plane`, ...).
/// Absent keys deserialize to empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UploadInputs {
    /// Include patterns, newline-delimited.
    pub path: String,
    /// Exclude patterns, newline-delimited.
    pub exclude: String,
    pub client_id: Secret,
    pub client_secret: Secret,
    pub username: Secret,
    pub password: Secret,
    pub subdomain: String,
    pub destination: String,
    pub application_control_plane: String,
    /// Milliseconds, as text.
    pub timeout: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("timeout must be a whole number of milliseconds, got {value:?}")]
    InvalidTimeout {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Fully defaulted configuration for one upload run. Read-only after construction.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub client_id: Secret,
    pub client_secret: Secret,
    pub username: Secret,
    pub password: Secret,
    pub subdomain: String,
    pub destination: String,
    pub application_control_plane: String,
    pub timeout_ms: u64,
    pub include_patterns: String,
    pub exclude_patterns: String,
    /// Uploader script handed to the shell.
    pub script_path: PathBuf,
}

/// Fills the optional fields of `inputs` and produces an [`UploadConfig`].
///
/// An empty `application-control-plane` becomes [`DEFAULT_APPLICATION_CONTROL_PLANE`],
/// an empty `timeout` becomes [`DEFAULT_TIMEOUT_MS`]. Required fields are passed
/// through untouched even when empty.
pub fn apply_defaults(
    inputs: UploadInputs,
    script_path: impl Into<PathBuf>,
) -> Result<UploadConfig, ConfigError> {
    let application_control_plane = if inputs.application_control_plane.trim().is_empty() {
        debug!(
            default = DEFAULT_APPLICATION_CONTROL_PLANE,
            "No application control plane configured, using default"
        );
        DEFAULT_APPLICATION_CONTROL_PLANE.to_string()
    } else {
        inputs.application_control_plane
    };

    let timeout_raw = inputs.timeout.trim();
    let timeout_ms = if timeout_raw.is_empty() {
        debug!(default = DEFAULT_TIMEOUT_MS, "No timeout configured, using default");
        DEFAULT_TIMEOUT_MS
    } else {
        timeout_raw
            .parse::<u64>()
            .map_err(|source| ConfigError::InvalidTimeout {
                value: timeout_raw.to_string(),
                source,
            })?
    };

    Ok(UploadConfig {
        client_id: inputs.client_id,
        client_secret: inputs.client_secret,
        username: inputs.username,
        password: inputs.password,
        subdomain: inputs.subdomain,
        destination: inputs.destination,
        application_control_plane,
        timeout_ms,
        include_patterns: inputs.path,
        exclude_patterns: inputs.exclude,
        script_path: script_path.into(),
    })
}

impl UploadConfig {
    pub fn trace_loaded(&self) {
        info!(
            subdomain = %self.subdomain,
            destination = %self.destination,
            control_plane = %self.application_control_plane,
            timeout_ms = self.timeout_ms,
            script = %self.script_path.display(),
            "Loaded upload configuration"
        );
        debug!(?self, "Upload configuration (full debug)");
    }

    /// The credential fields, in the order they are marked for redaction.
    pub fn secrets(&self) -> [&Secret; 4] {
        [
            &self.client_id,
            &self.client_secret,
            &self.username,
            &self.password,
        ]
    }
}
