/// `load_config` module: builds an [`UploadConfig`] from one of two sources.
///
/// - **Action inputs**: the `INPUT_*` environment variables GitHub Actions sets
///   for a step's `with:` block.
/// - **YAML file**: a static file holding the non-secret fields. Credentials are
///   injected from `SHAREFILE_CLIENT_ID`, `SHAREFILE_CLIENT_SECRET`,
///   `SHAREFILE_USERNAME` and `SHAREFILE_PASSWORD`, so the file can be committed.
///
/// Both sources end in [`apply_defaults`], which fills the control plane and
/// timeout. Errors use `anyhow::Error` with context and surface at the CLI boundary.
use anyhow::{Context, Result};
use serde::Deserialize;
use sharefile_upload_core::config::{apply_defaults, Secret, UploadConfig, UploadInputs};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::actions::get_input;

pub const SCRIPT_NAME: &str = "Upload-Sharefile.ps1";
pub const SCRIPT_ENV: &str = "SHAREFILE_UPLOAD_SCRIPT";

/// Environment variables that carry credentials for file-based runs.
pub const CLIENT_ID_ENV: &str = "SHAREFILE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SHAREFILE_CLIENT_SECRET";
pub const USERNAME_ENV: &str = "SHAREFILE_USERNAME";
pub const PASSWORD_ENV: &str = "SHAREFILE_PASSWORD";

/// Non-secret part of the configuration as written in YAML.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub path: String,
    pub exclude: String,
    pub subdomain: String,
    pub destination: String,
    pub application_control_plane: String,
    pub timeout: Option<Timeout>,
}

/// `timeout: 60000` and `timeout: "60000"` are both accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Timeout {
    Millis(u64),
    Text(String),
}

impl Timeout {
    fn into_text(self) -> String {
        match self {
            Timeout::Millis(ms) => ms.to_string(),
            Timeout::Text(text) => text,
        }
    }
}

/// Picks the uploader script: explicit flag, `SHAREFILE_UPLOAD_SCRIPT`,
/// `$GITHUB_ACTION_PATH/Upload-Sharefile.ps1`, then `./Upload-Sharefile.ps1`.
pub fn resolve_script_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(path) = std::env::var_os(SCRIPT_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(dir) = std::env::var_os("GITHUB_ACTION_PATH").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir).join(SCRIPT_NAME);
    }
    PathBuf::from(".").join(SCRIPT_NAME)
}

/// Reads the step inputs GitHub Actions passes as `INPUT_*` variables.
pub fn load_action_inputs(script: Option<PathBuf>) -> Result<UploadConfig> {
    let inputs = UploadInputs {
        path: get_input("path"),
        exclude: get_input("exclude"),
        client_id: Secret::new(get_input("client-id")),
        client_secret: Secret::new(get_input("client-secret")),
        username: Secret::new(get_input("username")),
        password: Secret::new(get_input("password")),
        subdomain: get_input("subdomain"),
        destination: get_input("destination"),
        application_control_plane: get_input("application-control-plane"),
        timeout: get_input("timeout"),
    };
    info!("Read action inputs from environment");

    let config = apply_defaults(inputs, resolve_script_path(script))
        .context("Invalid action inputs")?;
    config.trace_loaded();
    Ok(config)
}

/// Loads a static YAML config file (no secrets) and injects credentials from the environment.
pub fn load_config<P: AsRef<Path>>(path: P, script: Option<PathBuf>) -> Result<UploadConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let file: FileConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let inputs = UploadInputs {
        path: file.path,
        exclude: file.exclude,
        client_id: secret_from_env(CLIENT_ID_ENV)?,
        client_secret: secret_from_env(CLIENT_SECRET_ENV)?,
        username: secret_from_env(USERNAME_ENV)?,
        password: secret_from_env(PASSWORD_ENV)?,
        subdomain: file.subdomain,
        destination: file.destination,
        application_control_plane: file.application_control_plane,
        timeout: file.timeout.map(Timeout::into_text).unwrap_or_default(),
    };

    let config = apply_defaults(inputs, resolve_script_path(script))
        .with_context(|| format!("Invalid configuration in {}", path_ref.display()))?;
    config.trace_loaded();
    Ok(config)
}

fn secret_from_env(var: &str) -> Result<Secret> {
    match std::env::var(var) {
        Ok(value) => {
            info!(var, set = !value.is_empty(), "Credential found in env");
            Ok(Secret::new(value))
        }
        Err(e) => {
            error!(error = ?e, var, "Credential environment variable not set");
            Err(anyhow::anyhow!("{var} environment variable not set: {e}"))
        }
    }
}
