#![allow(clippy::result_large_err)]

use super::RunConfig;
use crate::core::error::AppError;
use crate::core::kube::parse_documents;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::{Path, PathBuf};

pub const SRC_URL_ENV: &str = "SRC_URL";
pub const SRC_URL_USERNAME_ENV: &str = "SRC_URL_USERNAME";
pub const SRC_URL_PASSWORD_ENV: &str = "SRC_URL_PASSWORD";
pub const KCL_BIN_ENV: &str = "KCL_BIN";

const DEFAULT_KCL_BIN: &str = "kcl";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a KCLRun from a YAML file. The first non-empty document is used.
    pub fn load_from_file(path: &Path) -> Result<RunConfig, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read KCLRun file {}: {}", path.display(), e),
            )
            .with_context("path", path.display().to_string())
        })?;

        let object = parse_documents(&content)
            .map_err(|e| e.with_context("path", path.display().to_string()))?
            .into_iter()
            .next()
            .unwrap_or_default();

        RunConfig::configure(&object).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    /// Apply `SRC_URL`, `SRC_URL_USERNAME` and `SRC_URL_PASSWORD` from the process environment.
    pub fn apply_env_overrides(config: &mut RunConfig) {
        Self::apply_overrides_from(config, |key| env::var(key).ok());
    }

    /// Apply credential overrides; only non-empty values replace decoded credentials.
    pub fn apply_overrides_from<F>(config: &mut RunConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let credentials = &mut config.spec.credentials;

        if let Some(url) = non_empty(SRC_URL_ENV) {
            credentials.url = url;
        }
        if let Some(username) = non_empty(SRC_URL_USERNAME_ENV) {
            credentials.username = username;
        }
        if let Some(password) = non_empty(SRC_URL_PASSWORD_ENV) {
            credentials.password = password;
        }
    }

    /// Path of the `kcl` executable, from `KCL_BIN` or the `PATH` default.
    pub fn kcl_binary() -> PathBuf {
        env::var(KCL_BIN_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KCL_BIN))
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "SRC_URL - Override spec.credentials.url (registry to log in to for OCI sources)",
            "SRC_URL_USERNAME - Override spec.credentials.username",
            "SRC_URL_PASSWORD - Override spec.credentials.password",
            "KCL_BIN - Path of the kcl executable (default: kcl on PATH)",
            "KRM_KCL_LOG_LEVEL - Log level (default: info; RUST_LOG takes precedence)",
            "KRM_KCL_LOG_CONSOLE - Console log sink: stdout, stderr or none (default: stderr)",
            "KRM_KCL_LOG_DIR - Directory for the rolling log file (disabled when unset)",
        ]
    }
}
