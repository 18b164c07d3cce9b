use super::{DependencyManifest, PackageClient};
use crate::core::error::AppError;
use crate::core::source::{RegistryLogin, TransportOptions};
use crate::core::types::ErrorCategory;
use crate::tools::{CommandExecutionRequest, CommandRunner, TokioCommandRunner};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const KCL_MOD_FILE: &str = "kcl.mod";

/// [`PackageClient`] backed by the `kcl` command line.
pub struct KclCliPackageClient {
    kcl_bin: PathBuf,
    base_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

#[derive(Deserialize)]
struct ModMetadata {
    #[serde(default)]
    packages: HashMap<String, PackageMetadata>,
}

#[derive(Deserialize)]
struct PackageMetadata {
    manifest_path: String,
}

impl KclCliPackageClient {
    pub fn new(kcl_bin: PathBuf) -> Self {
        Self::with_runner(kcl_bin, Arc::new(TokioCommandRunner))
    }

    pub fn with_runner(kcl_bin: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            kcl_bin,
            base_dir: std::env::current_dir().unwrap_or_default(),
            runner,
        }
    }

    /// Directory relative local dependency paths are resolved against.
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = base_dir;
        self
    }
}

#[async_trait]
impl PackageClient for KclCliPackageClient {
    async fn login(
        &self,
        login: &RegistryLogin,
        transport: &TransportOptions,
    ) -> Result<(), AppError> {
        tracing::info!(registry = %login.registry, username = %login.username, "logging in to OCI registry");
        let request = CommandExecutionRequest {
            program: self.kcl_bin.clone(),
            args: vec![
                "registry".to_string(),
                "login".to_string(),
                login.registry.clone(),
                "-u".to_string(),
                login.username.clone(),
                "--password-stdin".to_string(),
            ],
            env: transport.child_env(),
            stdin: Some(login.password.clone().into_bytes()),
            ..Default::default()
        };

        let output = self.runner.run(&request).await.map_err(|err| {
            let message = format!("registry login to {} failed: {}", login.registry, err);
            AppError::with_source(ErrorCategory::AuthenticationFailed, message, Box::new(err))
                .with_code("KCL-SRC-002")
                .with_context("registry", login.registry.as_str())
        })?;
        if !output.success() {
            return Err(AppError::new(
                ErrorCategory::AuthenticationFailed,
                format!(
                    "registry login to {} failed with exit code {}",
                    login.registry, output.exit_code
                ),
            )
            .with_code("KCL-SRC-002")
            .with_context("registry", login.registry.as_str())
            .with_context("stderr", output.stderr_lossy().trim()));
        }
        Ok(())
    }

    async fn resolve_dependencies(
        &self,
        manifest: &DependencyManifest,
        transport: &TransportOptions,
    ) -> Result<Vec<String>, AppError> {
        if manifest.is_empty() {
            return Ok(Vec::new());
        }

        let workdir = tempfile::tempdir()?;
        let kcl_mod = manifest.to_kcl_mod(&self.base_dir)?;
        tokio::fs::write(workdir.path().join(KCL_MOD_FILE), kcl_mod).await?;

        tracing::debug!(
            dependencies = manifest.dependencies.len(),
            "resolving KCL dependencies"
        );
        let request = CommandExecutionRequest {
            program: self.kcl_bin.clone(),
            args: vec![
                "mod".to_string(),
                "metadata".to_string(),
                "--update".to_string(),
            ],
            cwd: Some(workdir.path().to_path_buf()),
            env: transport.child_env(),
            stdin: None,
        };
        let output = self
            .runner
            .run(&request)
            .await
            .map_err(|err| resolution_error(format!("failed to run kcl mod metadata: {}", err)))?;
        if !output.success() {
            return Err(resolution_error(format!(
                "kcl mod metadata exited with code {}",
                output.exit_code
            ))
            .with_context("stderr", output.stderr_lossy().trim()));
        }

        let metadata: ModMetadata = serde_json::from_slice(&output.stdout).map_err(|err| {
            resolution_error(format!("failed to decode package metadata: {}", err))
        })?;

        manifest
            .names()
            .map(|name| {
                metadata
                    .packages
                    .get(name)
                    .map(|package| format!("{}={}", name, package.manifest_path))
                    .ok_or_else(|| {
                        resolution_error(format!("dependency {} was not resolved", name))
                            .with_context("dependency", name)
                    })
            })
            .collect()
    }
}

fn resolution_error(message: String) -> AppError {
    AppError::new(ErrorCategory::DependencyResolutionFailed, message).with_code("KCL-DEP-002")
}
