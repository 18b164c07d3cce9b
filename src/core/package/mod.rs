#![allow(clippy::result_large_err)]

//! External KCL package dependencies declared by a KCLRun.

pub mod kcl_cli;

pub use kcl_cli::KclCliPackageClient;

use crate::core::error::AppError;
use crate::core::source::{RegistryLogin, TransportOptions};
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

const DEPENDENCIES_HEADER: &str = "[dependencies]";
const MANIFEST_PACKAGE_NAME: &str = "krm_kcl_deps";
const MANIFEST_EDITION: &str = "v0.9.0";
const MANIFEST_VERSION: &str = "0.0.1";

/// Where a dependency is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// Default registry, `name = "1.28"`.
    Registry { version: String },
    Oci { oci: String, tag: Option<String> },
    Git {
        git: String,
        tag: Option<String>,
        commit: Option<String>,
        branch: Option<String>,
    },
    Local { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub source: DependencySource,
}

/// Parsed `[dependencies]` section of a kcl.mod.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyManifest {
    pub dependencies: Vec<Dependency>,
}

impl DependencyManifest {
    /// Parse a dependency fragment, with or without the `[dependencies]` header.
    pub fn parse(fragment: &str) -> Result<Self, AppError> {
        let has_header = fragment
            .lines()
            .any(|line| line.trim() == DEPENDENCIES_HEADER);
        let document = if has_header {
            fragment.to_string()
        } else {
            format!("{}\n{}", DEPENDENCIES_HEADER, fragment)
        };

        let mut table: toml::Table = toml::from_str(&document).map_err(|err| {
            manifest_error(format!("failed to parse dependencies: {}", err))
        })?;
        let entries = match table.remove("dependencies") {
            Some(toml::Value::Table(entries)) => entries,
            Some(_) => return Err(manifest_error("`dependencies` must be a table".to_string())),
            None => toml::Table::new(),
        };

        let dependencies = entries
            .into_iter()
            .map(|(name, value)| {
                let source = dependency_source(&name, value)?;
                Ok(Dependency { name, source })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(Self { dependencies })
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|dep| dep.name.as_str())
    }

    /// Render a complete kcl.mod. Relative local paths are resolved against `base_dir`.
    pub fn to_kcl_mod(&self, base_dir: &Path) -> Result<String, AppError> {
        let manifest = KclMod {
            package: KclModPackage {
                name: MANIFEST_PACKAGE_NAME,
                edition: MANIFEST_EDITION,
                version: MANIFEST_VERSION,
            },
            dependencies: self
                .dependencies
                .iter()
                .map(|dep| (dep.name.clone(), render_source(&dep.source, base_dir)))
                .collect(),
        };
        toml::to_string(&manifest).map_err(|err| {
            AppError::new(
                ErrorCategory::SerializationError,
                format!("failed to render kcl.mod: {}", err),
            )
        })
    }
}

/// Client for the KCL package tooling.
#[async_trait]
pub trait PackageClient: Send + Sync {
    /// Log in to an OCI registry before its artifacts are pulled.
    async fn login(
        &self,
        login: &RegistryLogin,
        transport: &TransportOptions,
    ) -> Result<(), AppError>;

    /// Fetch dependencies and return `name=path` entries for the engine's external packages.
    async fn resolve_dependencies(
        &self,
        manifest: &DependencyManifest,
        transport: &TransportOptions,
    ) -> Result<Vec<String>, AppError>;
}

#[derive(Serialize)]
struct KclMod {
    package: KclModPackage,
    dependencies: toml::Table,
}

#[derive(Serialize)]
struct KclModPackage {
    name: &'static str,
    edition: &'static str,
    version: &'static str,
}

fn dependency_source(name: &str, value: toml::Value) -> Result<DependencySource, AppError> {
    let table = match value {
        toml::Value::String(version) => return Ok(DependencySource::Registry { version }),
        toml::Value::Table(table) => table,
        other => {
            return Err(manifest_error(format!(
                "dependency {} must be a version string or a table, got {}",
                name,
                other.type_str()
            ))
            .with_context("dependency", name))
        }
    };

    let field = |key: &str| table.get(key).and_then(toml::Value::as_str).map(str::to_string);

    if let Some(oci) = field("oci") {
        return Ok(DependencySource::Oci {
            oci,
            tag: field("tag"),
        });
    }
    if let Some(git) = field("git") {
        return Ok(DependencySource::Git {
            git,
            tag: field("tag"),
            commit: field("commit"),
            branch: field("branch"),
        });
    }
    if let Some(path) = field("path") {
        return Ok(DependencySource::Local {
            path: PathBuf::from(path),
        });
    }
    if let Some(version) = field("version") {
        return Ok(DependencySource::Registry { version });
    }
    Err(
        manifest_error(format!("dependency {} has no oci, git, path or version", name))
            .with_context("dependency", name),
    )
}

fn render_source(source: &DependencySource, base_dir: &Path) -> toml::Value {
    let mut table = toml::Table::new();
    let mut put = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            table.insert(key.to_string(), toml::Value::String(value.clone()));
        }
    };
    match source {
        DependencySource::Registry { version } => return toml::Value::String(version.clone()),
        DependencySource::Oci { oci, tag } => {
            put("oci", &Some(oci.clone()));
            put("tag", tag);
        }
        DependencySource::Git {
            git,
            tag,
            commit,
            branch,
        } => {
            put("git", &Some(git.clone()));
            put("tag", tag);
            put("commit", commit);
            put("branch", branch);
        }
        DependencySource::Local { path } => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            put("path", &Some(path.display().to_string()));
        }
    }
    toml::Value::Table(table)
}

fn manifest_error(message: String) -> AppError {
    AppError::new(ErrorCategory::DependencyResolutionFailed, message).with_code("KCL-DEP-001")
}
