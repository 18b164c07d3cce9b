#![allow(clippy::result_large_err)]

//! The `KCLRun` function configuration and its decoded, validated form.

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

use crate::core::error::AppError;
use crate::core::kube::KubeObject;
use crate::core::matcher::MatchConstraintsSpec;
use crate::core::source::{Credentials, TransportOptions};
use crate::core::types::ErrorCategory;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

pub const KCL_RUN_API_VERSION: &str = "krm.kcl.dev/v1alpha1";
pub const KCL_RUN_KIND: &str = "KCLRun";

/// Program name used when the KCLRun carries no `metadata.name`.
pub const DEFAULT_PROGRAM_NAME: &str = "kcl-function-run";

/// Annotation that opts a KCLRun into plaintext transport for remote sources.
pub const ANNOTATION_ALLOW_INSECURE_SOURCE: &str = "krm.kcl.dev/allow-insecure-source";

const TRUTHY_VALUES: &[&str] = &["true", "yes", "y", "on", "1", "ok"];

/// Compile options passed through to the KCL engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub work_dir: String,
    /// Top-level `key=value` arguments (`-D`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    /// Setting files (`-Y`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<String>,
    /// Value overrides (`-O`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<String>,
    /// Path selectors (`-S`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub vendor: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sort_keys: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_hidden: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_none: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strict_range_check: bool,
}

/// `spec` of a KCLRun resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KclRunSpec {
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub config: ConfigSpec,
    #[serde(default, skip_serializing_if = "is_default")]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub match_constraints: MatchConstraintsSpec,
    /// Fragment in the `[dependencies]` grammar of `kcl.mod`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dependencies: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Typed KCLRun resource, as rendered back for standalone execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KclRun {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: KclRunSpec,
}

/// Decoded transformation request. Built once per invocation and then read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub name: String,
    pub annotations: BTreeMap<String, String>,
    pub spec: KclRunSpec,
}

impl RunConfig {
    /// Decode and validate a KCLRun function config.
    pub fn configure(object: &KubeObject) -> Result<Self, AppError> {
        if object.is_nil_or_empty() {
            return Err(AppError::new(
                ErrorCategory::InvalidInput,
                "object is nil. Expect a `KCLRun` resource string",
            )
            .with_code("KCL-CFG-001"));
        }
        if object.api_version() != KCL_RUN_API_VERSION || object.kind() != KCL_RUN_KIND {
            return Err(AppError::new(
                ErrorCategory::InvalidInput,
                format!(
                    "resource must be {}, but we got: {}",
                    gvk_string(KCL_RUN_API_VERSION, KCL_RUN_KIND),
                    gvk_string(object.api_version(), object.kind())
                ),
            )
            .with_code("KCL-CFG-002")
            .with_context("kind", object.kind()));
        }

        let spec = match object.fields().get("spec") {
            None | Some(Value::Null) => KclRunSpec::default(),
            Some(value) => serde_yaml::from_value(value.clone()).map_err(|err| {
                AppError::new(
                    ErrorCategory::DecodeFailed,
                    format!("failed to decode KCLRun spec: {}", err),
                )
                .with_code("KCL-DOC-003")
                .with_context("name", object.name())
            })?,
        };

        let name = match object.name() {
            "" => DEFAULT_PROGRAM_NAME.to_string(),
            name => name.to_string(),
        };

        let config = Self {
            name,
            annotations: object.annotations(),
            spec,
        };
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Whether the allow-insecure-source annotation is set to a truthy value.
    pub fn allow_insecure_source(&self) -> bool {
        self.annotations
            .get(ANNOTATION_ALLOW_INSECURE_SOURCE)
            .is_some_and(|value| is_truthy(value))
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            insecure: self.allow_insecure_source(),
        }
    }

    /// Apply `SRC_URL*` environment overrides to the credentials.
    pub fn apply_env_overrides(&mut self) {
        ConfigLoader::apply_env_overrides(self);
    }

    /// Apply credential overrides read through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        ConfigLoader::apply_overrides_from(self, lookup);
    }

    /// Render back to a typed KCLRun resource.
    pub fn to_resource(&self) -> KclRun {
        KclRun {
            api_version: KCL_RUN_API_VERSION.to_string(),
            kind: KCL_RUN_KIND.to_string(),
            metadata: ObjectMeta {
                name: self.name.clone(),
                annotations: self.annotations.clone(),
            },
            spec: self.spec.clone(),
        }
    }

    pub fn to_object(&self) -> Result<KubeObject, AppError> {
        KubeObject::from_serializable(&self.to_resource())
    }
}

/// Annotation truthiness: `true`, `yes`, `y`, `on`, `1` or `ok`, case-insensitive.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    TRUTHY_VALUES
        .iter()
        .any(|candidate| value.eq_ignore_ascii_case(candidate))
}

/// `group/version, Kind=kind`, the usual rendering of a group/version/kind triple.
fn gvk_string(api_version: &str, kind: &str) -> String {
    format!("{}, Kind={}", api_version, kind)
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}
