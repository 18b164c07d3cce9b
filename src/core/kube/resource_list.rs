use super::KubeObject;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

pub const RESOURCE_LIST_API_VERSION: &str = "config.kubernetes.io/v1";
pub const RESOURCE_LIST_KIND: &str = "ResourceList";

/// KRM function input/output envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    pub api_version: String,
    pub kind: String,
    pub items: Vec<KubeObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_config: Option<KubeObject>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FunctionResult>,
}

/// Diagnostic entry reported back to the pipeline runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResult {
    pub message: String,
    pub severity: ResultSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<ResultField>,
}

/// Field of the referenced resource a result is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultField {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResourceList {
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    function_config: Option<Value>,
    #[serde(default)]
    results: Vec<FunctionResult>,
}

impl ResourceList {
    pub fn new(items: Vec<KubeObject>, function_config: Option<KubeObject>) -> Self {
        Self {
            api_version: RESOURCE_LIST_API_VERSION.to_string(),
            kind: RESOURCE_LIST_KIND.to_string(),
            items,
            function_config,
            results: Vec::new(),
        }
    }

    /// Decode a ResourceList, failing on the first item that is not a mapping.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let raw: RawResourceList = serde_yaml::from_str(text).map_err(|err| {
            AppError::new(
                ErrorCategory::DecodeFailed,
                format!("failed to parse ResourceList: {}", err),
            )
            .with_code("KCL-DOC-004")
        })?;
        if raw.kind != RESOURCE_LIST_KIND {
            return Err(AppError::new(
                ErrorCategory::InvalidInput,
                format!(
                    "input must be a {}, but we got kind {:?}",
                    RESOURCE_LIST_KIND, raw.kind
                ),
            )
            .with_code("KCL-DOC-005"));
        }

        let mut items = Vec::with_capacity(raw.items.len());
        for (index, value) in raw.items.into_iter().enumerate() {
            if value.is_null() {
                return Err(AppError::new(
                    ErrorCategory::DecodeFailed,
                    format!("items[{}] is empty", index),
                )
                .with_code("KCL-DOC-002")
                .with_context("item_index", index.to_string()));
            }
            let object = KubeObject::from_value(value)
                .map_err(|err| err.with_context("item_index", index.to_string()))?;
            items.push(object);
        }

        let function_config = raw
            .function_config
            .map(KubeObject::from_value)
            .transpose()
            .map_err(|err| err.with_context("field", "functionConfig"))?;

        Ok(Self {
            api_version: if raw.api_version.is_empty() {
                RESOURCE_LIST_API_VERSION.to_string()
            } else {
                raw.api_version
            },
            kind: raw.kind,
            items,
            function_config,
            results: raw.results,
        })
    }

    pub fn to_yaml_string(&self) -> Result<String, AppError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Record an error result, keeping whatever items were passed in untouched.
    pub fn push_error(&mut self, error: &AppError) {
        self.results.push(FunctionResult {
            message: error.to_string(),
            severity: ResultSeverity::Error,
            resource_ref: None,
            field: None,
        });
    }
}
