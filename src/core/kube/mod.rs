#![allow(clippy::result_large_err)]

//! Structured configuration documents and the KRM `ResourceList` envelope.

mod resource_list;

pub use resource_list::{FunctionResult, ResourceList, ResourceRef, ResultField, ResultSeverity};

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// A single Kubernetes-style document with typed accessors over an untyped YAML mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct KubeObject {
    fields: Mapping,
}

impl KubeObject {
    /// Parse one YAML document. Blank input yields an empty object.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(text).map_err(|err| {
            AppError::new(
                ErrorCategory::DecodeFailed,
                format!("failed to parse document: {}", err),
            )
            .with_code("KCL-DOC-001")
        })?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Mapping(fields) => Ok(Self { fields }),
            Value::Null => Ok(Self::default()),
            Value::Tagged(tagged) => Self::from_value(tagged.value),
            other => Err(AppError::new(
                ErrorCategory::DecodeFailed,
                format!(
                    "document must be a mapping, got {}",
                    describe_value(&other)
                ),
            )
            .with_code("KCL-DOC-002")),
        }
    }

    /// Convert any serializable value (typically a typed resource) into a document.
    pub fn from_serializable<T: Serialize>(resource: &T) -> Result<Self, AppError> {
        let value = serde_yaml::to_value(resource)?;
        Self::from_value(value)
    }

    pub fn is_nil_or_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Mapping {
        &self.fields
    }

    pub fn api_version(&self) -> &str {
        self.str_field(&["apiVersion"]).unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.str_field(&["kind"]).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.str_field(&["metadata", "name"]).unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.str_field(&["metadata", "namespace"])
            .unwrap_or_default()
    }

    /// Split `apiVersion` into `(group, version)`; the core group is `""`.
    pub fn group_version(&self) -> (&str, &str) {
        let api_version = self.api_version();
        match api_version.rsplit_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        }
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.string_map(&["metadata", "labels"])
    }

    pub fn annotations(&self) -> BTreeMap<String, String> {
        self.string_map(&["metadata", "annotations"])
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.str_field(&["metadata", "labels", key])
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.str_field(&["metadata", "annotations", key])
    }

    pub fn set_name(&mut self, name: &str) {
        if let Some(metadata) = child_mapping(&mut self.fields, "metadata") {
            metadata.insert(Value::from("name"), Value::from(name));
        }
    }

    pub fn set_annotation(&mut self, key: &str, value: &str) {
        if let Some(metadata) = child_mapping(&mut self.fields, "metadata") {
            if let Some(annotations) = child_mapping(metadata, "annotations") {
                annotations.insert(Value::from(key), Value::from(value));
            }
        }
    }

    /// Short `Kind/namespace/name` form for logs and error context.
    pub fn identity(&self) -> String {
        if self.namespace().is_empty() {
            format!("{}/{}", self.kind(), self.name())
        } else {
            format!("{}/{}/{}", self.kind(), self.namespace(), self.name())
        }
    }

    pub fn to_yaml_string(&self) -> Result<String, AppError> {
        Ok(serde_yaml::to_string(&self.fields)?)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, AppError> {
        serde_json::to_value(&self.fields).map_err(|err| {
            AppError::new(
                ErrorCategory::SerializationError,
                format!("failed to convert {} to JSON: {}", self.identity(), err),
            )
        })
    }

    fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get(*first)?;
        for key in rest {
            current = current.as_mapping()?.get(*key)?;
        }
        Some(current)
    }

    fn str_field(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    fn string_map(&self, path: &[&str]) -> BTreeMap<String, String> {
        self.lookup(path)
            .and_then(Value::as_mapping)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), scalar_string(v)?)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TryFrom<Value> for KubeObject {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<KubeObject> for Value {
    fn from(object: KubeObject) -> Self {
        Value::Mapping(object.fields)
    }
}

/// Parse a multi-document YAML stream into documents, skipping empty documents.
///
/// Fails on the first document that is not a mapping; the error names its index.
pub fn parse_documents(text: &str) -> Result<Vec<KubeObject>, AppError> {
    let mut objects = Vec::new();
    for (index, doc) in crate::core::yaml::split_documents(text)?
        .into_iter()
        .enumerate()
    {
        let object = KubeObject::parse(&doc).map_err(|err| {
            err.with_context("document_index", index.to_string())
        })?;
        if !object.is_nil_or_empty() {
            objects.push(object);
        }
    }
    Ok(objects)
}

/// Render documents as a `---` separated YAML stream.
pub fn to_yaml_stream(objects: &[KubeObject]) -> Result<String, AppError> {
    let mut out = String::new();
    for (index, object) in objects.iter().enumerate() {
        if index > 0 {
            out.push_str("---\n");
        }
        out.push_str(&object.to_yaml_string()?);
    }
    Ok(out)
}

fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> Option<&'a mut Mapping> {
    let child = parent
        .entry(Value::from(key))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !child.is_mapping() {
        *child = Value::Mapping(Mapping::new());
    }
    child.as_mapping_mut()
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
