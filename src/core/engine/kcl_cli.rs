#![allow(clippy::result_large_err)]

use super::{Engine, ExecutionRequest};
use crate::core::error::AppError;
use crate::core::kube::KubeObject;
use crate::core::source::{classify, local_program, LocalProgram, SourceKind};
use crate::core::types::ErrorCategory;
use crate::core::yaml::split_documents;
use crate::tools::{CommandExecutionRequest, CommandRunner, TokioCommandRunner};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const INLINE_PROGRAM_FILE: &str = "main.k";
const OPTIONS_SETTINGS_FILE: &str = "krm_kcl_options.yaml";

/// [`Engine`] that shells out to `kcl run`.
pub struct KclCliEngine {
    kcl_bin: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

/// `kcl` settings file carrying the top-level options.
#[derive(Serialize)]
struct OptionSettings<'a> {
    kcl_options: (
        KclOption<'a, Vec<serde_json::Value>>,
        KclOption<'a, IndexMap<String, serde_json::Value>>,
        KclOption<'a, serde_json::Value>,
    ),
}

#[derive(Serialize)]
struct KclOption<'a, T> {
    key: &'static str,
    value: &'a T,
}

impl KclCliEngine {
    pub fn new(kcl_bin: PathBuf) -> Self {
        Self::with_runner(kcl_bin, Arc::new(TokioCommandRunner))
    }

    pub fn with_runner(kcl_bin: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self { kcl_bin, runner }
    }

    /// Render `items`, `params` and `resource_list` as a settings file. Kept out of argv,
    /// where a single argument is capped at 128 KiB on Linux.
    fn option_settings(
        &self,
        request: &ExecutionRequest,
        items: &[KubeObject],
    ) -> Result<String, AppError> {
        let items_json = items
            .iter()
            .map(KubeObject::to_json_value)
            .collect::<Result<Vec<_>, _>>()?;
        let resource_list = json!({
            "items": items_json,
            "functionConfig": request.function_config.to_json_value()?,
        });
        let settings = OptionSettings {
            kcl_options: (
                KclOption {
                    key: "items",
                    value: &items_json,
                },
                KclOption {
                    key: "params",
                    value: &request.params,
                },
                KclOption {
                    key: "resource_list",
                    value: &resource_list,
                },
            ),
        };
        serde_yaml::to_string(&settings).map_err(|err| {
            AppError::new(
                ErrorCategory::SerializationError,
                format!("failed to encode engine options: {}", err),
            )
        })
    }

    fn build_args(&self, request: &ExecutionRequest, program: &str, settings: &Path) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            program.to_string(),
            "-Y".to_string(),
            settings.display().to_string(),
        ];

        let config = &request.config;
        for (flag, values) in [
            ("-D", &config.arguments),
            ("-Y", &config.settings),
            ("-O", &config.overrides),
            ("-S", &config.path_selectors),
        ] {
            for value in values {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        for (flag, enabled) in [
            ("--vendor", config.vendor),
            ("--sort_keys", config.sort_keys),
            ("--show_hidden", config.show_hidden),
            ("--disable_none", config.disable_none),
            ("--debug", config.debug),
            ("--strict_range_check", config.strict_range_check),
        ] {
            if enabled {
                args.push(flag.to_string());
            }
        }
        for dependency in &request.dependencies {
            args.push("-E".to_string());
            args.push(dependency.clone());
        }
        args
    }
}

#[async_trait]
impl Engine for KclCliEngine {
    async fn execute(
        &self,
        request: &ExecutionRequest,
        items: &[KubeObject],
    ) -> Result<Vec<KubeObject>, AppError> {
        // Holds the inline program and the options file until the process exits.
        let scratch = tempfile::tempdir()?;
        let work_dir = match request.config.work_dir.as_str() {
            "" => None,
            dir => Some(PathBuf::from(dir)),
        };

        let program = match classify(request.source.base()) {
            SourceKind::Local => match local_program(request.source.base()) {
                LocalProgram::Path(path) => program_path(&path, work_dir.as_deref()).await?,
                LocalProgram::Inline(text) => {
                    let path = scratch.path().join(INLINE_PROGRAM_FILE);
                    tokio::fs::write(&path, text).await?;
                    path.display().to_string()
                }
            },
            _ => request.source.fetch_target(),
        };

        let settings = scratch.path().join(OPTIONS_SETTINGS_FILE);
        tokio::fs::write(&settings, self.option_settings(request, items)?).await?;

        tracing::info!(
            name = %request.name,
            source = %request.source,
            items = items.len(),
            dependencies = request.dependencies.len(),
            "running KCL program"
        );

        let mut env = request.transport.child_env();
        env.extend(request.source.credential_env());
        let command = CommandExecutionRequest {
            program: self.kcl_bin.clone(),
            args: self.build_args(request, &program, &settings),
            cwd: work_dir,
            env,
            stdin: None,
        };
        let output = self.runner.run(&command).await?;
        drop(scratch);

        if !output.success() {
            return Err(AppError::new(
                ErrorCategory::ExecutionFailed,
                format!(
                    "KCL program {} failed with exit code {}",
                    request.name, output.exit_code
                ),
            )
            .with_code("KCL-ENG-001")
            .with_context("name", request.name.as_str())
            .with_context("stderr", output.stderr_lossy().trim()));
        }

        let documents = parse_output(&output.stdout_lossy())
            .map_err(|err| err.with_context("name", request.name.as_str()))?;
        tracing::debug!(name = %request.name, documents = documents.len(), "KCL program finished");
        Ok(documents)
    }
}

/// Absolute path of a local program, resolved against `work_dir` when relative.
async fn program_path(path: &Path, work_dir: Option<&Path>) -> Result<String, AppError> {
    let joined = match work_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    };
    let absolute = tokio::fs::canonicalize(&joined).await.map_err(|err| {
        AppError::new(
            ErrorCategory::InvalidSource,
            format!("program path {} is not readable: {}", joined.display(), err),
        )
        .with_code("KCL-SRC-001")
        .with_context("locator", path.display().to_string())
    })?;
    Ok(absolute.display().to_string())
}

/// Decode engine stdout.
///
/// A mapping with an `items` list yields those items, a top-level sequence yields its
/// elements, and any other stream yields each non-empty mapping document.
pub fn parse_output(stdout: &str) -> Result<Vec<KubeObject>, AppError> {
    let documents = split_documents(stdout).map_err(output_error)?;
    let mut values = Vec::with_capacity(documents.len());
    for doc in documents.iter().filter(|doc| !doc.trim().is_empty()) {
        let value: Value = serde_yaml::from_str(doc).map_err(|err| output_error(err.into()))?;
        if !value.is_null() {
            values.push(value);
        }
    }

    if let [single] = values.as_slice() {
        match single {
            Value::Mapping(fields) => {
                if let Some(Value::Sequence(items)) = fields.get("items") {
                    return to_objects(items.clone());
                }
            }
            Value::Sequence(items) => return to_objects(items.clone()),
            _ => {}
        }
    }
    to_objects(values)
}

fn to_objects(values: Vec<Value>) -> Result<Vec<KubeObject>, AppError> {
    values
        .into_iter()
        .filter(|value| !value.is_null())
        .enumerate()
        .map(|(index, value)| {
            KubeObject::from_value(value)
                .map_err(|err| output_error(err).with_context("document_index", index.to_string()))
        })
        .filter(|result| !matches!(result, Ok(object) if object.is_nil_or_empty()))
        .collect()
}

fn output_error(err: AppError) -> AppError {
    let mut wrapped = AppError::new(
        ErrorCategory::DecodeFailed,
        format!("failed to decode KCL output: {}", err.message),
    )
    .with_code("KCL-ENG-003");
    wrapped.context.extend(err.context);
    wrapped
}
