//! The transformation engine that executes a KCL program against a batch of documents.

pub mod kcl_cli;

pub use kcl_cli::KclCliEngine;

use crate::core::config::ConfigSpec;
use crate::core::error::AppError;
use crate::core::kube::KubeObject;
use crate::core::source::{AuthenticatedLocator, TransportOptions};
use async_trait::async_trait;
use indexmap::IndexMap;

/// Everything the engine needs for one execution.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Program name handed to the engine. Always `kcl-function-run`, whatever the KCLRun's
    /// `metadata.name` says.
    pub name: String,
    pub source: AuthenticatedLocator,
    /// External packages as `name=path` entries.
    pub dependencies: Vec<String>,
    pub function_config: KubeObject,
    pub config: ConfigSpec,
    pub params: IndexMap<String, serde_json::Value>,
    pub transport: TransportOptions,
}

#[async_trait]
pub trait Engine: Send + Sync {
    /// Run the program over `items` and return the documents it emits, in emitted order.
    async fn execute(
        &self,
        request: &ExecutionRequest,
        items: &[KubeObject],
    ) -> Result<Vec<KubeObject>, AppError>;
}
