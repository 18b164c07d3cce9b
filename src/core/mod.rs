pub mod config;
pub mod engine;
pub mod error;
pub mod kube;
pub mod matcher;
pub mod orchestrator;
pub mod package;
pub mod source;
pub mod types;
pub mod yaml;

pub use config::{ConfigLoader, ConfigSpec, RunConfig};
pub use engine::{Engine, ExecutionRequest};
pub use error::AppError;
pub use kube::{KubeObject, ResourceList};
pub use matcher::MatchConstraintsSpec;
pub use orchestrator::Orchestrator;
pub use package::{DependencyManifest, PackageClient};
pub use types::*;
