#![allow(clippy::result_large_err)]

//! Ties configuration, matching, source resolution and the engine together.

use crate::core::config::{RunConfig, DEFAULT_PROGRAM_NAME};
use crate::core::engine::{Engine, ExecutionRequest};
use crate::core::error::AppError;
use crate::core::kube::{KubeObject, ResourceList};
use crate::core::matcher;
use crate::core::package::{DependencyManifest, PackageClient};
use crate::core::source::{self, transport};
use std::sync::Arc;

/// Runs one KCLRun over a batch of documents. Holds no state between invocations.
pub struct Orchestrator {
    engine: Arc<dyn Engine>,
    packages: Arc<dyn PackageClient>,
}

/// Engine output plus the input positions it replaces.
struct Execution {
    matched_slots: Vec<usize>,
    output: Vec<KubeObject>,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn Engine>, packages: Arc<dyn PackageClient>) -> Self {
        Self { engine, packages }
    }

    /// Transform `items` with the KCLRun in `function_config` and return the engine output.
    ///
    /// Only documents selected by the match constraints reach the engine, in input order.
    pub async fn transform(
        &self,
        items: &[KubeObject],
        function_config: &KubeObject,
    ) -> Result<Vec<KubeObject>, AppError> {
        let config = RunConfig::configure(function_config).map_err(at_step("configure"))?;
        let execution = self.execute(config, items, function_config).await?;
        Ok(execution.output)
    }

    /// Transform a ResourceList in place.
    ///
    /// The i-th output document takes the position of the i-th matched input. Extra outputs
    /// follow the last matched position (or are appended when nothing matched), matched
    /// positions without an output are dropped, and unmatched documents are left untouched.
    pub async fn transform_resource_list(&self, list: &mut ResourceList) -> Result<(), AppError> {
        let function_config = list.function_config.clone().unwrap_or_default();
        let config = RunConfig::configure(&function_config).map_err(at_step("configure"))?;
        let execution = self.execute(config, &list.items, &function_config).await?;

        let items = std::mem::take(&mut list.items);
        list.items = merge_by_position(items, &execution.matched_slots, execution.output);
        Ok(())
    }

    /// Run a KCLRun without input documents.
    pub async fn run_standalone(&self, config: &RunConfig) -> Result<Vec<KubeObject>, AppError> {
        let function_config = config.to_object().map_err(at_step("configure"))?;
        let execution = self.execute(config.clone(), &[], &function_config).await?;
        Ok(execution.output)
    }

    async fn execute(
        &self,
        mut config: RunConfig,
        items: &[KubeObject],
        function_config: &KubeObject,
    ) -> Result<Execution, AppError> {
        let matched_slots: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| matcher::matches(item, &config.spec.match_constraints))
            .map(|(index, _)| index)
            .collect();
        let matched: Vec<KubeObject> = matched_slots.iter().map(|&i| items[i].clone()).collect();
        tracing::info!(
            name = %config.name,
            items = items.len(),
            matched = matched.len(),
            "transforming resources"
        );

        let transport_options = config.transport_options();
        transport::apply_process_toggle(&transport_options);

        config.apply_env_overrides();

        let resolved = source::resolve(
            &config.spec.source,
            &config.spec.credentials,
            transport_options,
        )
        .map_err(at_step("resolve_source"))?;
        tracing::debug!(kind = %resolved.kind, source = %resolved.locator, "resolved program source");

        if let Some(login) = &resolved.registry_login {
            self.packages
                .login(login, &transport_options)
                .await
                .map_err(at_step("registry_login"))?;
        }

        let dependencies = if config.spec.dependencies.trim().is_empty() {
            Vec::new()
        } else {
            let manifest = DependencyManifest::parse(&config.spec.dependencies)
                .map_err(at_step("resolve_dependencies"))?;
            self.packages
                .resolve_dependencies(&manifest, &transport_options)
                .await
                .map_err(at_step("resolve_dependencies"))?
        };

        let request = ExecutionRequest {
            name: DEFAULT_PROGRAM_NAME.to_string(),
            source: resolved.locator,
            dependencies,
            function_config: function_config.clone(),
            config: config.spec.config,
            params: config.spec.params,
            transport: transport_options,
        };
        let output = self
            .engine
            .execute(&request, &matched)
            .await
            .map_err(at_step("execute"))?;
        tracing::info!(name = %config.name, output = output.len(), "transformation finished");

        Ok(Execution {
            matched_slots,
            output,
        })
    }
}

/// Put `output` back into `items` at the matched positions. `matched_slots` is ascending.
pub fn merge_by_position(
    items: Vec<KubeObject>,
    matched_slots: &[usize],
    output: Vec<KubeObject>,
) -> Vec<KubeObject> {
    let mut outputs = output.into_iter();
    let mut merged = Vec::with_capacity(items.len());
    let last_slot = matched_slots.last().copied();

    for (index, item) in items.into_iter().enumerate() {
        if matched_slots.binary_search(&index).is_err() {
            merged.push(item);
            continue;
        }
        if let Some(replacement) = outputs.next() {
            merged.push(replacement);
        }
        if Some(index) == last_slot {
            merged.extend(outputs.by_ref());
        }
    }
    merged.extend(outputs);
    merged
}

fn at_step(step: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| err.with_context("step", step)
}
