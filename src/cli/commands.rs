use crate::cli::args::{ExecArgs, RunArgs, SplitArgs, ValidateArgs};
use crate::core::config::{ConfigLoader, RunConfig};
use crate::core::engine::KclCliEngine;
use crate::core::error::AppError;
use crate::core::kube::{to_yaml_stream, KubeObject, ResourceList};
use crate::core::orchestrator::Orchestrator;
use crate::core::package::{DependencyManifest, KclCliPackageClient};
use crate::core::source;
use crate::core::yaml::split_documents;
use crate::Result;
use anyhow::Context;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub async fn run(args: RunArgs) -> Result<()> {
    let input = read_input(args.input.as_deref())?;
    let orchestrator = build_orchestrator(args.kcl_bin, None);

    let (list, failure) = transform_input(&orchestrator, &input).await;
    let rendered = list.to_yaml_string()?;
    write_output(args.output.as_deref(), &rendered)?;

    if let Some(err) = failure {
        tracing::error!(code = %err.code, category = %err.category, "transformation failed");
        return Err(err.into());
    }
    Ok(())
}

/// Parse and transform a ResourceList. On failure the returned list carries an error result.
pub async fn transform_input(
    orchestrator: &Orchestrator,
    input: &str,
) -> (ResourceList, Option<AppError>) {
    let mut list = match ResourceList::parse(input) {
        Ok(list) => list,
        Err(err) => {
            let mut list = ResourceList::new(Vec::new(), None);
            list.push_error(&err);
            return (list, Some(err));
        }
    };
    match orchestrator.transform_resource_list(&mut list).await {
        Ok(()) => (list, None),
        Err(err) => {
            list.push_error(&err);
            (list, Some(err))
        }
    }
}

pub async fn exec(args: ExecArgs) -> Result<()> {
    let mut config = ConfigLoader::load_from_file(&args.file)?;
    let base_dir = args.file.parent().map(Path::to_path_buf);
    let orchestrator = build_orchestrator(args.kcl_bin, base_dir);

    if config.spec.config.work_dir.is_empty() {
        if let Some(parent) = args.file.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.spec.config.work_dir = parent.display().to_string();
        }
    }

    tracing::info!(name = %config.name, "executing KCLRun");
    let output = orchestrator.run_standalone(&config).await?;
    print!("{}", to_yaml_stream(&output)?);
    Ok(())
}

pub async fn validate(args: ValidateArgs) -> Result<()> {
    let config = ConfigLoader::load_from_file(&args.file)?;
    let resolved = source::resolve(
        &config.spec.source,
        &config.spec.credentials,
        config.transport_options(),
    )?;
    let dependencies = if config.spec.dependencies.trim().is_empty() {
        0
    } else {
        DependencyManifest::parse(&config.spec.dependencies)?
            .dependencies
            .len()
    };

    println!("{} is valid", args.file.display());
    print_summary(&config, &resolved.kind.to_string(), dependencies);
    Ok(())
}

pub async fn split(args: SplitArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    for (index, document) in split_documents(&content)?.iter().enumerate() {
        let object = KubeObject::parse(document).map_err(|err| {
            err.with_context("document_index", index.to_string())
        })?;
        if object.is_nil_or_empty() {
            println!("{}: <empty>", index);
        } else {
            println!("{}: {} {}", index, object.api_version(), object.identity());
        }
    }
    Ok(())
}

fn print_summary(config: &RunConfig, source_kind: &str, dependencies: usize) {
    println!("  name: {}", config.name);
    println!("  source: {}", source_kind);
    println!("  params: {}", config.spec.params.len());
    println!("  dependencies: {}", dependencies);
    println!("  insecure: {}", config.allow_insecure_source());
}

fn build_orchestrator(kcl_bin: Option<PathBuf>, base_dir: Option<PathBuf>) -> Orchestrator {
    let kcl_bin = kcl_bin.unwrap_or_else(ConfigLoader::kcl_binary);
    let mut packages = KclCliPackageClient::new(kcl_bin.clone());
    if let Some(dir) = base_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        packages = packages.with_base_dir(dir);
    }
    Orchestrator::new(Arc::new(KclCliEngine::new(kcl_bin)), Arc::new(packages))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read ResourceList from stdin")?;
            Ok(input)
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
