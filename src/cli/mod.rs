pub mod args;
pub mod commands;

pub use args::{ExecArgs, RunArgs, SplitArgs, ValidateArgs};
use crate::core::config::ConfigLoader;
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n{after-help}";

#[derive(Parser)]
#[command(name = "krm-kcl")]
#[command(version = crate::VERSION)]
#[command(about = "KRM function that runs KCL programs against a resource list")]
#[command(help_template = HELP_TEMPLATE)]
#[command(after_long_help = environment_help())]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Run as a KRM function",
        long_about = "Run reads a ResourceList, applies the KCLRun in functionConfig to the matching items and writes the resulting ResourceList.",
        after_help = "Example:\n    kpt fn source ./manifests | krm-kcl run"
    )]
    Run(RunArgs),
    #[command(
        about = "Execute a KCLRun without input resources",
        long_about = "Exec loads a KCLRun file, runs its program with an empty item list and prints the emitted documents.",
        after_help = "Example:\n    krm-kcl exec ./kcl-run.yaml"
    )]
    Exec(ExecArgs),
    #[command(
        about = "Check a KCLRun file",
        long_about = "Validate decodes a KCLRun file, applies defaults and checks its source locator and dependencies without running anything.",
        after_help = "Example:\n    krm-kcl validate ./kcl-run.yaml"
    )]
    Validate(ValidateArgs),
    #[command(
        about = "Split a multi-document YAML stream",
        long_about = "Split breaks a YAML stream on document separators and prints the identity of each document.",
        after_help = "Example:\n    krm-kcl split ./all.yaml"
    )]
    Split(SplitArgs),
}

fn environment_help() -> String {
    let mut help = String::from("ENVIRONMENT:\n");
    for line in ConfigLoader::env_var_documentation() {
        help.push_str("    ");
        help.push_str(line);
        help.push('\n');
    }
    help
}

pub async fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Run(run_args) => commands::run(run_args).await,
        Command::Exec(exec_args) => commands::exec(exec_args).await,
        Command::Validate(validate_args) => commands::validate(validate_args).await,
        Command::Split(split_args) => commands::split(split_args).await,
    }
}
