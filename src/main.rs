use clap::Parser;
use krm_kcl::{cli, logging};

#[tokio::main]
async fn main() -> krm_kcl::Result<()> {
    let args = cli::Args::parse();
    let guard = logging::init(&args.command)?;
    tracing::debug!(
        console = %guard.console_output(),
        log_dir = ?guard.log_dir(),
        "logging initialized"
    );
    cli::run(args).await
}
