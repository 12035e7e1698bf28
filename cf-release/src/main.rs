use anyhow::Result;
use cf_release::cli::{run, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing for the CLI.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let Commands::Release { out_dir, dry_run } = &cli.command;
    tracing::info!(
        out_dir = %out_dir.display(),
        dry_run = *dry_run,
        "cf-release starting"
    );

    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("Release run completed"),
        Err(e) => tracing::error!(error = %e, "Release run failed"),
    }
    result
}
