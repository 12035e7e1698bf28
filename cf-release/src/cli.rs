///
/// This module implements the full CLI interface for cf-release—handling
/// command parsing, argument validation, main entrypoints, and user-visible
/// invocations.
///
/// All core business logic (API models, flavor mapping, the pipeline) lives
/// in the [`cf-release-core`] crate. This module is strictly for CLI glue,
/// ergonomic argument exposure, and orchestration.
///
/// ## Features
/// - Entry struct [`Cli`] defines all user-facing options and subcommands.
/// - Subcommand routing (`release`) and argument validation.
/// - Async entrypoint (`run`) for programmatic invocation and integration
///   testing.
///
/// ## How To Use
/// - For command-line users: use the installed `cf-release` binary with
///   `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed
///   [`Cli`].
///
/// Credentials come from the environment (see `load_config`): `ADDON_ID`,
/// `CF_API_TOKEN`, and for publication `GH_TOKEN` plus
/// `GITHUB_REPOSITORY`.
///
/// [`cf-release-core`]: ../../cf-release-core/
/// [`Cli`]: struct.Cli.html
/// [`run`]: fn.run.html
use crate::github::GithubClient;
use crate::load_config::load_config;
use anyhow::{bail, Result};
use cf_release_core::pipeline::{self, PipelineConfig, PipelineOutcome};
use cf_release_core::curseforge::CurseforgeClient;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for cf-release: fetch the latest CurseForge addon files and publish
/// them as a GitHub release.
#[derive(Parser)]
#[clap(
    name = "cf-release",
    version,
    about = "Fetch the latest CurseForge addon files and republish them as a GitHub release"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the release pipeline for the addon configured in the environment
    Release {
        /// Directory artifacts and release.json are written to
        #[clap(long, default_value = ".")]
        out_dir: PathBuf,

        /// Download artifacts and build the manifest, but skip GitHub publication
        #[clap(long)]
        dry_run: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Release { out_dir, dry_run } => {
            let config = load_config(!dry_run)?;
            tracing::info!(command = "release", dry_run, "Starting release pipeline");

            let fetcher = CurseforgeClient::new(config.addon_id, &config.cf_api_token);
            let pipeline_config = PipelineConfig { out_dir };

            let outcome = if dry_run {
                pipeline::run(&pipeline_config, &fetcher, None::<&GithubClient>).await?
            } else {
                let (Some(token), Some(repo)) = (&config.gh_token, &config.repository) else {
                    // load_config enforces this for publishing runs
                    bail!("GH_TOKEN and GITHUB_REPOSITORY are required to publish");
                };
                let publisher = GithubClient::new(token.clone(), repo.clone());
                pipeline::run(&pipeline_config, &fetcher, Some(&publisher)).await?
            };

            match outcome {
                PipelineOutcome::Published { tag, report } => {
                    tracing::info!(
                        command = "release",
                        tag = %tag,
                        artifacts = report.artifacts.len(),
                        "Release published"
                    );
                }
                PipelineOutcome::UpToDate => {
                    tracing::info!(
                        command = "release",
                        "All artifacts already published, nothing to do"
                    );
                }
                PipelineOutcome::DryRun { report } => {
                    tracing::info!(
                        command = "release",
                        artifacts = report.artifacts.len(),
                        "Dry run complete, publication skipped"
                    );
                }
            }
            Ok(())
        }
    }
}
