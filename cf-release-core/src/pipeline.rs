//! High-level pipeline: orchestrates fetch → download → manifest → publish
//! for one addon.
//!
//! This module provides the top-level orchestration for a single release
//! run. It implements a coordinated pipeline that:
//!   - Resolves version types and the latest stable artifact listing
//!   - Skips the run entirely when everything is already published
//!   - Downloads each artifact under its flavor-suffixed local name
//!   - Builds and writes the `release.json` manifest
//!   - Collects per-artifact changelogs into the release body
//!   - Creates (or reuses) the tagged release and uploads all assets
//!
//! # Major Types
//! - [`PipelineConfig`]: where artifacts and the manifest are written
//! - [`PipelineOutcome`]: published / up-to-date / dry-run result
//! - [`PipelineReport`]: what was downloaded and uploaded, for audit
//!
//! # Error Handling
//! Fail-fast: the first failing step aborts the run with a typed
//! [`PipelineError`]; callers log and surface it. Authentication, remote
//! API and transport failures stay distinguishable through the nested
//! fetch/publish errors.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info};

use crate::changelog;
use crate::contract::{
    DownloadedArtifact, FetchError, Fetcher, PublishError, Publisher, RemoteArtifact,
};
use crate::flavor;
use crate::manifest;

/// The top-level pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory artifacts and `release.json` are written to.
    pub out_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The remote listing carries no stable files at all.
    #[error("no stable files available for {mod_name}")]
    NoStableFiles { mod_name: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] manifest::WriteError),
}

/// Result of a pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A release was created (or reused) and all assets uploaded.
    Published { tag: String, report: PipelineReport },
    /// Every artifact the remote offers is already published; nothing done.
    UpToDate,
    /// No publisher given: artifacts and manifest were produced locally,
    /// publication skipped.
    DryRun { report: PipelineReport },
}

#[derive(Debug)]
pub struct PipelineReport {
    pub mod_name: String,
    pub artifacts: Vec<ArtifactReport>,
}

#[derive(Debug)]
pub struct ArtifactReport {
    pub file_id: i64,
    pub file_name: String,
    pub flavor: Option<&'static str>,
}

/// Release tag for a run started at `now`: `v` + UTC `%Y.%m.%d.%H.%M`.
pub fn release_tag(now: DateTime<Utc>) -> String {
    format!("v{}", now.format("%Y.%m.%d.%H.%M"))
}

/// Entrypoint: run the full release pipeline.
///
/// `publisher` is `None` for a dry run: everything up to and including the
/// manifest is produced locally and the publication steps are skipped.
pub async fn run<F, P>(
    config: &PipelineConfig,
    fetcher: &F,
    publisher: Option<&P>,
) -> Result<PipelineOutcome, PipelineError>
where
    F: Fetcher,
    P: Publisher,
{
    info!("[RELEASE] Starting release pipeline");

    let version_types = fetcher.version_types().await?;
    let listing = fetcher.latest_stable().await?;
    info!(
        mod_name = %listing.mod_name,
        files = listing.files.len(),
        "[RELEASE] Fetched artifact listing"
    );
    if listing.files.is_empty() {
        error!(mod_name = %listing.mod_name, "[RELEASE][ERROR] No stable files in listing");
        return Err(PipelineError::NoStableFiles {
            mod_name: listing.mod_name,
        });
    }

    // Plan local names up front: the idempotence check and the manifest both
    // need them before anything is downloaded.
    let planned: Vec<(RemoteArtifact, Option<&'static str>, String)> = listing
        .files
        .iter()
        .map(|file| {
            let slug = flavor::pick_slug(&file.game_versions);
            let name = flavor::suffixed_file_name(&file.file_name, slug);
            (file.clone(), slug, name)
        })
        .collect();

    if let Some(publisher) = publisher {
        if let Some(latest) = publisher.latest_release().await? {
            let all_published = planned
                .iter()
                .all(|(_, _, name)| latest.asset_names.iter().any(|asset| asset == name));
            if all_published {
                info!(
                    tag = %latest.tag,
                    "[RELEASE] Latest release already carries every artifact, nothing to publish"
                );
                return Ok(PipelineOutcome::UpToDate);
            }
        }
    }

    if !config.out_dir.exists() {
        std::fs::create_dir_all(&config.out_dir).map_err(|source| PipelineError::Io {
            path: config.out_dir.clone(),
            source,
        })?;
    }

    let mut downloads: Vec<DownloadedArtifact> = Vec::new();
    for (remote, slug, file_name) in &planned {
        let dest = config.out_dir.join(file_name);
        fetcher.download(remote, &dest).await?;
        downloads.push(DownloadedArtifact {
            file_name: file_name.clone(),
            local_path: dest,
            flavor: *slug,
            remote: remote.clone(),
        });
    }
    info!(count = downloads.len(), "[RELEASE] Downloaded all artifacts");

    let built = manifest::build(&listing.mod_name, &version_types, &downloads);
    let manifest_path = config.out_dir.join(manifest::MANIFEST_FILE_NAME);
    manifest::write(&built, &manifest_path)?;

    let report = PipelineReport {
        mod_name: listing.mod_name.clone(),
        artifacts: downloads
            .iter()
            .map(|d| ArtifactReport {
                file_id: d.remote.file_id,
                file_name: d.file_name.clone(),
                flavor: d.flavor,
            })
            .collect(),
    };

    let Some(publisher) = publisher else {
        info!("[RELEASE] Dry run, skipping publication");
        return Ok(PipelineOutcome::DryRun { report });
    };

    let mut changelogs = Vec::new();
    for download in &downloads {
        let html = fetcher.changelog(download.remote.file_id).await?;
        changelogs.push(changelog::html_to_markdown(&html));
    }
    let body = changelog::join_changelogs(&changelogs);

    let tag = release_tag(Utc::now());
    info!(tag = %tag, "[RELEASE] Creating release");
    let release = publisher.get_or_create_release(&tag, &body).await?;

    for download in &downloads {
        let content =
            std::fs::read(&download.local_path).map_err(|source| PipelineError::Io {
                path: download.local_path.clone(),
                source,
            })?;
        info!(asset = %download.file_name, "[RELEASE] Uploading asset");
        publisher
            .upload_asset(
                &release.upload_url,
                &download.file_name,
                "application/zip",
                content,
            )
            .await?;
    }

    let manifest_bytes =
        std::fs::read(&manifest_path).map_err(|source| PipelineError::Io {
            path: manifest_path.clone(),
            source,
        })?;
    publisher
        .upload_asset(
            &release.upload_url,
            manifest::MANIFEST_FILE_NAME,
            "application/json",
            manifest_bytes,
        )
        .await?;

    info!(tag = %release.tag, "[RELEASE] Release complete");
    Ok(PipelineOutcome::Published {
        tag: release.tag,
        report,
    })
}
