//! # contract: trait seams between the pipeline and its remote collaborators
//!
//! This module defines the two traits the release pipeline is written
//! against, plus the plain data types flowing across them:
//!
//! - [`Fetcher`]: read side. Lists and downloads release artifacts from the
//!   mod-hosting API (CurseForge in production).
//! - [`Publisher`]: write side. Creates releases and uploads assets to the
//!   hosting repository (GitHub in production; the concrete client lives in
//!   the CLI crate).
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall` so consumers can generate
//! deterministic mocks for unit/integration tests.
//!
//! ## Error Handling
//! Errors are typed so callers can tell authentication failures, remote API
//! errors and plain transport problems apart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use thiserror::Error;

/// Error from the read side (artifact listing, changelog, download).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Credential rejected by the remote API (401/403).
    #[error("remote API rejected credentials ({status})")]
    Auth { status: reqwest::StatusCode },

    /// Any other non-success response from the remote API.
    #[error("remote API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Transport-level failure (DNS, TLS, connect, body decode).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Response arrived but did not carry what we need.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Error from the write side (release creation, asset upload).
#[derive(Debug, Error)]
pub enum PublishError {
    /// Credential rejected by the repository host (401/403).
    #[error("repository host rejected credentials ({status})")]
    Auth { status: reqwest::StatusCode },

    #[error("repository host returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One supported game version of a remote artifact, as reported by the API.
#[derive(Debug, Clone)]
pub struct GameVersionRef {
    /// Dotted version name, e.g. `"1.15.6"` or `"11.0.2"`.
    pub name: String,
    /// Remote version-type id, resolved to a flavor slug via
    /// [`Fetcher::version_types`].
    pub version_type_id: i64,
}

/// A release artifact as listed by the mod-hosting API.
#[derive(Debug, Clone)]
pub struct RemoteArtifact {
    pub file_id: i64,
    /// Remote filename, e.g. `"MyAddon-1.2.3.zip"`.
    pub file_name: String,
    pub download_url: Option<String>,
    pub game_versions: Vec<GameVersionRef>,
}

/// Listing of the latest stable artifacts for one addon.
#[derive(Debug, Clone)]
pub struct ArtifactListing {
    /// Human-readable addon name as known to the remote API.
    pub mod_name: String,
    /// Latest stable files, one per game flavor, in remote index order.
    pub files: Vec<RemoteArtifact>,
}

/// Describes an artifact that was downloaded into the working tree.
#[derive(Debug, Clone)]
pub struct DownloadedArtifact {
    /// Local filename, flavor suffix applied (e.g. `"MyAddon-1.2.3-classic.zip"`).
    pub file_name: String,
    /// Filesystem path the artifact was written to.
    pub local_path: PathBuf,
    /// Flavor slug baked into the name; `None` for retail/mainline builds.
    pub flavor: Option<&'static str>,
    /// The remote listing entry this download came from.
    pub remote: RemoteArtifact,
}

/// Trait for reading release artifacts from the mod-hosting API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Map remote version-type ids to their flavor slugs.
    async fn version_types(&self) -> Result<HashMap<i64, String>, FetchError>;

    /// List the latest stable artifact per game flavor for the configured addon.
    async fn latest_stable(&self) -> Result<ArtifactListing, FetchError>;

    /// Fetch the changelog for one artifact, as HTML.
    async fn changelog(&self, file_id: i64) -> Result<String, FetchError>;

    /// Download one artifact to `dest`.
    async fn download(&self, artifact: &RemoteArtifact, dest: &Path) -> Result<(), FetchError>;
}

/// An already-published release on the repository host.
#[derive(Debug, Clone)]
pub struct PublishedRelease {
    pub tag: String,
    pub asset_names: Vec<String>,
}

/// Handle to a release that assets can be uploaded to.
#[derive(Debug, Clone)]
pub struct ReleaseHandle {
    pub tag: String,
    /// Upload endpoint with URI-template suffix already stripped.
    pub upload_url: String,
}

/// Trait for publishing releases and assets to the hosting repository.
///
/// The implementor is responsible for authentication and transport; the
/// pipeline only sees tags, upload URLs and asset names.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The most recently published release, if any. Used for the
    /// nothing-new-to-publish check before a run mutates anything.
    async fn latest_release(&self) -> Result<Option<PublishedRelease>, PublishError>;

    /// Look up the release tagged `tag`, creating it with `body` as release
    /// notes when it does not exist yet.
    async fn get_or_create_release(
        &self,
        tag: &str,
        body: &str,
    ) -> Result<ReleaseHandle, PublishError>;

    /// Upload one asset to a release obtained from
    /// [`Publisher::get_or_create_release`].
    async fn upload_asset(
        &self,
        upload_url: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<(), PublishError>;
}
