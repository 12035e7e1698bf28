//! CurseForge API client: the production [`Fetcher`] implementation.
//!
//! Covers the four endpoints the pipeline needs:
//! - `GET /games/{game}/version-types` — version-type id → flavor slug
//! - `GET /mods/{id}` — addon name plus latest files and their index order
//! - `GET /mods/{id}/files/{fileId}/changelog` — HTML changelog
//! - the per-file `downloadUrl` — raw artifact bytes
//!
//! Authentication is a per-request `x-api-key` header. 401/403 map to
//! [`FetchError::Auth`], other non-success statuses to [`FetchError::Api`]
//! with the response body preserved for diagnostics.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::contract::{ArtifactListing, FetchError, Fetcher, GameVersionRef, RemoteArtifact};

pub const CF_API: &str = "https://api.curseforge.com/v1";

/// CurseForge game id for World of Warcraft.
pub const GAME_ID: u32 = 1;

/// Stable release type in the CurseForge file model (2 = beta, 3 = alpha).
pub const RELEASE_TYPE_STABLE: i32 = 1;

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModData {
    pub name: String,
    #[serde(default)]
    pub latest_files: Vec<ModFile>,
    #[serde(default)]
    pub latest_files_indexes: Vec<FileIndex>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModFile {
    pub id: i64,
    pub file_name: String,
    pub release_type: i32,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub sortable_game_versions: Vec<SortableGameVersion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortableGameVersion {
    pub game_version_name: String,
    #[serde(default)]
    pub game_version_type_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIndex {
    pub file_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct VersionType {
    pub id: i64,
    pub slug: String,
}

/// Client bound to one addon id and one API token.
pub struct CurseforgeClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    mod_id: i64,
}

impl CurseforgeClient {
    pub fn new(mod_id: i64, api_token: impl Into<String>) -> Self {
        Self::with_base_url(mod_id, api_token, CF_API)
    }

    /// Same client against a different endpoint; used by tests.
    pub fn with_base_url(
        mod_id: i64,
        api_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_token: api_token.into(),
            mod_id,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url = %url, "Fetching CurseForge API");
        let response = self
            .http
            .get(url)
            .header("x-api-key", &self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth { status });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            return Err(FetchError::Api { status, body });
        }
        Ok(response.json::<T>().await?)
    }

    async fn mod_data(&self) -> Result<ModData, FetchError> {
        let url = format!("{}/mods/{}", self.base_url, self.mod_id);
        let envelope: DataEnvelope<ModData> = self.get_json(&url).await?;
        Ok(envelope.data)
    }
}

impl From<&ModFile> for RemoteArtifact {
    fn from(file: &ModFile) -> Self {
        RemoteArtifact {
            file_id: file.id,
            file_name: file.file_name.clone(),
            download_url: file.download_url.clone(),
            game_versions: file
                .sortable_game_versions
                .iter()
                .map(|gv| GameVersionRef {
                    name: gv.game_version_name.clone(),
                    version_type_id: gv.game_version_type_id,
                })
                .collect(),
        }
    }
}

/// Order the stable subset of `latest_files` by the remote index order,
/// dropping duplicates and files the index does not reference.
pub fn latest_stable_files(data: &ModData) -> Vec<RemoteArtifact> {
    let mut stable: HashMap<i64, &ModFile> = data
        .latest_files
        .iter()
        .filter(|f| f.release_type == RELEASE_TYPE_STABLE)
        .map(|f| (f.id, f))
        .collect();
    data.latest_files_indexes
        .iter()
        .filter_map(|idx| stable.remove(&idx.file_id))
        .map(RemoteArtifact::from)
        .collect()
}

#[async_trait]
impl Fetcher for CurseforgeClient {
    async fn version_types(&self) -> Result<HashMap<i64, String>, FetchError> {
        let url = format!("{}/games/{}/version-types", self.base_url, GAME_ID);
        let envelope: DataEnvelope<Vec<VersionType>> = self.get_json(&url).await?;
        Ok(envelope
            .data
            .into_iter()
            .map(|vt| (vt.id, vt.slug))
            .collect())
    }

    async fn latest_stable(&self) -> Result<ArtifactListing, FetchError> {
        let data = self.mod_data().await?;
        let files = latest_stable_files(&data);
        info!(
            mod_id = self.mod_id,
            mod_name = %data.name,
            stable_files = files.len(),
            "Fetched latest stable files"
        );
        Ok(ArtifactListing {
            mod_name: data.name,
            files,
        })
    }

    async fn changelog(&self, file_id: i64) -> Result<String, FetchError> {
        let url = format!(
            "{}/mods/{}/files/{}/changelog",
            self.base_url, self.mod_id, file_id
        );
        let envelope: DataEnvelope<String> = self.get_json(&url).await?;
        Ok(envelope.data)
    }

    async fn download(&self, artifact: &RemoteArtifact, dest: &Path) -> Result<(), FetchError> {
        let url = artifact.download_url.as_deref().ok_or_else(|| {
            FetchError::Malformed(format!(
                "file {} ({}) has no download url",
                artifact.file_id, artifact.file_name
            ))
        })?;
        info!(file = %artifact.file_name, dest = %dest.display(), "Downloading artifact");
        let response = self
            .http
            .get(url)
            .header("x-api-key", &self.api_token)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth { status });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            return Err(FetchError::Api { status, body });
        }
        let bytes = response.bytes().await?;
        std::fs::write(dest, &bytes)?;
        Ok(())
    }
}
