#![doc = "GitHub publisher for the CLI: bridges the core Publisher trait to the GitHub releases API."]
//
//! # GitHub Publisher (CLI <-> Core)
//!
//! This module provides the bridge between the CLI workflow and the publish
//! abstraction in [`cf_release_core::contract`]. It wires up the
//! [`Publisher`] trait for real use against the GitHub REST API.
//!
//! ## Client Usage
//!
//! - Construct [`GithubClient`] from the `GH_TOKEN` credential and the
//!   `owner/name` repository reference (see `load_config`).
//! - Release lookup is by tag; a 404 creates the release. The returned
//!   `upload_url` has its URI-template suffix stripped before use.
//! - All transport, serialization, and error handling are encapsulated in
//!   the client implementation; 401/403 surface as `PublishError::Auth`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use cf_release_core::contract::{PublishError, PublishedRelease, Publisher, ReleaseHandle};

use crate::load_config::RepoRef;

pub const GH_API: &str = "https://api.github.com";

/// GitHub release metadata, as much of it as the pipeline needs.
#[derive(Debug, Clone, Deserialize)]
struct GithubRelease {
    tag_name: String,
    upload_url: String,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubAsset {
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    repo: RepoRef,
}

impl GithubClient {
    pub fn new(token: impl Into<String>, repo: RepoRef) -> Self {
        Self::with_base_url(token, repo, GH_API)
    }

    /// Same client against a different endpoint; used by tests.
    pub fn with_base_url(
        token: impl Into<String>,
        repo: RepoRef,
        base_url: impl Into<String>,
    ) -> Self {
        // Same panic-on-TLS-failure semantics as reqwest::Client::new().
        let http = reqwest::Client::builder()
            .user_agent(concat!("cf-release/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
            repo,
        }
    }

    fn releases_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/releases{}",
            self.base_url, self.repo.owner, self.repo.name, suffix
        )
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PublishError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PublishError::Auth { status });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            return Err(PublishError::Api { status, body });
        }
        Ok(response)
    }
}

/// Truncate a GitHub `upload_url` at its URI-template suffix
/// (`.../assets{?name,label}` → `.../assets`).
fn strip_upload_template(upload_url: &str) -> String {
    match upload_url.split_once('{') {
        Some((head, _)) => head.to_string(),
        None => upload_url.to_string(),
    }
}

#[async_trait]
impl Publisher for GithubClient {
    async fn latest_release(&self) -> Result<Option<PublishedRelease>, PublishError> {
        let url = self.releases_url("/latest");
        let response = self.auth(self.http.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let release = Self::check(response)
            .await?
            .json::<GithubRelease>()
            .await?;
        Ok(Some(PublishedRelease {
            tag: release.tag_name,
            asset_names: release.assets.into_iter().map(|a| a.name).collect(),
        }))
    }

    async fn get_or_create_release(
        &self,
        tag: &str,
        body: &str,
    ) -> Result<ReleaseHandle, PublishError> {
        let lookup_url = self.releases_url(&format!("/tags/{tag}"));
        let response = self.auth(self.http.get(&lookup_url)).send().await?;

        let release = if response.status() == StatusCode::NOT_FOUND {
            info!(tag, "Release not found, creating");
            let payload = CreateRelease {
                tag_name: tag,
                name: tag,
                body,
                draft: false,
                prerelease: false,
            };
            let created = self
                .auth(self.http.post(self.releases_url("")))
                .json(&payload)
                .send()
                .await?;
            Self::check(created).await?.json::<GithubRelease>().await?
        } else {
            info!(tag, "Reusing existing release");
            Self::check(response)
                .await?
                .json::<GithubRelease>()
                .await?
        };

        Ok(ReleaseHandle {
            tag: release.tag_name,
            upload_url: strip_upload_template(&release.upload_url),
        })
    }

    async fn upload_asset(
        &self,
        upload_url: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<(), PublishError> {
        info!(asset = name, bytes = content.len(), "Uploading release asset");
        let response = self
            .auth(self.http.post(upload_url))
            .query(&[("name", name)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
