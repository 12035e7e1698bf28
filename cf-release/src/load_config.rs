/// `load_config` module: assembles the runtime configuration from the
/// environment—addon id, API credentials and target repository.
///
/// This is the only place secrets are read. They arrive per run from the CI
/// environment (`.env` is honored for local development via dotenvy) and are
/// never persisted or logged; log lines only record presence.
///
/// # Responsibilities
/// - Read and validate `ADDON_ID`, `CF_API_TOKEN`, `GH_TOKEN`,
///   `GITHUB_REPOSITORY`
/// - Parse the addon id to a number and the repository to `owner/name`
/// - Ensure robust error messages for CLI and tests: any failure in loading
///   must result in clear diagnostics naming the offending variable.
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich
/// diagnostics, and are surfaced at the CLI boundary.
use anyhow::{anyhow, Result};
use std::env;
use tracing::{error, info};

/// `owner/name` pair naming the repository releases are published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse the `GITHUB_REPOSITORY` form, `owner/name`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(RepoRef {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(anyhow!(
                "GITHUB_REPOSITORY must be of the form owner/name, got {raw:?}"
            )),
        }
    }
}

/// Runtime configuration for one release run.
#[derive(Debug)]
pub struct ReleaseConfig {
    pub addon_id: i64,
    pub cf_api_token: String,
    /// Absent on dry runs, where publication is skipped.
    pub gh_token: Option<String>,
    pub repository: Option<RepoRef>,
}

fn required_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => {
            error!(var = name, "Required environment variable is missing");
            Err(anyhow!("environment variable {name} is required"))
        }
    }
}

/// Load the release configuration from the environment.
///
/// With `require_publish` the GitHub credential and target repository are
/// mandatory; a dry run may omit both.
pub fn load_config(require_publish: bool) -> Result<ReleaseConfig> {
    let addon_id_raw = required_var("ADDON_ID")?;
    let addon_id = addon_id_raw.parse::<i64>().map_err(|e| {
        error!(error = ?e, raw = %addon_id_raw, "Failed to parse ADDON_ID");
        anyhow!("ADDON_ID must be a numeric mod id, got {addon_id_raw:?}")
    })?;

    let cf_api_token = required_var("CF_API_TOKEN")?;

    let (gh_token, repository) = if require_publish {
        let token = required_var("GH_TOKEN")?;
        let repo = RepoRef::parse(&required_var("GITHUB_REPOSITORY")?)?;
        (Some(token), Some(repo))
    } else {
        let token = env::var("GH_TOKEN").ok().filter(|v| !v.is_empty());
        let repo = match env::var("GITHUB_REPOSITORY") {
            Ok(raw) if !raw.is_empty() => Some(RepoRef::parse(&raw)?),
            _ => None,
        };
        (token, repo)
    };

    info!(
        addon_id,
        cf_token_set = !cf_api_token.is_empty(),
        gh_token_set = gh_token.is_some(),
        repository = ?repository,
        "Loaded release configuration from environment"
    );

    Ok(ReleaseConfig {
        addon_id,
        cf_api_token,
        gh_token,
        repository,
    })
}
