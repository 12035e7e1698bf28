//! The `release.json` manifest: the packager-compatible description of a
//! release that downstream addon managers consume.
//!
//! Shape (one entry per downloaded artifact):
//!
//! ```json
//! {
//!   "releases": [
//!     {
//!       "name": "MyAddon",
//!       "version": "1.2.3",
//!       "filename": "MyAddon-1.2.3-classic.zip",
//!       "nolib": false,
//!       "metadata": [ { "flavor": "classic", "interface": 11506 } ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::DownloadedArtifact;
use crate::flavor;

pub const MANIFEST_FILE_NAME: &str = "release.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub releases: Vec<ReleaseEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub name: String,
    pub version: String,
    pub filename: String,
    pub nolib: bool,
    pub metadata: Vec<ReleaseMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub flavor: String,
    pub interface: u32,
}

/// Extract the addon version from a filename: first `x.y.z` match, empty
/// string when the name carries no dotted version.
pub fn extract_version(file_name: &str) -> String {
    let version = Regex::new(r"(\d+\.\d+\.\d+)").expect("version pattern is valid");
    version
        .find(file_name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Build the manifest for a set of downloaded artifacts.
///
/// `version_types` maps remote version-type ids to flavor slugs; unknown
/// ids fall back to `"mainline"`.
pub fn build(
    mod_name: &str,
    version_types: &HashMap<i64, String>,
    artifacts: &[DownloadedArtifact],
) -> Manifest {
    let releases = artifacts
        .iter()
        .map(|artifact| {
            let metadata = artifact
                .remote
                .game_versions
                .iter()
                .filter_map(|gv| {
                    let interface = flavor::interface_number(&gv.name)?;
                    let flavor = version_types
                        .get(&gv.version_type_id)
                        .cloned()
                        .unwrap_or_else(|| "mainline".to_string());
                    Some(ReleaseMetadata { flavor, interface })
                })
                .collect();
            ReleaseEntry {
                name: mod_name.to_string(),
                version: extract_version(&artifact.file_name),
                filename: artifact.file_name.clone(),
                nolib: false,
                metadata,
            }
        })
        .collect();
    let manifest = Manifest { releases };
    debug!(?manifest, "Built release manifest");
    manifest
}

/// Serialize the manifest pretty-printed to `path`.
pub fn write(manifest: &Manifest, path: &Path) -> Result<(), WriteError> {
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), releases = manifest.releases.len(), "Wrote release manifest");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to serialise manifest: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
