// ─── Version Manifest ───
// Fetching and parsing the Mojang version manifest v2.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::core::error::{ResolveError, ResolveResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: Option<LatestVersions>,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: String,
    #[serde(rename = "releaseTime", default)]
    pub release_time: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Where the catalog gets its manifest from.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch(&self) -> ResolveResult<VersionManifest>;
}

/// Fetches the manifest over HTTP using a shared client.
#[derive(Debug, Clone)]
pub struct HttpManifestSource {
    client: reqwest::Client,
    url: String,
}

impl HttpManifestSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn fetch(&self) -> ResolveResult<VersionManifest> {
        info!("Fetching Minecraft version manifest from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::FetchFailed {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let manifest: VersionManifest = response.json().await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }
}
