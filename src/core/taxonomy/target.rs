// ─── Upload Targets ───
// A platform is either active (backed by its taxonomy cache) or disabled,
// chosen once from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::{HttpTaxonomySource, TaxonomyCache, CURSEFORGE_CACHE};
use crate::core::config::TargetConfig;
use crate::core::error::{ResolveError, ResolveResult};
use crate::core::metadata::{Environment, Loader, ModMetadata};

#[async_trait]
pub trait PlatformTarget: Send + Sync {
    fn is_enabled(&self) -> bool;

    async fn lookup_ids(
        &self,
        loaders: &[Loader],
        versions: &[String],
        environment: Environment,
    ) -> ResolveResult<Vec<u64>>;
}

#[async_trait]
impl PlatformTarget for TaxonomyCache {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn lookup_ids(
        &self,
        loaders: &[Loader],
        versions: &[String],
        environment: Environment,
    ) -> ResolveResult<Vec<u64>> {
        TaxonomyCache::lookup_ids(self, loaders, versions, environment).await
    }
}

/// Stand-in for an unconfigured platform; never touches the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTarget;

#[async_trait]
impl PlatformTarget for DisabledTarget {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn lookup_ids(
        &self,
        _loaders: &[Loader],
        _versions: &[String],
        _environment: Environment,
    ) -> ResolveResult<Vec<u64>> {
        Ok(Vec::new())
    }
}

/// The `metadata` form field of an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub changelog: String,
    pub game_versions: Vec<u64>,
    pub release_type: String,
}

/// Dispatcher without Box<dyn>
#[derive(Clone)]
pub enum UploadTarget {
    Active(TaxonomyCache),
    Disabled(DisabledTarget),
}

impl UploadTarget {
    pub fn from_config(
        client: reqwest::Client,
        config: &TargetConfig,
        user_agent: &str,
    ) -> ResolveResult<Self> {
        if !config.is_configured() {
            info!("CurseForge target not configured, uploads disabled");
            return Ok(Self::Disabled(DisabledTarget));
        }

        let source = HttpTaxonomySource::new(client, &config.endpoint, &config.token, user_agent)
            .map_err(|e| ResolveError::Config(format!("curseforge headers: {e}")))?;
        info!("CurseForge target enabled at {}", config.endpoint);
        Ok(Self::Active(TaxonomyCache::new(
            CURSEFORGE_CACHE,
            Arc::new(source),
            config.refresh_policy(),
        )))
    }

    fn target(&self) -> &dyn PlatformTarget {
        match self {
            UploadTarget::Active(t) => t,
            UploadTarget::Disabled(t) => t,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.target().is_enabled()
    }

    pub async fn lookup_ids(
        &self,
        loaders: &[Loader],
        versions: &[String],
        environment: Environment,
    ) -> ResolveResult<Vec<u64>> {
        match self {
            UploadTarget::Active(t) => t.lookup_ids(loaders, versions, environment).await,
            UploadTarget::Disabled(t) => {
                PlatformTarget::lookup_ids(t, loaders, versions, environment).await
            }
        }
    }

    /// Build the upload metadata for `meta` and its resolved versions.
    pub async fn upload_metadata(
        &self,
        meta: &ModMetadata,
        versions: &[String],
    ) -> ResolveResult<UploadMetadata> {
        let loaders: Vec<Loader> = meta.loaders.iter().copied().collect();
        let game_versions = self
            .lookup_ids(&loaders, versions, meta.environment)
            .await?;
        Ok(UploadMetadata {
            changelog: String::new(),
            game_versions,
            release_type: meta.release_channel.clone(),
        })
    }
}
