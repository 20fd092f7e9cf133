// ─── Resolution Orchestrator ───
// Archive bytes in; metadata, the concrete releases it supports and the
// archive digest out. The only entry point the upload layer calls.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::{info, warn};

use crate::core::archive::extract_metadata_from_bytes;
use crate::core::catalog::ReleaseCatalog;
use crate::core::error::{ResolveError, ResolveResult};
use crate::core::metadata::ModMetadata;
use crate::core::taxonomy::UploadTarget;

/// Everything learned about one uploaded archive.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMod {
    pub metadata: ModMetadata,
    /// Ascending, de-duplicated, rendered `X.Y[.Z]`.
    pub game_versions: Vec<String>,
    /// Lower-case hex SHA-512 of the archive.
    pub sha512: String,
}

/// The build record persisted alongside an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMeta {
    #[serde(rename = "version")]
    pub version_number: String,
    #[serde(rename = "channel")]
    pub release_channel: String,
    pub game_versions: Vec<String>,
    pub loaders: Vec<String>,
    pub environment: String,
}

impl ResolvedMod {
    pub fn build_meta(&self) -> BuildMeta {
        BuildMeta {
            version_number: self.metadata.version_number.clone(),
            release_channel: self.metadata.release_channel.clone(),
            game_versions: self.game_versions.clone(),
            loaders: self
                .metadata
                .loaders
                .iter()
                .map(|l| l.slug().to_string())
                .collect(),
            environment: self.metadata.environment.as_str().to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Resolver {
    catalog: ReleaseCatalog,
}

impl Resolver {
    pub fn new(catalog: ReleaseCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ReleaseCatalog {
        &self.catalog
    }

    /// Extract and resolve one archive. The first failure wins.
    pub async fn process(&self, bytes: Vec<u8>) -> ResolveResult<ResolvedMod> {
        let size = bytes.len();
        let (metadata, sha512) = tokio::task::spawn_blocking(move || {
            let metadata = extract_metadata_from_bytes(&bytes)?;
            let sha512 = hex::encode(Sha512::digest(&bytes));
            Ok::<_, ResolveError>((metadata, sha512))
        })
        .await
        .map_err(|e| ResolveError::Task(e.to_string()))??;

        if metadata.is_unrecognised() {
            warn!("Archive ({} bytes) has no recognised loader", size);
        }

        let game_versions = self.resolve_versions(&metadata).await?;
        info!(
            "Resolved {} {} to {} game versions",
            metadata.version_number,
            sha512.get(..12).unwrap_or_default(),
            game_versions.len()
        );
        Ok(ResolvedMod {
            metadata,
            game_versions,
            sha512,
        })
    }

    /// Union of the releases matching each declared constraint.
    pub async fn resolve_versions(&self, metadata: &ModMetadata) -> ResolveResult<Vec<String>> {
        self.catalog.matching_any(&metadata.game_versions).await
    }

    /// Platform ids for a resolved archive, in upload order.
    pub async fn platform_ids(
        &self,
        target: &UploadTarget,
        resolved: &ResolvedMod,
    ) -> ResolveResult<Vec<u64>> {
        let loaders: Vec<_> = resolved.metadata.loaders.iter().copied().collect();
        target
            .lookup_ids(&loaders, &resolved.game_versions, resolved.metadata.environment)
            .await
    }
}
