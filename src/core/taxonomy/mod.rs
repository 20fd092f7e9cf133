// ─── Platform Taxonomy ───
// A platform's numeric ids for loaders, game versions and environments,
// fetched as two documents and partitioned into lookup maps.

pub mod slug;
pub mod source;
pub mod target;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::core::cache::{RefreshCell, RefreshPolicy, Snapshot};
use crate::core::error::{ResolveError, ResolveResult};
use crate::core::metadata::{Environment, Loader};

pub use slug::{version_header_slug, version_slug};
pub use source::{GameVersion, HttpTaxonomySource, TaxonomySource, VersionType};
pub use target::{DisabledTarget, PlatformTarget, UploadMetadata, UploadTarget};

pub const CURSEFORGE_CACHE: &str = "curseforge taxonomy";

const ENVIRONMENT_TYPE_SLUG: &str = "environment";
const LOADER_TYPE_SLUG: &str = "modloader";
const GAME_VERSION_TYPE_PREFIX: &str = "minecraft-";

/// Partitioned lookup tables built from one fetch.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    environments: HashMap<String, u64>,
    loaders: HashMap<String, u64>,
    versions: HashMap<String, u64>,
    game_version_types: HashMap<String, u64>,
    versions_by_slug: HashMap<(u64, String), u64>,
}

impl Taxonomy {
    pub fn partition(types: &[VersionType], versions: &[GameVersion]) -> Self {
        let mut environment_type = None;
        let mut loader_type = None;
        let mut game_version_types = HashMap::new();
        for version_type in types {
            match version_type.slug.as_str() {
                ENVIRONMENT_TYPE_SLUG => environment_type = Some(version_type.id),
                LOADER_TYPE_SLUG => loader_type = Some(version_type.id),
                slug if slug.starts_with(GAME_VERSION_TYPE_PREFIX) => {
                    game_version_types.insert(version_type.slug.clone(), version_type.id);
                }
                _ => {}
            }
        }
        let game_type_ids: HashSet<u64> = game_version_types.values().copied().collect();

        let mut taxonomy = Taxonomy {
            game_version_types,
            ..Default::default()
        };
        for version in versions {
            let type_id = version.game_version_type_id;
            if Some(type_id) == environment_type {
                taxonomy.environments.insert(version.slug.clone(), version.id);
            } else if Some(type_id) == loader_type {
                taxonomy.loaders.insert(version.slug.clone(), version.id);
            } else if game_type_ids.contains(&type_id) {
                taxonomy.versions.insert(version.name.clone(), version.id);
                taxonomy
                    .versions_by_slug
                    .insert((type_id, version.slug.clone()), version.id);
            }
        }

        debug!(
            "Partitioned taxonomy: {} environments, {} loaders, {} versions",
            taxonomy.environments.len(),
            taxonomy.loaders.len(),
            taxonomy.versions.len()
        );
        taxonomy
    }

    pub fn loader_id(&self, loader: Loader) -> Option<u64> {
        self.loaders.get(loader.slug()).copied()
    }

    /// By display name first, then by `(version type, slug)`.
    pub fn version_id(&self, version: &str) -> Option<u64> {
        if let Some(id) = self.versions.get(version) {
            return Some(*id);
        }
        let type_id = self
            .game_version_types
            .get(&version_header_slug(version)?)?;
        self.versions_by_slug
            .get(&(*type_id, version_slug(version)))
            .copied()
    }

    /// Both sides expand to the client id followed by the server id.
    pub fn environment_ids(&self, environment: Environment) -> ResolveResult<Vec<u64>> {
        let sides: &[&str] = match environment {
            Environment::Both => &["client", "server"],
            Environment::Client => &["client"],
            Environment::Server => &["server"],
        };
        sides
            .iter()
            .map(|side| {
                self.environments.get(*side).copied().ok_or_else(|| {
                    ResolveError::UnknownLoaderOrVersion {
                        axis: "environment",
                        value: side.to_string(),
                    }
                })
            })
            .collect()
    }

    /// Ids in upload order: loaders, then versions, then environments.
    pub fn lookup_ids(
        &self,
        loaders: &[Loader],
        versions: &[String],
        environment: Environment,
    ) -> ResolveResult<Vec<u64>> {
        let mut ids = Vec::with_capacity(loaders.len() + versions.len() + 2);
        for loader in loaders {
            let id = self
                .loader_id(*loader)
                .ok_or_else(|| ResolveError::UnknownLoaderOrVersion {
                    axis: "loader",
                    value: loader.to_string(),
                })?;
            ids.push(id);
        }
        for version in versions {
            let id = self
                .version_id(version)
                .ok_or_else(|| ResolveError::UnknownLoaderOrVersion {
                    axis: "version",
                    value: version.clone(),
                })?;
            ids.push(id);
        }
        ids.extend(self.environment_ids(environment)?);
        Ok(ids)
    }
}

/// Shared handle to one platform's taxonomy.
#[derive(Clone)]
pub struct TaxonomyCache {
    cell: Arc<RefreshCell<Taxonomy>>,
    source: Arc<dyn TaxonomySource>,
}

impl TaxonomyCache {
    pub fn new(name: &'static str, source: Arc<dyn TaxonomySource>, policy: RefreshPolicy) -> Self {
        Self {
            cell: Arc::new(RefreshCell::new(name, policy)),
            source,
        }
    }

    pub fn name(&self) -> &'static str {
        self.cell.name()
    }

    pub async fn ensure_fresh(&self) -> ResolveResult<Arc<Snapshot<Taxonomy>>> {
        let source = Arc::clone(&self.source);
        self.cell
            .ensure_fresh(move || async move {
                let types = source.version_types().await?;
                let versions = source.versions().await?;
                Ok(Taxonomy::partition(&types, &versions))
            })
            .await
    }

    /// Look up ids against an unexpired snapshot.
    ///
    /// A failed refresh with no unexpired snapshot to fall back on is
    /// `CacheFetchFailed`.
    pub async fn lookup_ids(
        &self,
        loaders: &[Loader],
        versions: &[String],
        environment: Environment,
    ) -> ResolveResult<Vec<u64>> {
        let snapshot = self.ensure_fresh().await?;
        snapshot.data.lookup_ids(loaders, versions, environment)
    }
}
