// ─── Minecraft Release Catalog ───
// The sorted list of official releases, refreshed wholesale from the version
// manifest and matched against constraints.

pub mod manifest;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::core::cache::{RefreshCell, RefreshPolicy, Snapshot};
use crate::core::error::ResolveResult;
use crate::core::version::{Constraint, Version};

pub use manifest::{HttpManifestSource, ManifestSource, VersionEntry, VersionManifest};

pub const CATALOG_CACHE: &str = "release catalog";

/// Official releases only: no snapshots, pre-releases or special builds.
static RELEASE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+(\.[0-9]+)?$").expect("release id pattern is valid")
});

/// Shared handle to the catalog; clones see the same snapshot.
#[derive(Clone)]
pub struct ReleaseCatalog {
    cell: Arc<RefreshCell<Vec<Version>>>,
    source: Arc<dyn ManifestSource>,
}

impl ReleaseCatalog {
    pub fn new(source: Arc<dyn ManifestSource>, policy: RefreshPolicy) -> Self {
        Self {
            cell: Arc::new(RefreshCell::new(CATALOG_CACHE, policy)),
            source,
        }
    }

    /// Refresh the catalog if it is missing or due, joining any refresh
    /// already in flight.
    pub async fn ensure_fresh(&self) -> ResolveResult<Arc<Snapshot<Vec<Version>>>> {
        let source = Arc::clone(&self.source);
        self.cell
            .ensure_fresh(move || async move {
                let manifest = source.fetch().await?;
                Ok(release_versions(&manifest))
            })
            .await
    }

    /// Releases matching `constraint`, ascending, rendered `X.Y[.Z]`.
    pub async fn matching(&self, constraint: &Constraint) -> ResolveResult<Vec<String>> {
        let snapshot = self.ensure_fresh().await?;
        let matched = matching_versions(&snapshot.data, constraint);
        debug!("{} matched {} releases", constraint, matched.len());
        Ok(matched)
    }

    /// Releases matching any of `constraints`, from a single snapshot.
    pub async fn matching_any(&self, constraints: &[Constraint]) -> ResolveResult<Vec<String>> {
        if constraints.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.ensure_fresh().await?;
        Ok(snapshot
            .data
            .iter()
            .filter(|v| constraints.iter().any(|c| c.matches(v)))
            .map(Version::to_release_string)
            .collect())
    }

    /// Every cached release, ascending.
    pub async fn releases(&self) -> ResolveResult<Vec<String>> {
        let snapshot = self.ensure_fresh().await?;
        Ok(snapshot.data.iter().map(Version::to_release_string).collect())
    }
}

/// Filter a manifest down to a sorted, de-duplicated list of releases.
pub fn release_versions(manifest: &VersionManifest) -> Vec<Version> {
    let mut versions: Vec<Version> = manifest
        .versions
        .iter()
        .filter(|entry| RELEASE_ID.is_match(&entry.id))
        .filter_map(|entry| Version::parse(&entry.id))
        .collect();
    versions.sort();
    versions.dedup();
    versions
}

pub fn matching_versions(catalog: &[Version], constraint: &Constraint) -> Vec<String> {
    catalog
        .iter()
        .filter(|v| constraint.matches(v))
        .map(Version::to_release_string)
        .collect()
}
