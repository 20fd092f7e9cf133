// ─── Resolver Configuration ───
// JSON settings document; every field has a default so a partial file works.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::cache::RefreshPolicy;
use crate::core::catalog::manifest::VERSION_MANIFEST_URL;
use crate::core::error::{ResolveError, ResolveResult};

const APP_DIR_NAME: &str = "mc-mod-resolver";
const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_USER_AGENT: &str = concat!("mc-mod-resolver/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub user_agent: String,
    pub catalog: CatalogConfig,
    pub curseforge: TargetConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            catalog: CatalogConfig::default(),
            curseforge: TargetConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub manifest_url: String,
    pub ttl_hours: u64,
    pub refresh_lead_hours: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            manifest_url: VERSION_MANIFEST_URL.to_string(),
            ttl_hours: 24,
            refresh_lead_hours: 2,
        }
    }
}

impl CatalogConfig {
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::from_hours(self.ttl_hours, self.refresh_lead_hours)
    }
}

/// Connection settings for an upload platform's API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub endpoint: String,
    pub token: String,
    /// Falls back to the top-level `user_agent` when empty.
    pub user_agent: String,
    pub ttl_hours: u64,
    pub refresh_lead_hours: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            user_agent: String::new(),
            ttl_hours: 24,
            refresh_lead_hours: 2,
        }
    }
}

impl TargetConfig {
    /// A target without endpoint and token is never contacted.
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty() && !self.token.is_empty()
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::from_hours(self.ttl_hours, self.refresh_lead_hours)
    }
}

/// A project's page and id on one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlatform {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub id: String,
}

impl ProjectPlatform {
    pub fn enabled(&self) -> bool {
        !self.id.is_empty()
    }
}

impl ResolverConfig {
    pub fn load(path: &Path) -> ResolveResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ResolverConfig = serde_json::from_str(&raw)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path`, else the default location if a file exists there, else
    /// the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> ResolveResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// User agent for a target, falling back to the global one.
    pub fn target_user_agent<'a>(&'a self, target: &'a TargetConfig) -> &'a str {
        if target.user_agent.is_empty() {
            &self.user_agent
        } else {
            &target.user_agent
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE))
}
