use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::version::Constraint;

pub const DEFAULT_RELEASE_CHANNEL: &str = "release";

/// Mod loaders an archive can target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Fabric,
    Quilt,
    Forge,
    NeoForge,
}

impl Loader {
    /// Slug used by distribution platforms.
    pub fn slug(self) -> &'static str {
        match self {
            Loader::Fabric => "fabric",
            Loader::Quilt => "quilt",
            Loader::Forge => "forge",
            Loader::NeoForge => "neoforge",
        }
    }
}

impl std::fmt::Display for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Side a mod runs on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Environment {
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "server")]
    Server,
    #[default]
    #[serde(rename = "*", alias = "both")]
    Both,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Client => "client",
            Environment::Server => "server",
            Environment::Both => "*",
        }
    }

    /// Lenient parse: `"both"`, `"*"` and an empty string all mean both sides.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Environment::Client),
            "server" => Some(Environment::Server),
            "both" | "*" | "" => Some(Environment::Both),
            _ => None,
        }
    }
}

/// Release metadata extracted from one mod archive.
///
/// Built up while the extractor scans the archive; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModMetadata {
    pub version_number: String,
    pub release_channel: String,
    /// One entry per loader manifest that declared a game dependency.
    pub game_versions: Vec<Constraint>,
    pub loaders: BTreeSet<Loader>,
    pub environment: Environment,
}

impl Default for ModMetadata {
    fn default() -> Self {
        Self {
            version_number: String::new(),
            release_channel: DEFAULT_RELEASE_CHANNEL.to_string(),
            game_versions: Vec::new(),
            loaders: BTreeSet::new(),
            environment: Environment::Both,
        }
    }
}

impl ModMetadata {
    /// True when no loader manifest was recognised in the archive.
    pub fn is_unrecognised(&self) -> bool {
        self.loaders.is_empty()
    }

    pub(crate) fn add_constraint(&mut self, constraint: Constraint) {
        if !self.game_versions.contains(&constraint) {
            self.game_versions.push(constraint);
        }
    }
}
