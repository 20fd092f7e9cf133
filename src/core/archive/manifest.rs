// ─── Loader Manifests ───
// Subsets of the three manifest formats the extractor understands.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::core::version::RangeSpec;

pub const FABRIC_MANIFEST: &str = "fabric.mod.json";
pub const QUILT_MANIFEST: &str = "quilt.mod.json";
/// Checked in order; the second name is used by NeoForge 1.20.5+.
pub const FORGE_MANIFESTS: [&str; 2] = ["META-INF/mods.toml", "META-INF/neoforge.mods.toml"];

/// An entry point is either a class name or `{ "adapter": ..., "value": ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryPoint {
    Class(String),
    Adapted { value: String },
}

impl EntryPoint {
    /// Internal class path (`com/example/Mod`) of the entry point.
    ///
    /// `com.example.Mod::init` style member references resolve to the class.
    pub fn class_path(&self) -> String {
        let value = match self {
            EntryPoint::Class(value) | EntryPoint::Adapted { value } => value,
        };
        let class = value.split("::").next().unwrap_or(value);
        class.replace('.', "/")
    }
}

/// Entry point lists may also be written as a single entry.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<EntryPoint>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<EntryPoint>),
        One(EntryPoint),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(entries) => entries,
        OneOrMany::One(entry) => vec![entry],
    })
}

// ── fabric.mod.json ─────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricModJson {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub entrypoints: FabricEntrypoints,
    #[serde(default)]
    pub depends: HashMap<String, RangeSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FabricEntrypoints {
    #[serde(default, deserialize_with = "one_or_many")]
    pub main: Vec<EntryPoint>,
}

// ── quilt.mod.json ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuiltModJson {
    pub quilt_loader: QuiltLoaderSection,
    #[serde(default)]
    pub minecraft: QuiltMinecraftSection,
}

#[derive(Debug, Deserialize)]
pub struct QuiltLoaderSection {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub entrypoints: QuiltEntrypoints,
    #[serde(default)]
    pub depends: Vec<QuiltDependency>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuiltEntrypoints {
    #[serde(default, deserialize_with = "one_or_many")]
    pub init: Vec<EntryPoint>,
}

/// A dependency is a bare mod id or an object with an optional range.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuiltDependency {
    Id(String),
    Detailed {
        id: String,
        #[serde(default, alias = "versions")]
        version: Option<RangeSpec>,
    },
}

impl QuiltDependency {
    pub fn id(&self) -> &str {
        match self {
            QuiltDependency::Id(id) | QuiltDependency::Detailed { id, .. } => id,
        }
    }

    pub fn range(&self) -> Option<&RangeSpec> {
        match self {
            QuiltDependency::Id(_) => None,
            QuiltDependency::Detailed { version, .. } => version.as_ref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QuiltMinecraftSection {
    #[serde(default)]
    pub environment: Option<String>,
}

// ── META-INF/mods.toml ──────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModsToml {
    #[serde(default)]
    pub mods: Vec<ModsTomlEntry>,
    #[serde(default)]
    pub dependencies: HashMap<String, Vec<ModsTomlDependency>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModsTomlEntry {
    pub mod_id: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModsTomlDependency {
    pub mod_id: String,
    #[serde(default)]
    pub version_range: Option<String>,
}
