// ─── Mod Resolver Core ───
// Metadata extraction and game-version resolution for uploaded mod jars.
//
// Architecture:
//   core/
//     version/    Version constraints and the two range grammars
//     archive/    Jar scanning, loader manifests, classfile reader
//     metadata    Loader / environment tags and ModMetadata
//     cache/      Expiring snapshots with single-flight refresh
//     catalog/    Minecraft release catalog (Mojang manifest)
//     taxonomy/   Upload platform id taxonomy and targets
//     resolver    Bytes in, metadata + resolved versions out
//     config      JSON settings
//     http        Shared reqwest client

pub mod archive;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod metadata;
pub mod resolver;
pub mod taxonomy;
pub mod version;

#[cfg(test)]
mod fixtures;
