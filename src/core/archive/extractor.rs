// ─── Archive Metadata Extractor ───
// Reads a mod jar and works out which loaders it targets, its version and the
// game versions it declares. Loader checks are independent; a multi-loader
// jar contributes one loader tag (and constraint) per recognised manifest.

use std::io::{Cursor, Read, Seek};

use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::classfile::{Classfile, ClassfileError};
use super::jar_manifest::{main_attribute, JAR_MANIFEST};
use super::manifest::{
    FabricModJson, ModsToml, QuiltModJson, FABRIC_MANIFEST, FORGE_MANIFESTS, QUILT_MANIFEST,
};
use crate::core::error::{ResolveError, ResolveResult};
use crate::core::metadata::{Environment, Loader, ModMetadata};
use crate::core::version::{parse_interval_range, parse_range_spec, Constraint};

/// Interface a fabric `main` entry point must implement.
pub const FABRIC_INITIALIZER: &str = "net/fabricmc/api/ModInitializer";
/// Interface a quilt `init` entry point must implement.
pub const QUILT_INITIALIZER: &str = "org/quiltmc/qsl/base/api/entrypoint/ModInitializer";
pub const FORGE_MOD_ANNOTATION: &str = "Lnet/minecraftforge/fml/common/Mod;";
pub const NEOFORGE_MOD_ANNOTATION: &str = "Lnet/neoforged/fml/common/Mod;";

const MINECRAFT_MOD_ID: &str = "minecraft";
const JAR_VERSION_PLACEHOLDER: &str = "${file.jarVersion}";

/// Extract metadata from an in-memory archive.
pub fn extract_metadata_from_bytes(bytes: &[u8]) -> ResolveResult<ModMetadata> {
    extract_metadata(Cursor::new(bytes))
}

/// Extract metadata from a seekable archive.
///
/// An archive without any loader manifest yields metadata with no loaders
/// and no constraints; rejecting it is up to the caller. Anything malformed
/// inside a recognised manifest is an error.
pub fn extract_metadata<R: Read + Seek>(reader: R) -> ResolveResult<ModMetadata> {
    let mut archive = ZipArchive::new(reader)?;
    let mut meta = ModMetadata::default();

    if let Some(text) = read_text(&mut archive, FABRIC_MANIFEST)? {
        apply_fabric(&mut archive, &text, &mut meta)?;
    }

    if let Some(text) = read_text(&mut archive, QUILT_MANIFEST)? {
        apply_quilt(&mut archive, &text, &mut meta)?;
    }

    for path in FORGE_MANIFESTS {
        if let Some(text) = read_text(&mut archive, path)? {
            apply_forge_like(&mut archive, path, &text, &mut meta)?;
            break;
        }
    }

    if meta.is_unrecognised() {
        info!("No supported loader manifest found in archive");
    } else {
        info!(
            "Extracted {} for loaders {:?} ({} game version constraints)",
            meta.version_number,
            meta.loaders,
            meta.game_versions.len()
        );
    }
    Ok(meta)
}

// ── Fabric ──────────────────────────────────────────────

fn apply_fabric<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    text: &str,
    meta: &mut ModMetadata,
) -> ResolveResult<()> {
    let manifest: FabricModJson =
        serde_json::from_str(text).map_err(|e| ResolveError::manifest(FABRIC_MANIFEST, e))?;
    let environment = parse_environment(FABRIC_MANIFEST, manifest.environment.as_deref())?;
    let constraint = manifest
        .depends
        .get(MINECRAFT_MOD_ID)
        .map(parse_range_spec)
        .transpose()?;
    if constraint.is_none() {
        warn!("{} ({}) declares no minecraft dependency", FABRIC_MANIFEST, manifest.id);
    }

    for entry in &manifest.entrypoints.main {
        let class_path = entry.class_path();
        let class = load_class(archive, &class_path)?;
        if !class.implements(FABRIC_INITIALIZER) {
            debug!("Fabric entry point {} is not a ModInitializer", class_path);
            continue;
        }
        meta.version_number = manifest.version.clone();
        meta.loaders.insert(Loader::Fabric);
        meta.environment = environment;
        if let Some(c) = &constraint {
            meta.add_constraint(c.clone());
        }
    }
    Ok(())
}

// ── Quilt ───────────────────────────────────────────────

fn apply_quilt<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    text: &str,
    meta: &mut ModMetadata,
) -> ResolveResult<()> {
    let manifest: QuiltModJson =
        serde_json::from_str(text).map_err(|e| ResolveError::manifest(QUILT_MANIFEST, e))?;
    let environment =
        parse_environment(QUILT_MANIFEST, manifest.minecraft.environment.as_deref())?;
    let loader = &manifest.quilt_loader;
    let constraints = loader
        .depends
        .iter()
        .filter(|dep| dep.id() == MINECRAFT_MOD_ID)
        .filter_map(|dep| dep.range())
        .map(parse_range_spec)
        .collect::<ResolveResult<Vec<Constraint>>>()?;

    for entry in &loader.entrypoints.init {
        let class_path = entry.class_path();
        let class = load_class(archive, &class_path)?;
        if !class.implements(QUILT_INITIALIZER) {
            debug!("Quilt entry point {} is not a ModInitializer", class_path);
            continue;
        }
        meta.version_number = loader.version.clone();
        meta.loaders.insert(Loader::Quilt);
        meta.environment = environment;
        for c in &constraints {
            meta.add_constraint(c.clone());
        }
    }
    Ok(())
}

// ── Forge / NeoForge ────────────────────────────────────

fn apply_forge_like<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    text: &str,
    meta: &mut ModMetadata,
) -> ResolveResult<()> {
    let manifest: ModsToml = toml::from_str(text).map_err(|e| ResolveError::manifest(path, e))?;

    // Both runtimes share the manifest schema; only the @Mod annotation on a
    // compiled class tells them apart.
    let loader = detect_forge_like_loader(archive)?;

    let primary = manifest
        .mods
        .first()
        .ok_or_else(|| ResolveError::manifest(path, "no [[mods]] entry"))?;

    let mut version = primary.version.clone().unwrap_or_default();
    if version == JAR_VERSION_PLACEHOLDER {
        version = implementation_version(archive)?.ok_or_else(|| {
            ResolveError::manifest(
                path,
                "version is ${file.jarVersion} but MANIFEST.MF has no Implementation-Version",
            )
        })?;
    }

    meta.version_number = version;
    meta.loaders.insert(loader);

    let dependencies = manifest
        .dependencies
        .get(&primary.mod_id)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for dep in dependencies.iter().filter(|d| d.mod_id == MINECRAFT_MOD_ID) {
        let Some(range) = dep.version_range.as_deref() else {
            warn!("{}: minecraft dependency of {} has no versionRange", path, primary.mod_id);
            continue;
        };
        meta.add_constraint(parse_interval_range(range)?);
    }
    Ok(())
}

/// Scan compiled classes in archive order for a forge or neoforge `@Mod`.
fn detect_forge_like_loader<R: Read + Seek>(archive: &mut ZipArchive<R>) -> ResolveResult<Loader> {
    let class_paths: Vec<String> = archive
        .file_names()
        .filter_map(|name| name.strip_suffix(".class"))
        .map(str::to_string)
        .collect();

    for class_path in &class_paths {
        let class = load_class(archive, class_path)?;
        for annotation in class.runtime_visible_annotations() {
            let loader = match annotation.as_str() {
                FORGE_MOD_ANNOTATION => Loader::Forge,
                NEOFORGE_MOD_ANNOTATION => Loader::NeoForge,
                _ => continue,
            };
            debug!("{} carries {} → {}", class_path, annotation, loader);
            return Ok(loader);
        }
    }
    Err(ResolveError::AmbiguousLoader)
}

fn implementation_version<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> ResolveResult<Option<String>> {
    Ok(read_text(archive, JAR_MANIFEST)?
        .and_then(|text| main_attribute(&text, "Implementation-Version")))
}

// ── Helpers ─────────────────────────────────────────────

/// Read a UTF-8 entry, or `None` when the archive has no such entry.
fn read_text<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> ResolveResult<Option<String>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ResolveError::manifest(path, e)),
    };
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| ResolveError::manifest(path, e))?;
    Ok(Some(text))
}

/// Load `<class_path>.class` and check it names itself `class_path`.
fn load_class<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    class_path: &str,
) -> ResolveResult<Classfile> {
    let corrupt = |source: ClassfileError| ResolveError::MissingOrCorruptClassfile {
        class: class_path.to_string(),
        source,
    };

    let bytes = {
        let mut file = match archive.by_name(&format!("{class_path}.class")) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(corrupt(ClassfileError::NotFound)),
            Err(ZipError::Io(e)) => return Err(corrupt(ClassfileError::Io(e))),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| corrupt(ClassfileError::Io(e)))?;
        bytes
    };

    let class = Classfile::parse(&bytes).map_err(corrupt)?;
    if class.this_class() != class_path {
        return Err(ResolveError::ClassNameMismatch {
            expected: class_path.to_string(),
            found: class.this_class().to_string(),
        });
    }
    Ok(class)
}

fn parse_environment(path: &str, value: Option<&str>) -> ResolveResult<Environment> {
    let value = value.unwrap_or_default();
    Environment::parse(value)
        .ok_or_else(|| ResolveError::manifest(path, format!("unknown environment '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::fixtures::{fabric_jar, forge_jar, jar, ClassBuilder};
    use crate::core::version::Version;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn fabric_entry_point_verified() {
        let bytes = fabric_jar("1.2.3", ">=1.20");
        let meta = extract_metadata_from_bytes(&bytes).unwrap();

        assert_eq!(meta.loaders.iter().copied().collect::<Vec<_>>(), vec![Loader::Fabric]);
        assert_eq!(meta.version_number, "1.2.3");
        assert_eq!(meta.release_channel, "release");
        assert_eq!(meta.environment, Environment::Both);
        assert_eq!(meta.game_versions.len(), 1);
        let c = &meta.game_versions[0];
        assert!(c.matches(&v("1.20")));
        assert!(c.matches(&v("1.20.1")));
        assert!(!c.matches(&v("1.19.4")));
    }

    #[test]
    fn fabric_entry_point_without_marker_contributes_nothing() {
        let manifest = r#"{"id":"x","version":"1.0.0","entrypoints":{"main":["a.Plain"]},
            "depends":{"minecraft":"1.20.1"}}"#;
        let class = ClassBuilder::new("a/Plain").implements("java/lang/Runnable").build();
        let bytes = jar(&[
            ("fabric.mod.json", manifest.as_bytes()),
            ("a/Plain.class", class.as_slice()),
        ]);
        let meta = extract_metadata_from_bytes(&bytes).unwrap();
        assert!(meta.is_unrecognised());
        assert!(meta.game_versions.is_empty());
        assert_eq!(meta.version_number, "");
    }

    #[test]
    fn fabric_missing_entry_point_class_fails() {
        let manifest = r#"{"id":"x","version":"1.0.0","entrypoints":{"main":["a.Gone"]}}"#;
        let bytes = jar(&[("fabric.mod.json", manifest.as_bytes())]);
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MissingOrCorruptClassfile {
                source: ClassfileError::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn class_name_must_match_entry_path() {
        let manifest = r#"{"id":"x","version":"1.0.0","entrypoints":{"main":["a.Real"]}}"#;
        let class = ClassBuilder::new("a/Imposter")
            .implements(FABRIC_INITIALIZER)
            .build();
        let bytes = jar(&[
            ("fabric.mod.json", manifest.as_bytes()),
            ("a/Real.class", class.as_slice()),
        ]);
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClassNameMismatch);
    }

    #[test]
    fn annotation_scan_checks_class_names() {
        let manifest = r#"
[[mods]]
modId = "x"
version = "1.0"
"#;
        let class = ClassBuilder::new("a/C").annotated(FORGE_MOD_ANNOTATION).build();
        let bytes = jar(&[
            ("META-INF/mods.toml", manifest.as_bytes()),
            ("a/B.class", class.as_slice()),
        ]);
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClassNameMismatch);
    }

    #[test]
    fn unknown_environment_fails() {
        let manifest =
            r#"{"id":"x","version":"1.0.0","environment":"sideways","entrypoints":{"main":[]}}"#;
        let bytes = jar(&[("fabric.mod.json", manifest.as_bytes())]);
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedManifest);
    }

    #[test]
    fn corrupt_class_fails() {
        let manifest = r#"{"id":"x","version":"1.0.0","entrypoints":{"main":["a.Bad"]}}"#;
        let bytes = jar(&[
            ("fabric.mod.json", manifest.as_bytes()),
            ("a/Bad.class", b"not a class".as_slice()),
        ]);
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingOrCorruptClassfile);
    }

    #[test]
    fn undecodable_manifest_fails() {
        let bytes = jar(&[("fabric.mod.json", b"{ not json".as_slice())]);
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedManifest);
    }

    #[test]
    fn bad_range_in_manifest_fails() {
        let bytes = fabric_jar("1.0.0", ">=1.21 <1.20");
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVersionRange);
    }

    #[test]
    fn quilt_manifest() {
        let manifest = r#"{
            "schema_version": 1,
            "quilt_loader": {
                "group": "com.example",
                "id": "examplemod",
                "version": "0.4.0",
                "entrypoints": { "init": "com.example.QuiltMod" },
                "depends": [
                    "quilt_loader",
                    { "id": "minecraft", "versions": ["1.20.1", "1.20.2"] }
                ]
            },
            "minecraft": { "environment": "client" }
        }"#;
        let class = ClassBuilder::new("com/example/QuiltMod")
            .implements(QUILT_INITIALIZER)
            .build();
        let bytes = jar(&[
            ("quilt.mod.json", manifest.as_bytes()),
            ("com/example/QuiltMod.class", class.as_slice()),
        ]);
        let meta = extract_metadata_from_bytes(&bytes).unwrap();
        assert_eq!(meta.loaders.iter().copied().collect::<Vec<_>>(), vec![Loader::Quilt]);
        assert_eq!(meta.version_number, "0.4.0");
        assert_eq!(meta.environment, Environment::Client);
        assert_eq!(meta.game_versions[0].to_string(), "=1.20.1 || =1.20.2");
    }

    #[test]
    fn forge_and_neoforge_decided_by_annotation() {
        let forge = extract_metadata_from_bytes(&forge_jar(FORGE_MOD_ANNOTATION, "[1.20.1,1.21)"))
            .unwrap();
        assert_eq!(forge.loaders.iter().copied().collect::<Vec<_>>(), vec![Loader::Forge]);
        assert_eq!(forge.version_number, "2.0.1");
        assert_eq!(forge.game_versions[0].to_string(), ">=1.20.1 <1.21");

        let neo =
            extract_metadata_from_bytes(&forge_jar(NEOFORGE_MOD_ANNOTATION, "[1.21]")).unwrap();
        assert_eq!(neo.loaders.iter().copied().collect::<Vec<_>>(), vec![Loader::NeoForge]);
        assert_eq!(neo.game_versions[0].to_string(), "=1.21");
    }

    #[test]
    fn forge_like_without_annotation_is_ambiguous() {
        let manifest = r#"
[[mods]]
modId = "first"
version = "1.0"
[[mods]]
modId = "second"
version = "1.0"
"#;
        let class = ClassBuilder::new("a/Plain").annotated("Ljava/lang/Deprecated;").build();
        let bytes = jar(&[
            ("META-INF/mods.toml", manifest.as_bytes()),
            ("a/Plain.class", class.as_slice()),
        ]);
        let err = extract_metadata_from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousLoader));
    }

    #[test]
    fn neoforge_manifest_name_and_jar_version() {
        let manifest = r#"
[[mods]]
modId = "examplemod"
version = "${file.jarVersion}"
[[dependencies.examplemod]]
modId = "minecraft"
type = "required"
versionRange = "[1.21,1.21.1]"
"#;
        let class = ClassBuilder::new("com/example/Neo")
            .annotated(NEOFORGE_MOD_ANNOTATION)
            .build();
        let bytes = jar(&[
            (
                "META-INF/MANIFEST.MF",
                b"Manifest-Version: 1.0\r\nImplementation-Version: 3.1.4\r\n\r\n".as_slice(),
            ),
            ("META-INF/neoforge.mods.toml", manifest.as_bytes()),
            ("com/example/Neo.class", class.as_slice()),
        ]);
        let meta = extract_metadata_from_bytes(&bytes).unwrap();
        assert_eq!(meta.version_number, "3.1.4");
        assert_eq!(meta.loaders.iter().copied().collect::<Vec<_>>(), vec![Loader::NeoForge]);
        assert_eq!(meta.game_versions[0].to_string(), ">=1.21 <=1.21.1");
    }

    #[test]
    fn multi_loader_jar_merges() {
        let fabric_manifest = r#"{"id":"x","version":"5.0.0","environment":"server",
            "entrypoints":{"main":["com.example.FabricEntry"]},"depends":{"minecraft":"~1.20"}}"#;
        let fabric_class = ClassBuilder::new("com/example/FabricEntry")
            .implements(FABRIC_INITIALIZER)
            .build();
        let forge_manifest = r#"
[[mods]]
modId = "x"
version = "5.0.0"
[[dependencies.x]]
modId = "minecraft"
versionRange = "[1.20,1.21)"
"#;
        let forge_class = ClassBuilder::new("com/example/ForgeEntry")
            .annotated(FORGE_MOD_ANNOTATION)
            .build();
        let bytes = jar(&[
            ("fabric.mod.json", fabric_manifest.as_bytes()),
            ("META-INF/mods.toml", forge_manifest.as_bytes()),
            ("com/example/FabricEntry.class", fabric_class.as_slice()),
            ("com/example/ForgeEntry.class", forge_class.as_slice()),
        ]);
        let meta = extract_metadata_from_bytes(&bytes).unwrap();
        assert_eq!(
            meta.loaders.iter().copied().collect::<Vec<_>>(),
            vec![Loader::Fabric, Loader::Forge]
        );
        assert_eq!(meta.environment, Environment::Server);
        // `~1.20` and `[1.20,1.21)` render identically and are kept once
        assert_eq!(meta.game_versions.len(), 1);
    }

    #[test]
    fn archive_without_manifest_is_empty_success() {
        let bytes = jar(&[("readme.txt", b"hello".as_slice())]);
        let meta = extract_metadata_from_bytes(&bytes).unwrap();
        assert!(meta.is_unrecognised());
        assert!(meta.game_versions.is_empty());
    }

    #[test]
    fn garbage_is_malformed_archive() {
        let err = extract_metadata_from_bytes(b"definitely not a zip").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedArchive);
    }
}
