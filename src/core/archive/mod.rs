// ─── Mod Archives ───
// Jar layout, loader manifests and the classfile reader behind the extractor.

pub mod classfile;
pub mod extractor;
pub mod jar_manifest;
pub mod manifest;

pub use extractor::{extract_metadata, extract_metadata_from_bytes};
