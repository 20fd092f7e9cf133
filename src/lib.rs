pub mod core;

pub use crate::core::archive::{extract_metadata, extract_metadata_from_bytes};
pub use crate::core::catalog::{HttpManifestSource, ManifestSource, ReleaseCatalog};
pub use crate::core::config::{ProjectPlatform, ResolverConfig};
pub use crate::core::error::{ErrorKind, ResolveError, ResolveResult};
pub use crate::core::metadata::{Environment, Loader, ModMetadata};
pub use crate::core::resolver::{BuildMeta, ResolvedMod, Resolver};
pub use crate::core::taxonomy::{TaxonomyCache, UploadTarget};
pub use crate::core::version::{Constraint, Version};
