use std::path::PathBuf;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use thiserror::Error;

use super::archive::classfile::ClassfileError;

/// Central error type for the resolution core.
/// Every module returns `Result<T, ResolveError>`.
#[derive(Debug, Error)]
pub enum ResolveError {
    // ── Archive ─────────────────────────────────────────
    #[error("not a valid mod archive: {0}")]
    MalformedArchive(#[from] zip::result::ZipError),

    #[error("failed to decode {path}: {reason}")]
    MalformedManifest { path: String, reason: String },

    #[error("missing or corrupt classfile {class}: {source}")]
    MissingOrCorruptClassfile {
        class: String,
        source: ClassfileError,
    },

    #[error("class name: {found} doesn't match requested: {expected}")]
    ClassNameMismatch { expected: String, found: String },

    #[error("invalid forge-like loader: no class carries a known @Mod annotation")]
    AmbiguousLoader,

    // ── Version ranges ──────────────────────────────────
    #[error("invalid version range '{0}'")]
    InvalidVersionRange(String),

    #[error("empty version constraint")]
    EmptyConstraint,

    // ── Caches ──────────────────────────────────────────
    #[error("failed to refresh {cache} cache: {source}")]
    CacheFetchFailed {
        cache: &'static str,
        source: Arc<ResolveError>,
    },

    #[error("{cache} cache holds no unexpired data")]
    CacheUnavailable { cache: &'static str },

    #[error("invalid {axis}: {value}")]
    UnknownLoaderOrVersion { axis: &'static str, value: String },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed for {url}: HTTP {status}")]
    FetchFailed { url: String, status: u16 },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(String),

    // ── Config ──────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Coarse failure tag handed to the caller alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedArchive,
    MalformedManifest,
    MissingOrCorruptClassfile,
    ClassNameMismatch,
    AmbiguousLoader,
    InvalidVersionRange,
    EmptyConstraint,
    CacheFetchFailed,
    CacheUnavailable,
    UnknownLoaderOrVersion,
    Io,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedArchive => "malformed_archive",
            ErrorKind::MalformedManifest => "malformed_manifest",
            ErrorKind::MissingOrCorruptClassfile => "missing_or_corrupt_classfile",
            ErrorKind::ClassNameMismatch => "class_name_mismatch",
            ErrorKind::AmbiguousLoader => "ambiguous_loader",
            ErrorKind::InvalidVersionRange => "invalid_version_range",
            ErrorKind::EmptyConstraint => "empty_constraint",
            ErrorKind::CacheFetchFailed => "cache_fetch_failed",
            ErrorKind::CacheUnavailable => "cache_unavailable",
            ErrorKind::UnknownLoaderOrVersion => "unknown_loader_or_version",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::MalformedArchive(_) => ErrorKind::MalformedArchive,
            ResolveError::MalformedManifest { .. } => ErrorKind::MalformedManifest,
            ResolveError::MissingOrCorruptClassfile { .. } => {
                ErrorKind::MissingOrCorruptClassfile
            }
            ResolveError::ClassNameMismatch { .. } => ErrorKind::ClassNameMismatch,
            ResolveError::AmbiguousLoader => ErrorKind::AmbiguousLoader,
            ResolveError::InvalidVersionRange(_) => ErrorKind::InvalidVersionRange,
            ResolveError::EmptyConstraint => ErrorKind::EmptyConstraint,
            // Fetch errors only ever reach callers wrapped by a cache.
            ResolveError::CacheFetchFailed { .. }
            | ResolveError::Http(_)
            | ResolveError::FetchFailed { .. } => ErrorKind::CacheFetchFailed,
            ResolveError::CacheUnavailable { .. } => ErrorKind::CacheUnavailable,
            ResolveError::UnknownLoaderOrVersion { .. } => ErrorKind::UnknownLoaderOrVersion,
            ResolveError::Io { .. } => ErrorKind::Io,
            ResolveError::Config(_) => ErrorKind::Config,
            ResolveError::Json(_) | ResolveError::Task(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn manifest(path: &str, reason: impl ToString) -> Self {
        ResolveError::MalformedManifest {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(source: std::io::Error) -> Self {
        ResolveError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for the HTTP layer ────────────────────
// Handlers report failures as `{ "kind": ..., "message": ... }`.
impl serde::Serialize for ResolveError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ResolveError", 2)?;
        state.serialize_field("kind", self.kind().as_str())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
