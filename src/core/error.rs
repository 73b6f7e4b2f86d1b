use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Central error type for the mod acquisition backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Registry ────────────────────────────────────────
    #[error("Registry API error: {0}")]
    RegistryApi(String),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// An artifact name that is not a single plain path component.
    #[error("Unsafe artifact filename: {0:?}")]
    UnsafeFileName(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Install ─────────────────────────────────────────
    /// The managed mods directory could not be cleared or written.
    /// This is the only failure that aborts a whole preparation run.
    #[error("Cannot install mods into {path:?}: {source}")]
    Install {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Loader ──────────────────────────────────────────
    #[error("Unknown mod loader: {0}")]
    UnknownLoader(String),

    // ── Run control ─────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// The desktop shell hands errors to the frontend as plain strings.
impl Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Why a single requirement dropped out of the closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The registry has no build for this game version / loader pair.
    NoCompatibleVersion,
    /// Lookup failed: network error, non-2xx status or malformed body.
    Registry,
    /// The version lookup succeeded but the artifact transfer did not.
    Download,
    /// The run was cancelled before this requirement finished.
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::NoCompatibleVersion => write!(f, "no compatible version"),
            FailureKind::Registry => write!(f, "registry error"),
            FailureKind::Download => write!(f, "download error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A requirement that could not be resolved, kept for the caller to surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    pub project_id: String,
    pub kind: FailureKind,
    pub message: Option<String>,
}

impl ResolutionFailure {
    pub fn new(project_id: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            project_id: project_id.into(),
            kind,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{} ({}): {}", self.project_id, self.kind, msg),
            None => write!(f, "{} ({})", self.project_id, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_error_serializes_as_display_string() {
        let err = LauncherError::DownloadFailed {
            url: "https://cdn.example/sodium.jar".into(),
            status: 404,
        };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(
            json,
            "\"Download failed for https://cdn.example/sodium.jar: HTTP 404\""
        );
    }

    #[test]
    fn failure_display_includes_kind_and_message() {
        let failure = ResolutionFailure::new("legacy-mod", FailureKind::NoCompatibleVersion);
        assert_eq!(failure.to_string(), "legacy-mod (no compatible version)");

        let failure = ResolutionFailure::new("lithium", FailureKind::Registry)
            .with_message("HTTP 503");
        assert_eq!(failure.to_string(), "lithium (registry error): HTTP 503");
    }
}
