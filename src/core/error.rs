use std::path::PathBuf;
use thiserror::Error;

use crate::core::events::LaunchState;

/// How spawning the game process failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFailure {
    /// The runtime executable does not exist (or is not on the search path).
    ExecutableNotFound,
    /// Any other OS-level refusal (permissions, resource limits, ...).
    Os,
}

/// Central error type for the entire launcher backend.
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

    #[error("No source could provide {artifact} (tried {attempts} location(s))")]
    ArtifactUnavailable { artifact: String, attempts: usize },

    // ── Integrity ───────────────────────────────────────
    #[error("Size mismatch for {path:?}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Metadata ────────────────────────────────────────
    #[error("Could not resolve version metadata: {0}")]
    Manifest(String),

    #[error("Version {0} is not listed in the version manifest")]
    VersionNotFound(String),

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Assets ──────────────────────────────────────────
    #[error(
        "Asset synchronization failed: {failed} of {total} objects could not be downloaded. \
         Check your connection and launch again; completed files are kept."
    )]
    AssetSync { failed: usize, total: usize },

    // ── Java ────────────────────────────────────────────
    #[error(
        "No Java installation was found. Install Java {required} (for example Eclipse Temurin \
         from https://adoptium.net) or set JAVA_HOME."
    )]
    RuntimeNotFound { required: u32 },

    #[error(
        "This version requires Java {required} or newer, but only Java {} is installed. \
         Install Java {required} (for example Eclipse Temurin from https://adoptium.net).",
        join_majors(.available)
    )]
    RuntimeIncompatible { required: u32, available: Vec<u32> },

    // ── Account ─────────────────────────────────────────
    #[error("No account is selected. Sign in or choose an offline profile before launching.")]
    AccountMissing,

    // ── Process ─────────────────────────────────────────
    #[error("Could not start {executable:?}: {}", spawn_hint(.kind, .source))]
    ProcessSpawn {
        executable: PathBuf,
        kind: SpawnFailure,
        source: std::io::Error,
    },

    // ── Orchestration ───────────────────────────────────
    #[error("Illegal launch state transition {from:?} -> {to:?}")]
    InvalidState { from: LaunchState, to: LaunchState },

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Wrap an IO error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a spawn failure from the OS error kind.
    pub fn spawn(executable: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => SpawnFailure::ExecutableNotFound,
            _ => SpawnFailure::Os,
        };
        LauncherError::ProcessSpawn {
            executable: executable.into(),
            kind,
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

fn join_majors(majors: &[u32]) -> String {
    majors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn spawn_hint(kind: &SpawnFailure, source: &std::io::Error) -> String {
    match kind {
        SpawnFailure::ExecutableNotFound => {
            "executable not found; reinstall Java or pick another runtime".to_string()
        }
        SpawnFailure::Os => format!("operating system refused to start the process ({source})"),
    }
}

// Hosts forward errors over a bridge as plain strings.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
