use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::platform::Platform;
use crate::core::state::CacheLayout;
use crate::core::version::VersionDescriptor;

/// Ordered classpath: the version jar first (if on disk), then every
/// rule-eligible library whose artifact is on disk, in descriptor order.
/// Native-only entries never appear.
pub fn build_classpath(
    layout: &CacheLayout,
    descriptor: &VersionDescriptor,
    platform: &Platform,
) -> Vec<PathBuf> {
    let mut entries = Vec::new();

    let version_jar = layout.version_jar(&descriptor.id);
    if version_jar.is_file() {
        entries.push(version_jar);
    }

    let libraries_dir = layout.libraries_dir();
    for lib in descriptor.allowed_libraries(platform) {
        let Some(relative) = lib.artifact_path() else {
            continue;
        };
        let path = libraries_dir.join(relative);
        if !path.is_file() {
            debug!("Classpath entry missing on disk: {}", lib.name);
            continue;
        }
        if !entries.contains(&path) {
            entries.push(path);
        }
    }

    entries
}

pub fn join_classpath(entries: &[PathBuf], platform: &Platform) -> String {
    entries
        .iter()
        .map(|p| safe_path_str(p))
        .collect::<Vec<_>>()
        .join(platform.classpath_separator())
}

/// Absolute form of `path` for the command line.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java cannot read classpath entries in extended-length form (`\\?\C:\...`).
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
