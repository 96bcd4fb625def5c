// ─── Runtime Discovery ───
// Enumerate local Java runtimes from every known origin, probe them, and
// pick the one a version needs.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{OsKind, Platform};
use crate::core::state::LauncherConfig;

use super::runtime::{probe_java, JavaInstallation, RuntimeOrigin};

/// Probes in flight at once.
const PROBE_CONCURRENCY: usize = 8;

/// Highest and lowest suffix tried for `javaNN` commands on `PATH`.
const SUFFIXED_COMMANDS: std::ops::RangeInclusive<u32> = 8..=25;

/// Folder-name fragments that mark a directory as a Java home.
const VENDOR_HINTS: &[&str] = &[
    "jre", "jdk", "java", "temurin", "adoptium", "zulu", "corretto", "graalvm", "semeru",
    "liberica", "openjdk", "runtime",
];

#[derive(Debug, Clone)]
pub struct RuntimeDiscovery {
    platform: Platform,
    bundled_dir: Option<PathBuf>,
    scan_system: bool,
    probe_timeout: Duration,
    java_home: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl RuntimeDiscovery {
    /// Discovery configured from `config` and the process environment.
    pub fn new(platform: Platform, config: &LauncherConfig) -> Self {
        Self {
            platform,
            bundled_dir: config.bundled_runtime_dir.clone(),
            scan_system: config.scan_system_runtimes,
            probe_timeout: config.java_probe_timeout(),
            java_home: std::env::var_os("JAVA_HOME").map(PathBuf::from),
            home_dir: dirs::home_dir(),
            search_path: std::env::var_os("PATH"),
        }
    }

    pub fn with_java_home(mut self, java_home: Option<PathBuf>) -> Self {
        self.java_home = java_home;
        self
    }

    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Probe every candidate once per resolved executable. Bundled runtimes
    /// come first, then system ones in origin order.
    #[instrument(skip(self))]
    pub async fn discover(&self) -> Vec<JavaInstallation> {
        // Directory scans and `which` lookups are blocking filesystem work.
        let scanner = self.clone();
        let unique = match tokio::task::spawn_blocking(move || scanner.unique_candidates()).await {
            Ok(unique) => unique,
            Err(e) => {
                warn!("Runtime scan task failed: {}", e);
                Vec::new()
            }
        };

        debug!("Probing {} runtime candidate(s)", unique.len());
        // `buffered` keeps discovery order for the selection tie-break.
        let found: Vec<JavaInstallation> = stream::iter(&unique)
            .map(|(path, origin)| probe_java(path, *origin, self.probe_timeout))
            .buffered(PROBE_CONCURRENCY)
            .filter_map(|probe| async move { probe })
            .collect()
            .await;

        for java in &found {
            debug!(
                "Found Java {} ({}) at {:?} [{:?}]",
                java.major_version, java.vendor, java.executable_path, java.origin
            );
        }
        found
    }

    /// Discover and select a runtime for `required` major.
    pub async fn resolve(&self, required: u32) -> LauncherResult<JavaInstallation> {
        self.resolve_including(required, None).await
    }

    /// Like [`RuntimeDiscovery::resolve`], with `known` (an installation
    /// probed elsewhere) appended to what discovery finds.
    pub async fn resolve_including(
        &self,
        required: u32,
        known: Option<JavaInstallation>,
    ) -> LauncherResult<JavaInstallation> {
        let mut found = self.discover().await;
        if let Some(java) = known {
            let canonical = tokio::fs::canonicalize(&java.executable_path)
                .await
                .unwrap_or_else(|_| java.executable_path.clone());
            if !found.iter().any(|f| f.executable_path == canonical) {
                found.push(java);
            }
        }
        let selected = select_runtime(&found, required)?;
        info!(
            "Selected Java {} at {:?} (requires {})",
            selected.major_version, selected.executable_path, required
        );
        Ok(selected.clone())
    }

    /// Existing candidates, deduplicated by canonical path, in origin order.
    fn unique_candidates(&self) -> Vec<(PathBuf, RuntimeOrigin)> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for (path, origin) in self.candidates() {
            if !path.is_file() {
                continue;
            }
            let resolved = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if seen.insert(resolved.clone()) {
                unique.push((resolved, origin));
            }
        }
        unique
    }

    fn candidates(&self) -> Vec<(PathBuf, RuntimeOrigin)> {
        let mut out = Vec::new();

        if let Some(bundled) = &self.bundled_dir {
            let platform_dir = bundled.join(self.platform.bundled_runtime_folder());
            out.extend(self.homes_in(&platform_dir, RuntimeOrigin::Bundled, true));
            out.extend(self.homes_in(bundled, RuntimeOrigin::Bundled, true));
        }

        if !self.scan_system {
            return out;
        }

        if let Some(home) = &self.java_home {
            out.extend(
                self.executables_in_home(home)
                    .into_iter()
                    .map(|p| (p, RuntimeOrigin::EnvHome)),
            );
        }

        for dir in self.platform.well_known_java_dirs(self.home_dir.clone()) {
            out.extend(self.homes_in(&dir, RuntimeOrigin::WellKnownDir, false));
        }

        if let Some(search_path) = &self.search_path {
            let cwd = std::env::current_dir().unwrap_or_default();
            let names = std::iter::once("java".to_string())
                .chain(SUFFIXED_COMMANDS.rev().map(|v| format!("java{v}")));
            for name in names {
                if let Ok(path) = which::which_in(&name, Some(search_path), &cwd) {
                    out.push((path, RuntimeOrigin::PathProbe));
                }
            }
        }

        out
    }

    /// `dir` itself plus each child directory, treated as a Java home.
    /// With `require_hint`, children must look like a JRE by name.
    fn homes_in(
        &self,
        dir: &Path,
        origin: RuntimeOrigin,
        require_hint: bool,
    ) -> Vec<(PathBuf, RuntimeOrigin)> {
        let mut homes = vec![dir.to_path_buf()];
        if let Ok(entries) = std::fs::read_dir(dir) {
            let mut children: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .filter(|p| !require_hint || looks_like_java_home(p))
                .collect();
            children.sort();
            homes.extend(children);
        }

        homes
            .iter()
            .flat_map(|home| self.executables_in_home(home))
            .map(|p| (p, origin))
            .collect()
    }

    fn executables_in_home(&self, home: &Path) -> Vec<PathBuf> {
        let exe = self.platform.java_executable();
        let mut paths = vec![home.join("bin").join(exe)];
        if self.platform.os == OsKind::MacOs {
            paths.push(home.join("Contents").join("Home").join("bin").join(exe));
            // Homebrew kegs keep the JDK bundle one level deeper.
            paths.push(
                home.join("libexec")
                    .join("openjdk.jdk")
                    .join("Contents")
                    .join("Home")
                    .join("bin")
                    .join(exe),
            );
        }
        paths
    }
}

fn looks_like_java_home(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    VENDOR_HINTS.iter().any(|hint| name.contains(hint))
}

/// Exact major first; otherwise the smallest major above `required`.
///
/// Among equal majors the earliest candidate wins, so bundled runtimes are
/// preferred over system ones of the same version.
pub fn select_runtime(
    candidates: &[JavaInstallation],
    required: u32,
) -> LauncherResult<&JavaInstallation> {
    if candidates.is_empty() {
        return Err(LauncherError::RuntimeNotFound { required });
    }

    candidates
        .iter()
        .find(|c| c.major_version == required)
        .or_else(|| {
            candidates
                .iter()
                .filter(|c| c.major_version > required)
                .min_by_key(|c| c.major_version)
        })
        .ok_or_else(|| {
            let mut available: Vec<u32> = candidates.iter().map(|c| c.major_version).collect();
            available.sort_unstable();
            available.dedup();
            LauncherError::RuntimeIncompatible {
                required,
                available,
            }
        })
}
