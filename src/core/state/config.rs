use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::assets::RESOURCES_URL;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::{MAVEN_CENTRAL, MOJANG_LIBRARIES};
use crate::core::version::VERSION_MANIFEST_URL;

pub const APP_DIR_NAME: &str = "InterfaceOficial";
pub const DEFAULT_MEMORY_MB: u32 = 2048;

/// Tuning for the asset synchronizer.
///
/// `batch_width` and `failure_threshold` default to the values the launcher
/// has always shipped with (10 objects per batch, abort above 10% failures).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSyncPolicy {
    pub batch_width: usize,
    /// Fraction of objects allowed to fail before the sync is fatal.
    pub failure_threshold: f64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for AssetSyncPolicy {
    fn default() -> Self {
        Self {
            batch_width: 10,
            failure_threshold: 0.10,
            max_attempts: 3,
            backoff_base_ms: 250,
        }
    }
}

impl AssetSyncPolicy {
    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    pub fn exceeds_threshold(&self, failed: usize, total: usize) -> bool {
        total > 0 && failed as f64 > total as f64 * self.failure_threshold
    }
}

/// Process-wide launcher configuration. Every field has a default, so a
/// partial JSON file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Root of the `versions/`, `libraries/`, `assets/`, `natives/` tree.
    pub root_dir: PathBuf,
    pub manifest_url: String,
    pub asset_base_url: String,
    /// Tried in order when a library has no explicit URL or it fails.
    pub library_mirrors: Vec<String>,
    /// JREs shipped alongside the launcher, if any.
    pub bundled_runtime_dir: Option<PathBuf>,
    /// When false only the bundled directory and explicit overrides are probed.
    pub scan_system_runtimes: bool,
    pub java_probe_timeout_ms: u64,
    pub assets: AssetSyncPolicy,
    pub launcher_name: String,
    pub launcher_version: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            root_dir: default_data_dir(),
            manifest_url: VERSION_MANIFEST_URL.to_string(),
            asset_base_url: RESOURCES_URL.to_string(),
            library_mirrors: vec![MOJANG_LIBRARIES.to_string(), MAVEN_CENTRAL.to_string()],
            bundled_runtime_dir: default_bundled_runtime_dir(),
            scan_system_runtimes: true,
            java_probe_timeout_ms: 5_000,
            assets: AssetSyncPolicy::default(),
            launcher_name: APP_DIR_NAME.to_string(),
            launcher_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl LauncherConfig {
    /// Configuration rooted at `root_dir`, everything else default.
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file; a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> LauncherResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => return Err(LauncherError::io(path, source)),
        };
        let config: LauncherConfig = serde_json::from_str(&raw)?;
        if config.library_mirrors.is_empty() {
            warn!("Config {:?} lists no library mirrors", path);
        }
        Ok(config)
    }

    pub fn java_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.java_probe_timeout_ms)
    }
}

/// Window size handed to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub width: u32,
    pub height: u32,
}

/// Per-launch request. Unset fields fall back to the preferences store.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// `None` launches the manifest's latest release.
    pub version_id: Option<String>,
    pub memory_mb: Option<u32>,
    /// Probe this runtime before running discovery.
    pub java_path: Option<PathBuf>,
    pub window: Option<WindowGeometry>,
}

impl LaunchOptions {
    pub fn version(id: impl Into<String>) -> Self {
        Self {
            version_id: Some(id.into()),
            ..Self::default()
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    default_base_dir().join(APP_DIR_NAME)
}

fn default_bundled_runtime_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("runtime"))
}
