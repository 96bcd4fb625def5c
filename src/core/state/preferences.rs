// ─── Preferences ───
// The core reads and writes user preferences only through `PreferencesStore`.
// Backing storage is the host's business; `JsonPreferences` is the file-backed
// store the bundled CLI uses.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::config::WindowGeometry;

pub trait PreferencesStore: Send + Sync {
    fn username(&self) -> Option<String>;
    fn set_username(&self, username: &str) -> LauncherResult<()>;

    fn selected_version(&self) -> Option<String>;
    fn set_selected_version(&self, version_id: &str) -> LauncherResult<()>;

    fn memory_mb(&self) -> Option<u32>;
    fn set_memory_mb(&self, memory_mb: u32) -> LauncherResult<()>;

    fn window(&self) -> Option<WindowGeometry>;
    fn set_window(&self, window: WindowGeometry) -> LauncherResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub username: Option<String>,
    pub selected_version: Option<String>,
    pub memory_mb: Option<u32>,
    pub window: Option<WindowGeometry>,
}

/// Volatile store, handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    inner: Mutex<Preferences>,
}

impl MemoryPreferences {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            inner: Mutex::new(preferences),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Preferences) -> T) -> T {
        match self.inner.lock() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write(&self, f: impl FnOnce(&mut Preferences)) -> LauncherResult<()> {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
        Ok(())
    }
}

impl PreferencesStore for MemoryPreferences {
    fn username(&self) -> Option<String> {
        self.read(|p| p.username.clone())
    }

    fn set_username(&self, username: &str) -> LauncherResult<()> {
        self.write(|p| p.username = Some(username.to_string()))
    }

    fn selected_version(&self) -> Option<String> {
        self.read(|p| p.selected_version.clone())
    }

    fn set_selected_version(&self, version_id: &str) -> LauncherResult<()> {
        self.write(|p| p.selected_version = Some(version_id.to_string()))
    }

    fn memory_mb(&self) -> Option<u32> {
        self.read(|p| p.memory_mb)
    }

    fn set_memory_mb(&self, memory_mb: u32) -> LauncherResult<()> {
        self.write(|p| p.memory_mb = Some(memory_mb))
    }

    fn window(&self) -> Option<WindowGeometry> {
        self.read(|p| p.window)
    }

    fn set_window(&self, window: WindowGeometry) -> LauncherResult<()> {
        self.write(|p| p.window = Some(window))
    }
}

/// Preferences persisted as pretty JSON; every setter rewrites the file.
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    cache: MemoryPreferences,
}

impl JsonPreferences {
    /// Load from `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let preferences = load_from_disk(&path).unwrap_or_default();
        Self {
            path,
            cache: MemoryPreferences::new(preferences),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> LauncherResult<()> {
        let snapshot = self.cache.read(|p| p.clone());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| LauncherError::io(parent, source))?;
        }
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, json).map_err(|source| LauncherError::io(&self.path, source))
    }
}

impl PreferencesStore for JsonPreferences {
    fn username(&self) -> Option<String> {
        self.cache.username()
    }

    fn set_username(&self, username: &str) -> LauncherResult<()> {
        self.cache.set_username(username)?;
        self.save()
    }

    fn selected_version(&self) -> Option<String> {
        self.cache.selected_version()
    }

    fn set_selected_version(&self, version_id: &str) -> LauncherResult<()> {
        self.cache.set_selected_version(version_id)?;
        self.save()
    }

    fn memory_mb(&self) -> Option<u32> {
        self.cache.memory_mb()
    }

    fn set_memory_mb(&self, memory_mb: u32) -> LauncherResult<()> {
        self.cache.set_memory_mb(memory_mb)?;
        self.save()
    }

    fn window(&self) -> Option<WindowGeometry> {
        self.cache.window()
    }

    fn set_window(&self, window: WindowGeometry) -> LauncherResult<()> {
        self.cache.set_window(window)?;
        self.save()
    }
}

fn load_from_disk(path: &Path) -> Option<Preferences> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(preferences) => Some(preferences),
        Err(err) => {
            warn!("Ignoring unreadable preferences {:?}: {}", path, err);
            None
        }
    }
}
