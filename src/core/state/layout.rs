use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

/// The on-disk cache tree shared by every launch:
///
/// ```text
/// <root>/versions/<id>/<id>.jar
/// <root>/libraries/<maven path>
/// <root>/assets/indexes/<index id>.json
/// <root>/assets/objects/<2 hex>/<hash>
/// <root>/natives/            (rebuilt every launch)
/// ```
///
/// There is no locking: two launches sharing a root can corrupt each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Path bookkeeping only; call [`CacheLayout::initialize`] before use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory skeleton under `root`.
    pub fn initialize(root: impl Into<PathBuf>) -> LauncherResult<Self> {
        let layout = Self::new(root);
        for dir in [
            layout.root.clone(),
            layout.versions_dir(),
            layout.libraries_dir(),
            layout.asset_indexes_dir(),
            layout.asset_objects_dir(),
            layout.natives_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|source| LauncherError::io(&dir, source))?;
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The game's working directory.
    pub fn game_dir(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id)
    }

    pub fn version_jar(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.jar"))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_indexes_dir(&self) -> PathBuf {
        self.assets_dir().join("indexes")
    }

    pub fn asset_index(&self, index_id: &str) -> PathBuf {
        self.asset_indexes_dir().join(format!("{index_id}.json"))
    }

    pub fn asset_objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }

    /// `objects/<first two hex chars>/<hash>`
    pub fn asset_object(&self, hash: &str) -> PathBuf {
        let prefix = hash.get(..2).unwrap_or(hash);
        self.asset_objects_dir().join(prefix).join(hash)
    }

    pub fn natives_dir(&self) -> PathBuf {
        self.root.join("natives")
    }
}
