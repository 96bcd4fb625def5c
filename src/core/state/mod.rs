pub mod config;
pub mod layout;
pub mod preferences;

pub use config::{
    AssetSyncPolicy, LaunchOptions, LauncherConfig, WindowGeometry, APP_DIR_NAME,
    DEFAULT_MEMORY_MB,
};
pub use layout::CacheLayout;
pub use preferences::{JsonPreferences, MemoryPreferences, Preferences, PreferencesStore};
