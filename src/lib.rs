pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::auth::{Account, AccountMode, AccountProvider, StaticAccountProvider};
pub use crate::core::error::{LauncherError, LauncherResult, SpawnFailure};
pub use crate::core::events::{EventBus, LaunchEvent, LaunchState};
pub use crate::core::launch::{LaunchOrchestrator, LaunchPlan};
pub use crate::core::platform::Platform;
pub use crate::core::state::{
    CacheLayout, JsonPreferences, LaunchOptions, LauncherConfig, MemoryPreferences,
    PreferencesStore, WindowGeometry,
};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,launcher_core=debug")),
        )
        .init();
}
