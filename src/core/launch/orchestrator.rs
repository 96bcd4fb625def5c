// ─── Launch Orchestrator ───
// Sequences manifest → client jar → libraries → assets → natives → runtime
// → plan → process, publishing state and progress as it goes.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use crate::core::assets::AssetSynchronizer;
use crate::core::auth::{Account, AccountProvider};
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventBus, LaunchEvent, LaunchState, LaunchStateMachine, ProgressSpan};
use crate::core::http::build_http_client;
use crate::core::java::{probe_java, JavaInstallation, RuntimeDiscovery, RuntimeOrigin};
use crate::core::libraries::DependencyDownloader;
use crate::core::platform::Platform;
use crate::core::state::{
    CacheLayout, LaunchOptions, LauncherConfig, PreferencesStore, DEFAULT_MEMORY_MB,
};
use crate::core::version::{ManifestResolver, VersionDescriptor};

use super::arguments::{build_argument_vector, ArgumentContext};
use super::classpath::{build_classpath, join_classpath};
use super::natives::NativeExtractor;
use super::task::{spawn_game, LaunchPlan};

/// Free space below this on the cache volume is reported before downloading.
const LOW_DISK_WARNING_BYTES: u64 = 512 * 1024 * 1024;

pub struct LaunchOrchestrator {
    config: LauncherConfig,
    platform: Platform,
    downloader: Downloader,
    preferences: Arc<dyn PreferencesStore>,
    accounts: Arc<dyn AccountProvider>,
    events: EventBus,
    machine: LaunchStateMachine,
}

impl LaunchOrchestrator {
    pub fn new(
        config: LauncherConfig,
        preferences: Arc<dyn PreferencesStore>,
        accounts: Arc<dyn AccountProvider>,
    ) -> LauncherResult<Self> {
        Ok(Self {
            config,
            platform: Platform::current(),
            downloader: Downloader::new(build_http_client()?),
            preferences,
            accounts,
            events: EventBus::new(),
            machine: LaunchStateMachine::default(),
        })
    }

    /// Resolve rules and paths as if running on `platform`.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LaunchEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> LaunchState {
        self.machine.state()
    }

    /// Provision everything and build the launch plan without spawning.
    pub async fn prepare(&mut self, options: &LaunchOptions) -> LauncherResult<LaunchPlan> {
        self.machine.reset();
        self.events.reset_progress();

        match self.prepare_inner(options).await {
            Ok(plan) => Ok(plan),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Prepare, spawn, and wait for the game. Returns its exit code.
    pub async fn launch(&mut self, options: &LaunchOptions) -> LauncherResult<i32> {
        let plan = self.prepare(options).await?;
        match self.run(&plan).await {
            Ok(code) => Ok(code),
            Err(err) => Err(self.fail(err)),
        }
    }

    #[instrument(skip_all, fields(version = ?options.version_id))]
    async fn prepare_inner(&mut self, options: &LaunchOptions) -> LauncherResult<LaunchPlan> {
        // ── Manifest ──
        self.enter(LaunchState::ResolvingManifest)?;
        let layout = CacheLayout::initialize(&self.config.root_dir)?;
        self.check_disk_space(layout.root());

        let version_id = options
            .version_id
            .clone()
            .or_else(|| self.preferences.selected_version());
        let resolver = ManifestResolver::new(self.downloader.clone(), &self.config.manifest_url);
        let (summary, descriptor) = resolver.resolve(version_id.as_deref()).await?;
        self.events.phase(ProgressSpan::MANIFEST).finish();

        // ── Client jar ──
        self.enter(LaunchState::FetchingClientJar)?;
        let version_dir = layout.version_dir(&descriptor.id);
        tokio::fs::create_dir_all(&version_dir)
            .await
            .map_err(|e| LauncherError::io(&version_dir, e))?;
        let dependencies = DependencyDownloader::new(
            self.downloader.clone(),
            layout.libraries_dir(),
            self.platform,
            self.config.library_mirrors.clone(),
        );
        dependencies
            .fetch_client_jar(
                &descriptor,
                &layout.version_jar(&descriptor.id),
                &self.events.phase(ProgressSpan::CLIENT_JAR),
            )
            .await?;

        // ── Libraries ──
        self.enter(LaunchState::FetchingLibraries)?;
        dependencies
            .fetch_libraries(&descriptor, &self.events.phase(ProgressSpan::LIBRARIES))
            .await?;

        // ── Assets ──
        self.enter(LaunchState::FetchingAssets)?;
        let assets = AssetSynchronizer::new(
            self.downloader.clone(),
            layout.clone(),
            &self.config.asset_base_url,
            self.config.assets.clone(),
        );
        let report = assets
            .sync(&descriptor.asset_index, &self.events.phase(ProgressSpan::ASSETS))
            .await?;
        if !report.failed.is_empty() {
            warn!(
                "{} of {} asset objects are missing; continuing",
                report.failed.len(),
                report.total
            );
        }

        // ── Natives ──
        self.enter(LaunchState::ExtractingNatives)?;
        NativeExtractor::new(self.platform, layout.libraries_dir(), layout.natives_dir())
            .extract(&descriptor, &self.events)
            .await?;

        // ── Runtime ──
        self.enter(LaunchState::DiscoveringRuntime)?;
        let required = descriptor.required_java_major();
        let runtime = self.select_runtime(options, required).await?;

        let account = self
            .accounts
            .selected_account()
            .await
            .ok_or(LauncherError::AccountMissing)?;

        // ── Plan ──
        self.enter(LaunchState::BuildingPlan)?;
        let plan = self.build_plan(
            &layout,
            &descriptor,
            summary.kind.as_str(),
            runtime,
            &account,
            options,
        );
        info!(
            "Launch plan ready: {} classpath entries, {} arguments",
            plan.classpath.len(),
            plan.argument_vector.len()
        );
        Ok(plan)
    }

    fn build_plan(
        &self,
        layout: &CacheLayout,
        descriptor: &VersionDescriptor,
        version_type: &str,
        runtime: JavaInstallation,
        account: &Account,
        options: &LaunchOptions,
    ) -> LaunchPlan {
        let classpath = build_classpath(layout, descriptor, &self.platform);
        let memory_mb = options
            .memory_mb
            .or_else(|| self.preferences.memory_mb())
            .unwrap_or(DEFAULT_MEMORY_MB);
        let window = options.window.or_else(|| self.preferences.window());

        let ctx = ArgumentContext {
            account,
            platform: self.platform,
            version_type,
            game_dir: layout.game_dir().to_path_buf(),
            assets_root: layout.assets_dir(),
            libraries_dir: layout.libraries_dir(),
            natives_dir: layout.natives_dir(),
            classpath: join_classpath(&classpath, &self.platform),
            memory_mb,
            window,
            launcher_name: &self.config.launcher_name,
            launcher_version: &self.config.launcher_version,
        };
        let argument_vector = build_argument_vector(descriptor, &ctx);

        LaunchPlan {
            classpath,
            runtime,
            argument_vector,
            working_dir: layout.game_dir().to_path_buf(),
            natives_dir: layout.natives_dir(),
        }
    }

    /// An explicit runtime is used when it probes to a good enough major;
    /// otherwise discovery decides. A too-old override still counts as an
    /// installation that was found.
    async fn select_runtime(
        &self,
        options: &LaunchOptions,
        required: u32,
    ) -> LauncherResult<JavaInstallation> {
        let discovery = RuntimeDiscovery::new(self.platform, &self.config);
        let mut rejected = None;

        if let Some(path) = &options.java_path {
            match probe_java(path, RuntimeOrigin::Override, discovery.probe_timeout()).await {
                Some(java) if java.major_version >= required => {
                    info!("Using configured Java {} at {:?}", java.major_version, path);
                    return Ok(java);
                }
                Some(java) => {
                    let message = format!(
                        "Configured Java at {:?} is version {}, but {} is required; searching for another",
                        path, java.major_version, required
                    );
                    warn!("{}", message);
                    self.events.warn(message);
                    rejected = Some(java);
                }
                None => {
                    let message = format!("Configured Java at {:?} could not be run; searching for another", path);
                    warn!("{}", message);
                    self.events.warn(message);
                }
            }
        }

        discovery.resolve_including(required, rejected).await
    }

    async fn run(&mut self, plan: &LaunchPlan) -> LauncherResult<i32> {
        self.enter(LaunchState::Launching)?;
        let mut child = spawn_game(plan, &self.platform)?;

        self.enter(LaunchState::Running)?;
        self.events.publish(LaunchEvent::Started { pid: child.id() });

        let status = child
            .wait()
            .await
            .map_err(|e| LauncherError::spawn(&plan.runtime.executable_path, e))?;
        let exit_code = status.code().unwrap_or(-1);
        info!("Game exited with code {}", exit_code);

        self.enter(LaunchState::Closed)?;
        self.events.publish(LaunchEvent::Closed { exit_code });
        Ok(exit_code)
    }

    fn enter(&mut self, state: LaunchState) -> LauncherResult<()> {
        self.machine.advance(state)?;
        self.events.publish(LaunchEvent::StateChanged { state });
        Ok(())
    }

    fn fail(&mut self, err: LauncherError) -> LauncherError {
        error!("Launch failed in {:?}: {}", self.machine.state(), err);
        let state = self.machine.fail();
        self.events.publish(LaunchEvent::StateChanged { state });
        err
    }

    fn check_disk_space(&self, root: &Path) {
        if let Some(available) = available_space(root) {
            if available < LOW_DISK_WARNING_BYTES {
                let message = format!(
                    "Only {} MiB free at {:?}; downloads may fail",
                    available / (1024 * 1024),
                    root
                );
                warn!("{}", message);
                self.events.warn(message);
            }
        }
    }
}

/// Free bytes on the volume holding `path`, from the longest matching mount point.
fn available_space(path: &Path) -> Option<u64> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    disks
        .list()
        .iter()
        .filter(|disk| canonical.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::StaticAccountProvider;
    use crate::core::state::MemoryPreferences;

    #[tokio::test]
    async fn unreachable_manifest_fails_into_error_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = LauncherConfig {
            manifest_url: "http://127.0.0.1:9/version_manifest_v2.json".into(),
            ..LauncherConfig::with_root(dir.path())
        };
        let mut orchestrator = LaunchOrchestrator::new(
            config,
            Arc::new(MemoryPreferences::default()),
            Arc::new(StaticAccountProvider::offline("Steve")),
        )
        .unwrap();
        let mut rx = orchestrator.subscribe();

        let err = orchestrator.prepare(&LaunchOptions::version("1.20.4")).await.unwrap_err();
        assert!(matches!(err, LauncherError::Manifest(_)));
        assert_eq!(orchestrator.state(), LaunchState::Error);

        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let LaunchEvent::StateChanged { state } = event {
                states.push(state);
            }
        }
        assert_eq!(states.first(), Some(&LaunchState::ResolvingManifest));
        assert_eq!(states.last(), Some(&LaunchState::Error));

        // The cache skeleton exists even though the launch failed.
        assert!(dir.path().join("assets").join("objects").is_dir());
    }
}
