use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use launcher_core::core::downloader::Downloader;
use launcher_core::core::http::build_http_client;
use launcher_core::core::java::RuntimeDiscovery;
use launcher_core::core::version::ManifestResolver;
use launcher_core::{
    init_tracing, JsonPreferences, LaunchEvent, LaunchOptions, LaunchOrchestrator,
    LauncherConfig, LauncherResult, Platform, PreferencesStore, StaticAccountProvider,
    WindowGeometry,
};

#[derive(Parser)]
#[command(name = "launcher", version, about = "Provision and launch the game client")]
struct Cli {
    /// Launcher config file (JSON). Missing file means defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache root; overrides the config file.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download everything a version needs and run it
    Launch {
        /// Version id; defaults to the remembered one, then the latest release
        #[arg(short, long)]
        version: Option<String>,
        /// Offline player name
        #[arg(short, long)]
        username: Option<String>,
        /// Heap allocation in MB
        #[arg(short, long)]
        memory: Option<u32>,
        /// Use this Java executable when it is recent enough
        #[arg(long)]
        java: Option<PathBuf>,
        #[arg(long, requires = "height")]
        width: Option<u32>,
        #[arg(long, requires = "width")]
        height: Option<u32>,
    },
    /// List released versions from the manifest
    Versions,
    /// List Java runtimes found on this machine
    Java,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> LauncherResult<i32> {
    let config_path = cli
        .config
        .unwrap_or_else(|| LauncherConfig::default().root_dir.join("launcher.json"));
    let mut config = LauncherConfig::load_or_default(&config_path)?;
    if let Some(root) = cli.root {
        config.root_dir = root;
    }

    match cli.command {
        Commands::Launch {
            version,
            username,
            memory,
            java,
            width,
            height,
        } => {
            let preferences = Arc::new(JsonPreferences::open(config.root_dir.join("preferences.json")));
            if let Some(name) = &username {
                preferences.set_username(name)?;
            }
            if let Some(id) = &version {
                preferences.set_selected_version(id)?;
            }
            let player = username
                .or_else(|| preferences.username())
                .unwrap_or_else(|| "Player".to_string());

            let options = LaunchOptions {
                version_id: version,
                memory_mb: memory,
                java_path: java,
                window: width.zip(height).map(|(width, height)| WindowGeometry { width, height }),
            };

            let mut orchestrator = LaunchOrchestrator::new(
                config,
                preferences,
                Arc::new(StaticAccountProvider::offline(&player)),
            )?;
            let logger = tokio::spawn(log_events(orchestrator.subscribe()));
            let result = orchestrator.launch(&options).await;

            // Dropping the orchestrator closes the stream; the logger drains what is left.
            drop(orchestrator);
            if let Err(e) = logger.await {
                warn!("Event logger stopped: {}", e);
            }
            result
        }
        Commands::Versions => {
            let resolver = ManifestResolver::new(
                Downloader::new(build_http_client()?),
                &config.manifest_url,
            );
            let manifest = resolver.fetch_manifest().await?;
            for entry in manifest.releases() {
                println!("{}\t{}", entry.id, entry.release_time.format("%Y-%m-%d"));
            }
            Ok(0)
        }
        Commands::Java => {
            let found = RuntimeDiscovery::new(Platform::current(), &config)
                .discover()
                .await;
            for java in found {
                println!(
                    "{}\t{}\t{:?}\t{}",
                    java.major_version,
                    java.vendor,
                    java.origin,
                    java.executable_path.display()
                );
            }
            Ok(0)
        }
    }
}

/// Log launch events until the bus closes. Returns how many were logged.
async fn log_events(mut events: broadcast::Receiver<LaunchEvent>) -> usize {
    let mut logged = 0;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event log fell behind; {} event(s) skipped", skipped);
                continue;
            }
            Err(RecvError::Closed) => return logged,
        };
        match event {
            LaunchEvent::StateChanged { state } => info!("State: {:?}", state),
            LaunchEvent::Progress { value } => info!("Progress: {}%", value),
            LaunchEvent::Warning { message } => warn!("{}", message),
            LaunchEvent::Started { pid } => info!("Game started (pid {:?})", pid),
            LaunchEvent::Closed { exit_code } => info!("Game closed ({})", exit_code),
        }
        logged += 1;
    }
}
