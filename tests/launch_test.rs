#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{manifest_json, sha1_hex, start_server, FileHost};
use launcher_core::core::events::LaunchState;
use launcher_core::{
    LaunchEvent, LaunchOptions, LaunchOrchestrator, LauncherConfig, LauncherError,
    MemoryPreferences, Platform, StaticAccountProvider,
};

const CLIENT: &[u8] = b"not really a jar";
const LIBRARY: &[u8] = b"library bytes";
const ASSET: &[u8] = b"a sound";

/// Publish a one-version manifest whose descriptor needs Java 17.
fn publish(host: &FileHost, base: &str) {
    host.put("/manifest.json", manifest_json(base, "1.12.2", &["1.12.2"]));
    host.put(
        "/versions/1.12.2.json",
        serde_json::json!({
            "id": "1.12.2",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "javaVersion": {"majorVersion": 17},
            "minecraftArguments": "--username ${auth_player_name} --version ${version_name} --gameDir ${game_directory} --assetsDir ${assets_root} --assetIndex ${assets_index_name} --uuid ${auth_uuid} --accessToken ${auth_access_token} --userType ${user_type} --tweakClass ${unknown_thing}",
            "assetIndex": {"id": "1.12", "url": format!("{base}/indexes/1.12.json")},
            "downloads": {"client": {
                "url": format!("{base}/client.jar"),
                "size": CLIENT.len(),
                "sha1": sha1_hex(CLIENT)
            }},
            "libraries": [{"name": "com.example:lib:1.0"}]
        })
        .to_string(),
    );
    host.put("/client.jar", CLIENT.to_vec());
    host.put("/maven/com/example/lib/1.0/lib-1.0.jar", LIBRARY.to_vec());

    let hash = sha1_hex(ASSET);
    host.put(
        "/indexes/1.12.json",
        serde_json::json!({"objects": {"sounds/a.ogg": {"hash": hash, "size": ASSET.len()}}})
            .to_string(),
    );
    host.put(&format!("/objects/{}/{}", &hash[..2], hash), ASSET.to_vec());
}

/// A shell script that answers the version probe as `version` and otherwise
/// records its arguments next to itself and exits with 7.
fn fake_java(dir: &Path, version: &str) -> PathBuf {
    let bin = dir.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let script = bin.join("java");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"-XshowSettings:properties\" ]; then\n\
             \techo 'openjdk version \"{version}\" 2023-10-17' >&2\n\
             \texit 0\n\
             fi\n\
             printf '%s\\n' \"$@\" > \"$(dirname \"$0\")/args.txt\"\n\
             exit 7\n"
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn config(base: &str, root: &Path, bundled: Option<PathBuf>) -> LauncherConfig {
    LauncherConfig {
        manifest_url: format!("{base}/manifest.json"),
        asset_base_url: format!("{base}/objects"),
        library_mirrors: vec![format!("{base}/maven")],
        bundled_runtime_dir: bundled,
        scan_system_runtimes: false,
        ..LauncherConfig::with_root(root)
    }
}

#[tokio::test]
async fn launches_with_bundled_runtime_and_reports_exit_code() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    publish(&host, &base);

    let dir = tempfile::tempdir().unwrap();
    let bundled = dir.path().join("runtime");
    let java = fake_java(
        &bundled.join(Platform::current().bundled_runtime_folder()),
        "17.0.9",
    );

    let mut orchestrator = LaunchOrchestrator::new(
        config(&base, &dir.path().join("game"), Some(bundled)),
        Arc::new(MemoryPreferences::default()),
        Arc::new(StaticAccountProvider::offline("Steve")),
    )
    .unwrap();
    let mut rx = orchestrator.subscribe();

    let options = LaunchOptions {
        memory_mb: Some(1024),
        ..LaunchOptions::default()
    };
    let exit_code = orchestrator.launch(&options).await.unwrap();
    assert_eq!(exit_code, 7);
    assert_eq!(orchestrator.state(), LaunchState::Closed);
    assert_eq!(orchestrator.events().current_progress(), 100);

    let mut states = Vec::new();
    let mut closed = None;
    let mut started = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            LaunchEvent::StateChanged { state } => states.push(state),
            LaunchEvent::Started { .. } => started = true,
            LaunchEvent::Closed { exit_code } => closed = Some(exit_code),
            _ => {}
        }
    }
    assert!(started);
    assert_eq!(closed, Some(7));
    assert_eq!(states.first(), Some(&LaunchState::ResolvingManifest));
    assert_eq!(states.last(), Some(&LaunchState::Closed));
    assert!(!states.contains(&LaunchState::Error));

    let args = std::fs::read_to_string(java.parent().unwrap().join("args.txt")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args[0], "-Xmx1024M");
    assert_eq!(args[1], "-Xms512M");
    assert!(args[2].starts_with("-Djava.library.path="));

    let cp = args.iter().position(|a| *a == "-cp").unwrap();
    let classpath: Vec<&str> = args[cp + 1].split(':').collect();
    assert_eq!(classpath.len(), 2);
    assert!(classpath[0].ends_with("1.12.2.jar"));
    assert!(classpath[1].ends_with("lib-1.0.jar"));
    assert_eq!(args[cp + 2], "net.minecraft.client.main.Main");

    let game = &args[cp + 3..];
    assert_eq!(&game[..2], &["--username", "Steve"]);
    assert!(game.windows(2).any(|w| w == ["--userType", "legacy"]));
    assert!(!game.contains(&"--tweakClass"));
    assert!(!game.iter().any(|a| a.contains("${")));

    // Everything landed in the cache.
    let root = dir.path().join("game");
    assert!(root.join("versions/1.12.2/1.12.2.jar").is_file());
    assert!(root.join("libraries/com/example/lib/1.0/lib-1.0.jar").is_file());
    assert!(root.join("assets/indexes/1.12.json").is_file());
}

#[tokio::test]
async fn too_old_override_without_alternatives_is_incompatible() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    publish(&host, &base);

    let dir = tempfile::tempdir().unwrap();
    let java = fake_java(&dir.path().join("jdk8"), "1.8.0_392");

    let mut orchestrator = LaunchOrchestrator::new(
        config(&base, &dir.path().join("game"), None),
        Arc::new(MemoryPreferences::default()),
        Arc::new(StaticAccountProvider::offline("Steve")),
    )
    .unwrap();
    let mut rx = orchestrator.subscribe();

    let options = LaunchOptions {
        java_path: Some(java),
        ..LaunchOptions::version("1.12.2")
    };
    let err = orchestrator.launch(&options).await.unwrap_err();
    match &err {
        LauncherError::RuntimeIncompatible { required, available } => {
            assert_eq!(*required, 17);
            assert_eq!(available, &vec![8]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.to_string().contains("only Java 8 is installed"));
    assert_eq!(orchestrator.state(), LaunchState::Error);

    let mut warned = false;
    while let Ok(event) = rx.try_recv() {
        if let LaunchEvent::Warning { message } = event {
            warned |= message.contains("version 8");
        }
    }
    assert!(warned);
}

#[tokio::test]
async fn missing_account_stops_before_the_plan() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    publish(&host, &base);

    let dir = tempfile::tempdir().unwrap();
    let java = fake_java(&dir.path().join("jdk17"), "17.0.9");

    let mut orchestrator = LaunchOrchestrator::new(
        config(&base, &dir.path().join("game"), None),
        Arc::new(MemoryPreferences::default()),
        Arc::new(StaticAccountProvider::new(None)),
    )
    .unwrap();

    let options = LaunchOptions {
        java_path: Some(java.clone()),
        ..LaunchOptions::default()
    };
    let err = orchestrator.prepare(&options).await.unwrap_err();
    assert!(matches!(err, LauncherError::AccountMissing));
    assert_eq!(orchestrator.state(), LaunchState::Error);
    assert!(!java.parent().unwrap().join("args.txt").exists());
}
