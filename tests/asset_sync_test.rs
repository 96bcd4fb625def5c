mod common;

use common::{sha1_hex, start_server, FileHost};
use launcher_core::core::assets::AssetSynchronizer;
use launcher_core::core::downloader::Downloader;
use launcher_core::core::events::{EventBus, PhaseProgress, ProgressSpan};
use launcher_core::core::state::AssetSyncPolicy;
use launcher_core::core::version::AssetIndexRef;
use launcher_core::{CacheLayout, LauncherError};

struct Objects {
    index: String,
    hashes: Vec<String>,
    bodies: Vec<Vec<u8>>,
}

/// `count` distinct objects plus one extra name pointing at the first hash.
fn objects(count: usize) -> Objects {
    let bodies: Vec<Vec<u8>> = (0..count)
        .map(|i| format!("asset body number {i}").into_bytes())
        .collect();
    let hashes: Vec<String> = bodies.iter().map(|b| sha1_hex(b)).collect();

    let mut map = serde_json::Map::new();
    for (i, (hash, body)) in hashes.iter().zip(&bodies).enumerate() {
        map.insert(
            format!("minecraft/sounds/{i}.ogg"),
            serde_json::json!({"hash": hash, "size": body.len()}),
        );
    }
    map.insert(
        "minecraft/sounds/alias.ogg".into(),
        serde_json::json!({"hash": hashes[0], "size": bodies[0].len()}),
    );

    Objects {
        index: serde_json::json!({ "objects": map }).to_string(),
        hashes,
        bodies,
    }
}

fn object_path(hash: &str) -> String {
    format!("/objects/{}/{}", &hash[..2], hash)
}

/// Serve the index and every object except the first `missing` ones.
fn publish(host: &FileHost, objects: &Objects, missing: usize) {
    host.put("/indexes/1.12.json", objects.index.clone());
    for (hash, body) in objects.hashes.iter().zip(&objects.bodies).skip(missing) {
        host.put(&object_path(hash), body.clone());
    }
}

fn index_ref(base: &str) -> AssetIndexRef {
    serde_json::from_value(serde_json::json!({
        "id": "1.12",
        "url": format!("{base}/indexes/1.12.json")
    }))
    .unwrap()
}

fn synchronizer(base: &str, root: &std::path::Path) -> AssetSynchronizer {
    AssetSynchronizer::new(
        Downloader::new(reqwest::Client::new()),
        CacheLayout::initialize(root).unwrap(),
        format!("{base}/objects"),
        AssetSyncPolicy {
            batch_width: 4,
            failure_threshold: 0.10,
            max_attempts: 2,
            backoff_base_ms: 1,
        },
    )
}

#[tokio::test]
async fn a_few_missing_objects_are_tolerated() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    let objects = objects(20);
    publish(&host, &objects, 1);

    let dir = tempfile::tempdir().unwrap();
    let sync = synchronizer(&base, dir.path());
    let progress = PhaseProgress::detached(ProgressSpan::ASSETS);

    let report = sync.sync(&index_ref(&base), &progress).await.unwrap();
    assert_eq!(report.total, 20);
    assert_eq!(report.fetched, 19);
    assert_eq!(report.failed, vec![objects.hashes[0].clone()]);

    // Retried once, then given up on.
    assert_eq!(host.hits(&object_path(&objects.hashes[0])), 2);

    let layout = CacheLayout::new(dir.path());
    let stored = std::fs::read(layout.asset_object(&objects.hashes[5])).unwrap();
    assert_eq!(stored, objects.bodies[5]);
    assert!(layout.asset_index("1.12").is_file());
}

#[tokio::test]
async fn exactly_the_threshold_still_succeeds() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    let objects = objects(20);
    publish(&host, &objects, 2);

    let dir = tempfile::tempdir().unwrap();
    let report = synchronizer(&base, dir.path())
        .sync(&index_ref(&base), &PhaseProgress::detached(ProgressSpan::ASSETS))
        .await
        .unwrap();
    assert_eq!(report.failed.len(), 2);
}

#[tokio::test]
async fn too_many_missing_objects_fail_the_phase() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    let objects = objects(20);
    publish(&host, &objects, 3);

    let dir = tempfile::tempdir().unwrap();
    let err = synchronizer(&base, dir.path())
        .sync(&index_ref(&base), &PhaseProgress::detached(ProgressSpan::ASSETS))
        .await
        .unwrap_err();
    assert!(matches!(err, LauncherError::AssetSync { failed: 3, total: 20 }));
}

#[tokio::test]
async fn wrong_sized_object_is_retried_discarded_and_reported() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    let objects = objects(20);
    publish(&host, &objects, 0);
    let truncated = objects.hashes[3].clone();
    host.put(&object_path(&truncated), objects.bodies[3][..5].to_vec());

    let dir = tempfile::tempdir().unwrap();
    let report = synchronizer(&base, dir.path())
        .sync(&index_ref(&base), &PhaseProgress::detached(ProgressSpan::ASSETS))
        .await
        .unwrap();

    assert_eq!(report.failed, vec![truncated.clone()]);
    assert_eq!(report.fetched, 19);
    // One request per attempt.
    assert_eq!(host.hits(&object_path(&truncated)), 2);

    let dest = CacheLayout::new(dir.path()).asset_object(&truncated);
    assert!(!dest.exists());
    let mut part = dest.clone().into_os_string();
    part.push(".part");
    assert!(!std::path::PathBuf::from(part).exists());
}

#[tokio::test]
async fn second_sync_downloads_nothing() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    let objects = objects(12);
    publish(&host, &objects, 0);

    let dir = tempfile::tempdir().unwrap();
    let sync = synchronizer(&base, dir.path());
    let progress = PhaseProgress::detached(ProgressSpan::ASSETS);

    let first = sync.sync(&index_ref(&base), &progress).await.unwrap();
    assert_eq!(first.fetched, 12);
    let after_first = host.requests();
    // Index plus one request per unique object; the alias is not fetched twice.
    assert_eq!(after_first, 13);

    let second = sync.sync(&index_ref(&base), &progress).await.unwrap();
    assert_eq!(second.cached, 12);
    assert_eq!(second.fetched, 0);
    assert_eq!(host.requests(), after_first);
}

#[tokio::test]
async fn progress_stays_inside_the_asset_span() {
    let host = FileHost::default();
    let base = start_server(host.clone()).await;
    let objects = objects(8);
    publish(&host, &objects, 0);

    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new();
    let mut rx = bus.subscribe();

    synchronizer(&base, dir.path())
        .sync(&index_ref(&base), &bus.phase(ProgressSpan::ASSETS))
        .await
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let launcher_core::LaunchEvent::Progress { value } = event {
            seen.push(value);
        }
    }
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!(seen.iter().all(|v| (85..=100).contains(v)));
    assert_eq!(bus.current_progress(), 100);
}
