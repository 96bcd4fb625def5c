// ─── Asset Synchronizer ───
// Content-addressed object download with batching, retry and a failure budget.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::core::downloader::{Downloader, FileCheck};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::PhaseProgress;
use crate::core::state::{AssetSyncPolicy, CacheLayout};
use crate::core::version::AssetIndexRef;

use super::asset_index::{AssetIndex, AssetObject};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetReport {
    /// Distinct objects referenced by the index.
    pub total: usize,
    pub cached: usize,
    pub fetched: usize,
    /// Hashes that could not be fetched within the retry budget.
    pub failed: Vec<String>,
}

pub struct AssetSynchronizer {
    downloader: Downloader,
    layout: CacheLayout,
    base_url: String,
    policy: AssetSyncPolicy,
}

impl AssetSynchronizer {
    pub fn new(
        downloader: Downloader,
        layout: CacheLayout,
        base_url: impl Into<String>,
        policy: AssetSyncPolicy,
    ) -> Self {
        Self {
            downloader,
            layout,
            base_url: base_url.into(),
            policy,
        }
    }

    /// Make every object of `index_ref` present in the object store.
    ///
    /// Fails with [`LauncherError::AssetSync`] when more than the policy's
    /// share of objects could not be fetched; smaller losses are warnings.
    #[instrument(skip_all, fields(index = %index_ref.id))]
    pub async fn sync(
        &self,
        index_ref: &AssetIndexRef,
        progress: &PhaseProgress,
    ) -> LauncherResult<AssetReport> {
        let index = self.load_index(index_ref).await?;
        let objects = index.unique_objects();

        let mut report = AssetReport {
            total: objects.len(),
            ..AssetReport::default()
        };

        let mut pending = Vec::new();
        for object in objects {
            let path = self.layout.asset_object(&object.hash);
            if Downloader::is_cached(&path, FileCheck::sized(object.size)).await {
                report.cached += 1;
            } else {
                pending.push(object);
            }
        }

        info!(
            "Assets: {} objects, {} cached, {} to download",
            report.total,
            report.cached,
            pending.len()
        );

        let total = report.total;
        let completed = AtomicUsize::new(report.cached);
        let completed = &completed;
        progress.report(report.cached, total);

        // A batch finishes completely before the next one starts.
        for batch in pending.chunks(self.policy.batch_width.max(1)) {
            let results: Vec<_> = stream::iter(batch)
                .map(|object| async move {
                    let result = self.fetch_object(object).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.report(done, total);
                    (object, result)
                })
                .buffer_unordered(batch.len())
                .collect()
                .await;

            for (object, result) in results {
                match result {
                    Ok(()) => report.fetched += 1,
                    Err(e) => {
                        warn!("Asset {} failed: {}", object.hash, e);
                        progress.warn(format!("Asset {} could not be downloaded", object.hash));
                        report.failed.push(object.hash.clone());
                    }
                }
            }
        }

        if self.policy.exceeds_threshold(report.failed.len(), report.total) {
            return Err(LauncherError::AssetSync {
                failed: report.failed.len(),
                total: report.total,
            });
        }

        progress.finish();
        Ok(report)
    }

    /// Read the cached index, downloading it first when absent or empty.
    async fn load_index(&self, index_ref: &AssetIndexRef) -> LauncherResult<AssetIndex> {
        let path = self.layout.asset_index(&index_ref.id);

        if Downloader::is_cached(&path, FileCheck::default()).await {
            debug!("Asset index {} already present", index_ref.id);
        } else {
            let check = FileCheck::new(index_ref.size, index_ref.sha1.as_deref());
            self.downloader
                .download_file(&index_ref.url, &path, check)
                .await?;
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        AssetIndex::parse(&raw)
    }

    /// Download one object, retrying with exponential backoff. A size or
    /// hash mismatch counts as a failed attempt.
    async fn fetch_object(&self, object: &AssetObject) -> LauncherResult<()> {
        let url = object.url(&self.base_url);
        let dest = self.layout.asset_object(&object.hash);
        let check = FileCheck::new(Some(object.size), Some(&object.hash));
        let attempts = self.policy.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.downloader.download_file(&url, &dest, check).await {
                Ok(_) => return Ok(()),
                Err(e) if attempt < attempts => {
                    debug!("Attempt {}/{} for {} failed: {}", attempt, attempts, object.hash, e);
                    tokio::time::sleep(self.policy.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
