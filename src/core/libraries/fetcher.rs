// ─── Dependency Downloader ───
// Fetches the client jar and every rule-eligible library (plus its native
// classifier) into the coordinate-addressed libraries tree.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::core::downloader::{Downloader, FileCheck};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::PhaseProgress;
use crate::core::platform::Platform;
use crate::core::version::{ArtifactDownload, VersionDescriptor};

/// Outcome of a library pass. Missing artifacts are not fatal here; they
/// surface later as absent classpath entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryReport {
    pub fetched: usize,
    pub cached: usize,
    pub missing: Vec<String>,
}

/// One file to make present on disk.
#[derive(Debug)]
struct LibraryJob {
    label: String,
    dest: PathBuf,
    sources: Vec<String>,
    size: Option<u64>,
    sha1: Option<String>,
}

impl LibraryJob {
    fn from_download(
        label: String,
        dest: PathBuf,
        sources: Vec<String>,
        download: Option<&ArtifactDownload>,
    ) -> Self {
        Self {
            label,
            dest,
            sources,
            size: download.and_then(|d| d.size),
            sha1: download.and_then(|d| d.sha1.clone()),
        }
    }

    fn check(&self) -> FileCheck<'_> {
        FileCheck::new(self.size, self.sha1.as_deref())
    }
}

pub struct DependencyDownloader {
    downloader: Downloader,
    libraries_dir: PathBuf,
    platform: Platform,
    mirrors: Vec<String>,
}

impl DependencyDownloader {
    pub fn new(
        downloader: Downloader,
        libraries_dir: impl Into<PathBuf>,
        platform: Platform,
        mirrors: Vec<String>,
    ) -> Self {
        Self {
            downloader,
            libraries_dir: libraries_dir.into(),
            platform,
            mirrors,
        }
    }

    /// Download the client jar unless a usable copy is already on disk.
    /// Any failure here is fatal.
    #[instrument(skip_all, fields(version = %descriptor.id))]
    pub async fn fetch_client_jar(
        &self,
        descriptor: &VersionDescriptor,
        dest: &Path,
        progress: &PhaseProgress,
    ) -> LauncherResult<()> {
        let client = descriptor.client.as_ref().ok_or_else(|| {
            LauncherError::Manifest(format!("version {} has no client download", descriptor.id))
        })?;
        let check = FileCheck::new(client.size, client.sha1.as_deref());

        if Downloader::is_cached(dest, check).await {
            debug!("Client jar already present: {:?}", dest);
        } else {
            info!("Downloading client jar for {}", descriptor.id);
            self.downloader.download_file(&client.url, dest, check).await?;
        }

        progress.finish();
        Ok(())
    }

    /// Fetch every library the rules allow here. Libraries go one at a
    /// time; sources within a library are tried in order.
    #[instrument(skip_all, fields(version = %descriptor.id))]
    pub async fn fetch_libraries(
        &self,
        descriptor: &VersionDescriptor,
        progress: &PhaseProgress,
    ) -> LauncherResult<LibraryReport> {
        let jobs = self.plan(descriptor);
        let total = jobs.len();
        let mut report = LibraryReport::default();

        for (done, job) in jobs.iter().enumerate() {
            if Downloader::is_cached(&job.dest, job.check()).await {
                report.cached += 1;
            } else {
                match self
                    .downloader
                    .download_first(&job.sources, &job.dest, job.check())
                    .await
                {
                    Ok(url) => {
                        debug!("Fetched {} from {}", job.label, url);
                        report.fetched += 1;
                    }
                    Err(e) => {
                        warn!("Library {} is missing: {}", job.label, e);
                        progress.warn(format!("Library {} could not be downloaded", job.label));
                        report.missing.push(job.label.clone());
                    }
                }
            }
            progress.report(done + 1, total);
        }

        progress.finish();
        info!(
            "Libraries: {} fetched, {} cached, {} missing",
            report.fetched,
            report.cached,
            report.missing.len()
        );
        Ok(report)
    }

    fn plan(&self, descriptor: &VersionDescriptor) -> Vec<LibraryJob> {
        let mut jobs = Vec::new();

        for lib in &descriptor.libraries {
            if !lib.is_allowed(&self.platform) {
                debug!("Skipping library (rules): {}", lib.name);
                continue;
            }

            if let Some(path) = lib.artifact_path() {
                jobs.push(LibraryJob::from_download(
                    lib.name.clone(),
                    self.libraries_dir.join(path),
                    lib.artifact_sources(&self.mirrors),
                    lib.main_download(),
                ));
            }

            if let Some(native) = lib.native_artifact(&self.platform) {
                jobs.push(LibraryJob::from_download(
                    format!("{}:{}", lib.name, native.classifier),
                    self.libraries_dir.join(&native.path),
                    native.sources(lib.url.as_deref(), &self.mirrors),
                    native.download.as_ref(),
                ));
            }
        }

        jobs
    }
}
