use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// What a downloaded (or cached) file must look like to be accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCheck<'a> {
    pub size: Option<u64>,
    pub sha1: Option<&'a str>,
}

impl<'a> FileCheck<'a> {
    pub fn new(size: Option<u64>, sha1: Option<&'a str>) -> Self {
        Self { size, sha1 }
    }

    pub fn sized(size: u64) -> Self {
        Self {
            size: Some(size),
            sha1: None,
        }
    }
}

/// Streaming downloader with size and SHA-1 validation.
///
/// Bytes land in `<dest>.part` and are renamed into place only after every
/// check passes, so a cached file is never half-written.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // ── Cache check ─────────────────────────────────────

    /// A file is reusable when it exists and its size matches the declared
    /// size. Without a declared size any non-empty file counts.
    pub async fn is_cached(path: &Path, check: FileCheck<'_>) -> bool {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => match check.size {
                Some(expected) => meta.len() == expected,
                None => meta.len() > 0,
            },
            _ => false,
        }
    }

    // ── Single file download ────────────────────────────

    /// Download `url` to `dest`, creating parent directories as needed.
    /// Returns the number of bytes written.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        check: FileCheck<'_>,
    ) -> LauncherResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let part = part_path(dest);
        let written = match write_stream(response, &part).await {
            Ok(written) => written,
            Err(err) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(err);
            }
        };

        if let Err(err) = verify(dest, &written, check) {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(err);
        }

        tokio::fs::rename(&part, dest)
            .await
            .map_err(|e| LauncherError::io(dest, e))?;

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written.len);
        Ok(written.len)
    }

    /// Try each URL in order until one succeeds. Returns the URL that worked.
    pub async fn download_first(
        &self,
        urls: &[String],
        dest: &Path,
        check: FileCheck<'_>,
    ) -> LauncherResult<String> {
        for url in urls {
            match self.download_file(url, dest, check).await {
                Ok(_) => return Ok(url.clone()),
                Err(e) => debug!("Source {} failed for {:?}: {}", url, dest, e),
            }
        }

        Err(LauncherError::ArtifactUnavailable {
            artifact: dest.display().to_string(),
            attempts: urls.len(),
        })
    }

    /// GET `url` and return the body as text, failing on non-2xx.
    pub async fn fetch_text(&self, url: &str) -> LauncherResult<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

struct Written {
    len: u64,
    sha1: String,
}

async fn write_stream(response: reqwest::Response, part: &Path) -> LauncherResult<Written> {
    let mut hasher = Sha1::new();
    let mut len = 0u64;

    // The handle is dropped before the rename; Windows refuses to move open files.
    {
        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| LauncherError::io(part, e))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            len += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|e| LauncherError::io(part, e))?;
        }
        file.flush().await.map_err(|e| LauncherError::io(part, e))?;
    }

    Ok(Written {
        len,
        sha1: hex::encode(hasher.finalize()),
    })
}

fn verify(dest: &Path, written: &Written, check: FileCheck<'_>) -> LauncherResult<()> {
    if let Some(expected) = check.size {
        if written.len != expected {
            return Err(LauncherError::SizeMismatch {
                path: dest.to_path_buf(),
                expected,
                actual: written.len,
            });
        }
    }
    if let Some(expected) = check.sha1 {
        if !written.sha1.eq_ignore_ascii_case(expected) {
            return Err(LauncherError::Sha1Mismatch {
                path: dest.to_path_buf(),
                expected: expected.to_string(),
                actual: written.sha1.clone(),
            });
        }
    }
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cached_file_requires_matching_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.jar");
        std::fs::write(&path, b"12345").unwrap();

        assert!(Downloader::is_cached(&path, FileCheck::sized(5)).await);
        assert!(!Downloader::is_cached(&path, FileCheck::sized(6)).await);
        assert!(Downloader::is_cached(&path, FileCheck::default()).await);
        assert!(!Downloader::is_cached(&dir.path().join("absent"), FileCheck::default()).await);
    }

    #[tokio::test]
    async fn empty_file_without_declared_size_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.jar");
        std::fs::write(&path, b"").unwrap();
        assert!(!Downloader::is_cached(&path, FileCheck::default()).await);
    }

    #[test]
    fn verify_reports_size_before_hash() {
        let written = Written {
            len: 3,
            sha1: "abc".into(),
        };
        let err = verify(Path::new("x"), &written, FileCheck::new(Some(4), Some("def")))
            .unwrap_err();
        assert!(matches!(err, LauncherError::SizeMismatch { expected: 4, actual: 3, .. }));

        let err = verify(Path::new("x"), &written, FileCheck::new(Some(3), Some("def")))
            .unwrap_err();
        assert!(matches!(err, LauncherError::Sha1Mismatch { .. }));
    }

    #[test]
    fn part_file_sits_next_to_destination() {
        assert_eq!(
            part_path(Path::new("/a/b/c.jar")),
            PathBuf::from("/a/b/c.jar.part")
        );
    }
}
