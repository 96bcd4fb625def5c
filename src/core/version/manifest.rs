// ─── Version Manifest ───
// Handles fetching and parsing the version manifest v2, and resolving one
// version's descriptor from it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};

use super::version_file::VersionDescriptor;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level version manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    #[serde(default)]
    pub snapshot: Option<String>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    pub release_time: DateTime<Utc>,
    /// Where the full descriptor lives.
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
}

impl VersionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionKind::Release => "release",
            VersionKind::Snapshot => "snapshot",
            VersionKind::OldBeta => "old_beta",
            VersionKind::OldAlpha => "old_alpha",
        }
    }
}

impl VersionManifest {
    /// Parse a manifest body, rejecting duplicate version ids.
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        let manifest: VersionManifest = serde_json::from_str(raw)
            .map_err(|e| LauncherError::Manifest(format!("version manifest: {e}")))?;

        let mut seen = HashSet::new();
        if let Some(dup) = manifest.versions.iter().find(|v| !seen.insert(v.id.as_str())) {
            return Err(LauncherError::Manifest(format!(
                "version manifest lists {} more than once",
                dup.id
            )));
        }
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionSummary> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// All stable releases, in manifest order.
    pub fn releases(&self) -> Vec<&VersionSummary> {
        self.versions
            .iter()
            .filter(|v| v.kind == VersionKind::Release)
            .collect()
    }
}

/// Fetches the manifest and a version's descriptor. Always fresh, no retry.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    downloader: Downloader,
    manifest_url: String,
}

impl ManifestResolver {
    pub fn new(downloader: Downloader, manifest_url: impl Into<String>) -> Self {
        Self {
            downloader,
            manifest_url: manifest_url.into(),
        }
    }

    pub async fn fetch_manifest(&self) -> LauncherResult<VersionManifest> {
        info!("Fetching version manifest...");
        let raw = self
            .downloader
            .fetch_text(&self.manifest_url)
            .await
            .map_err(|e| LauncherError::Manifest(e.to_string()))?;
        let manifest = VersionManifest::parse(&raw)?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Resolve `version_id`, or the latest release when none is requested.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        version_id: Option<&str>,
    ) -> LauncherResult<(VersionSummary, VersionDescriptor)> {
        let manifest = self.fetch_manifest().await?;
        let id = version_id.unwrap_or(&manifest.latest.release);

        let summary = manifest
            .find_version(id)
            .cloned()
            .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))?;

        let raw = self
            .downloader
            .fetch_text(&summary.url)
            .await
            .map_err(|e| LauncherError::Manifest(e.to_string()))?;
        let descriptor = VersionDescriptor::parse(&raw)?;

        info!("Resolved version {} ({})", descriptor.id, summary.kind.as_str());
        Ok((summary, descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "latest": {"release": "1.20.4", "snapshot": "24w03a"},
        "versions": [
            {"id": "24w03a", "type": "snapshot", "url": "https://example.com/24w03a.json", "releaseTime": "2024-01-17T12:00:00+00:00", "sha1": "aa"},
            {"id": "1.20.4", "type": "release", "url": "https://example.com/1.20.4.json", "releaseTime": "2023-12-07T08:00:00+00:00"},
            {"id": "b1.7.3", "type": "old_beta", "url": "https://example.com/b1.7.3.json", "releaseTime": "2011-07-08T00:00:00+00:00"}
        ]
    }"#;

    #[test]
    fn deserialize_manifest() {
        let manifest = VersionManifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.latest.release, "1.20.4");
        assert_eq!(manifest.versions.len(), 3);

        let entry = manifest.find_version("1.20.4").unwrap();
        assert_eq!(entry.kind, VersionKind::Release);
        assert_eq!(entry.release_time.to_rfc3339(), "2023-12-07T08:00:00+00:00");
        assert!(manifest.find_version("9.9.9").is_none());
    }

    #[test]
    fn releases_skip_snapshots_and_betas() {
        let manifest = VersionManifest::parse(MANIFEST).unwrap();
        let ids: Vec<_> = manifest.releases().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1.20.4"]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"{
            "latest": {"release": "1.0"},
            "versions": [
                {"id": "1.0", "type": "release", "url": "a", "releaseTime": "2011-11-18T00:00:00+00:00"},
                {"id": "1.0", "type": "release", "url": "b", "releaseTime": "2011-11-18T00:00:00+00:00"}
            ]
        }"#;
        let err = VersionManifest::parse(raw).unwrap_err();
        assert!(matches!(err, LauncherError::Manifest(msg) if msg.contains("1.0")));
    }

    #[test]
    fn malformed_manifest_is_a_manifest_error() {
        assert!(matches!(
            VersionManifest::parse("{\"versions\": 3}"),
            Err(LauncherError::Manifest(_))
        ));
    }
}
