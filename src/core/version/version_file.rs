// ─── Version File ───
// Typed model of a single version's descriptor JSON.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::required_java_for_minecraft_version;
use crate::core::maven::MavenArtifact;
use crate::core::platform::Platform;

use super::manifest::VersionKind;
use super::rules::{rules_allow, Features, Rule};

/// A fully parsed version descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawVersionDescriptor")]
pub struct VersionDescriptor {
    pub id: String,
    pub kind: Option<VersionKind>,
    pub main_class: String,
    pub java_major: Option<u32>,
    pub asset_index: AssetIndexRef,
    pub client: Option<ArtifactDownload>,
    pub libraries: Vec<LibraryEntry>,
    pub arguments: ArgumentSpec,
}

/// How the game's command line is described. Older descriptors carry a
/// single template string, newer ones structured `game`/`jvm` lists.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentSpec {
    Legacy(String),
    Modern { game: Vec<Argument>, jvm: Vec<Argument> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional { rules: Vec<Rule>, value: ArgumentValue },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    One(String),
    Many(Vec<String>),
}

impl Argument {
    /// Tokens this argument contributes on `platform`.
    pub fn resolve(&self, platform: &Platform, features: &Features) -> Vec<String> {
        match self {
            Argument::Plain(arg) => vec![arg.clone()],
            Argument::Conditional { rules, value } => {
                if !rules_allow(rules, platform, features) {
                    return vec![];
                }
                match value {
                    ArgumentValue::One(arg) => vec![arg.clone()],
                    ArgumentValue::Many(args) => args.clone(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

/// A downloadable file. `path` is relative to the libraries directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactDownload {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl ArtifactDownload {
    /// The explicit URL, unless the descriptor left it blank.
    pub fn explicit_url(&self) -> Option<&str> {
        let url = self.url.trim();
        (!url.is_empty()).then_some(url)
    }
}

// ─── Library Entry ───

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LibraryEntry {
    /// Maven coordinate.
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// OS name → classifier, e.g. `"linux" → "natives-linux"`.
    #[serde(default)]
    pub natives: HashMap<String, String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
    /// Repository base for descriptors that predate `downloads`.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<ArtifactDownload>,
    #[serde(default)]
    pub classifiers: HashMap<String, ArtifactDownload>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// The native payload a library declares for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeArtifact {
    pub classifier: String,
    /// Relative to the libraries directory.
    pub path: PathBuf,
    pub download: Option<ArtifactDownload>,
    pub coordinate: MavenArtifact,
}

impl LibraryEntry {
    pub fn coordinate(&self) -> LauncherResult<MavenArtifact> {
        MavenArtifact::parse(&self.name)
    }

    /// Rule verdict for `platform`. Libraries have no feature conditions.
    pub fn is_allowed(&self, platform: &Platform) -> bool {
        rules_allow(&self.rules, platform, &Features::default())
    }

    pub fn main_download(&self) -> Option<&ArtifactDownload> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Entries that only exist to ship native jars: natives declared, no main artifact.
    pub fn is_native_only(&self) -> bool {
        !self.natives.is_empty() && self.main_download().is_none()
    }

    /// Main artifact path relative to the libraries directory, or `None`
    /// for native-only entries.
    pub fn artifact_path(&self) -> Option<PathBuf> {
        if self.is_native_only() {
            return None;
        }
        if let Some(path) = self.main_download().and_then(|a| a.path.as_deref()) {
            return Some(path.split('/').collect());
        }
        self.coordinate().ok().map(|c| c.local_path())
    }

    /// Candidate URLs for the main artifact, in the order they should be tried:
    /// the explicit URL, then the library's own repository, then `mirrors`.
    pub fn artifact_sources(&self, mirrors: &[String]) -> Vec<String> {
        let mut sources = Vec::new();
        if let Some(url) = self.main_download().and_then(ArtifactDownload::explicit_url) {
            sources.push(url.to_string());
        }
        if let Ok(coordinate) = self.coordinate() {
            push_repository_urls(&mut sources, &coordinate, self.url.as_deref(), mirrors);
        }
        sources
    }

    /// Resolve the native classifier for `platform`, substituting `${arch}`.
    pub fn native_artifact(&self, platform: &Platform) -> Option<NativeArtifact> {
        let template = self.natives.get(platform.rule_os_name())?;
        let classifier = template.replace("${arch}", platform.classifier_bits());
        let coordinate = self.coordinate().ok()?.with_classifier(&classifier);
        let download = self
            .downloads
            .as_ref()
            .and_then(|d| d.classifiers.get(&classifier))
            .cloned();
        let path = download
            .as_ref()
            .and_then(|d| d.path.as_deref())
            .map(|p| p.split('/').collect())
            .unwrap_or_else(|| coordinate.local_path());

        Some(NativeArtifact {
            classifier,
            path,
            download,
            coordinate,
        })
    }

    /// Archive entry prefixes never extracted from this library's natives.
    pub fn extract_excludes(&self) -> &[String] {
        self.extract.as_ref().map_or(&[], |e| e.exclude.as_slice())
    }
}

impl NativeArtifact {
    pub fn sources(&self, repository: Option<&str>, mirrors: &[String]) -> Vec<String> {
        let mut sources = Vec::new();
        if let Some(url) = self.download.as_ref().and_then(ArtifactDownload::explicit_url) {
            sources.push(url.to_string());
        }
        push_repository_urls(&mut sources, &self.coordinate, repository, mirrors);
        sources
    }
}

fn push_repository_urls(
    sources: &mut Vec<String>,
    coordinate: &MavenArtifact,
    repository: Option<&str>,
    mirrors: &[String],
) {
    let repos = repository
        .filter(|r| !r.trim().is_empty())
        .into_iter()
        .chain(mirrors.iter().map(String::as_str));
    for repo in repos {
        let url = coordinate.url(repo);
        if !sources.contains(&url) {
            sources.push(url);
        }
    }
}

impl VersionDescriptor {
    /// Explicit requirement from the descriptor, else inferred from the id.
    pub fn required_java_major(&self) -> u32 {
        self.java_major
            .unwrap_or_else(|| required_java_for_minecraft_version(&self.id))
    }

    /// Libraries whose rules include them on `platform`, in descriptor order.
    pub fn allowed_libraries<'a>(
        &'a self,
        platform: &'a Platform,
    ) -> impl Iterator<Item = &'a LibraryEntry> + 'a {
        self.libraries.iter().filter(move |lib| lib.is_allowed(platform))
    }

    pub fn parse(raw: &str) -> LauncherResult<Self> {
        serde_json::from_str(raw).map_err(|e| LauncherError::Manifest(format!("descriptor: {e}")))
    }
}

// ─── Wire format ───

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersionDescriptor {
    id: String,
    #[serde(default, rename = "type")]
    kind: Option<VersionKind>,
    main_class: String,
    #[serde(default)]
    java_version: Option<RawJavaVersion>,
    #[serde(default)]
    asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    downloads: Option<RawVersionDownloads>,
    #[serde(default)]
    libraries: Vec<LibraryEntry>,
    #[serde(default)]
    arguments: Option<RawArguments>,
    #[serde(default)]
    minecraft_arguments: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJavaVersion {
    major_version: u32,
}

#[derive(Deserialize)]
struct RawVersionDownloads {
    #[serde(default)]
    client: Option<ArtifactDownload>,
}

#[derive(Deserialize)]
struct RawArguments {
    #[serde(default)]
    game: Vec<Argument>,
    #[serde(default)]
    jvm: Vec<Argument>,
}

impl TryFrom<RawVersionDescriptor> for VersionDescriptor {
    type Error = String;

    fn try_from(raw: RawVersionDescriptor) -> Result<Self, Self::Error> {
        let asset_index = raw
            .asset_index
            .ok_or_else(|| format!("version {} has no assetIndex", raw.id))?;

        let arguments = match (raw.arguments, raw.minecraft_arguments) {
            (Some(args), _) => ArgumentSpec::Modern {
                game: args.game,
                jvm: args.jvm,
            },
            (None, Some(template)) => ArgumentSpec::Legacy(template),
            (None, None) => {
                return Err(format!(
                    "version {} has neither arguments nor minecraftArguments",
                    raw.id
                ))
            }
        };

        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            main_class: raw.main_class,
            java_major: raw.java_version.map(|j| j.major_version),
            asset_index,
            client: raw.downloads.and_then(|d| d.client),
            libraries: raw.libraries,
            arguments,
        })
    }
}
