pub mod manifest;
pub mod rules;
pub mod version_file;

pub use manifest::{
    ManifestResolver, VersionKind, VersionManifest, VersionSummary, VERSION_MANIFEST_URL,
};
pub use rules::{rules_allow, Features, OsConstraint, Rule, RuleAction};
pub use version_file::{
    Argument, ArgumentSpec, ArgumentValue, ArtifactDownload, AssetIndexRef, LibraryEntry,
    NativeArtifact, VersionDescriptor,
};
