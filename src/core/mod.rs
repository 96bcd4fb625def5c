// ─── Launcher Core ───
// Provisioning and launch engine for the game client.
//
// Architecture:
//   core/
//     version/   : Manifest, version descriptor, platform rules
//     libraries/ : Client jar + library downloads with mirror fallback
//     assets/    : Asset index + batched object downloads
//     java/      : Runtime probing, discovery and selection
//     launch/    : Natives, classpath, arguments, process, orchestrator
//     downloader/: Streaming downloads with size/SHA-1 validation
//     maven/     : Coordinate parsing and repository paths
//     auth/      : Account model and provider contract
//     state/     : Config, cache layout, preferences

pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod java;
pub mod launch;
pub mod libraries;
pub mod maven;
pub mod platform;
pub mod state;
pub mod version;
