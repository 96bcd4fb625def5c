use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Where a runtime candidate was found. Declaration order is discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeOrigin {
    /// Shipped next to the launcher.
    Bundled,
    /// `JAVA_HOME`.
    EnvHome,
    WellKnownDir,
    /// Found on `PATH`.
    PathProbe,
    /// Explicit path from the launch options.
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaInstallation {
    pub executable_path: PathBuf,
    /// Full version string as reported, e.g. `17.0.9` or `1.8.0_392`.
    pub version: String,
    pub major_version: u32,
    pub vendor: String,
    pub origin: RuntimeOrigin,
}

/// Run `<path> -XshowSettings:properties -version` and parse what it reports.
///
/// Anything that fails to start, overruns `timeout`, or prints no parseable
/// version yields `None`.
#[instrument(skip(timeout))]
pub async fn probe_java(
    path: &Path,
    origin: RuntimeOrigin,
    timeout: Duration,
) -> Option<JavaInstallation> {
    let child = Command::new(path)
        .args(["-XshowSettings:properties", "-version"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!("Probe of {:?} failed to start: {}", path, e);
            return None;
        }
        Err(_) => {
            debug!("Probe of {:?} timed out after {:?}", path, timeout);
            return None;
        }
    };

    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    parse_probe_output(path, origin, &text)
}

pub(crate) fn parse_probe_output(
    path: &Path,
    origin: RuntimeOrigin,
    output: &str,
) -> Option<JavaInstallation> {
    debug!("Probing {:?}: {}", path, output.lines().next().unwrap_or(""));

    let version = parse_version_string(output)?;
    let major_version = parse_major_version(&version)?;

    Some(JavaInstallation {
        executable_path: path.to_path_buf(),
        version,
        major_version,
        vendor: parse_vendor(output),
        origin,
    })
}

/// First double-quoted token, which is where every JVM prints its version.
fn parse_version_string(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find('"')?;
        let end = line[start + 1..].find('"')?;
        Some(line[start + 1..start + 1 + end].to_string())
    })
}

/// `1.8.0_392` → 8, `17.0.2` → 17, `21` → 21, `22-ea` → 22.
pub fn parse_major_version(version: &str) -> Option<u32> {
    let mut parts = version.split(|c: char| c == '.' || c == '_' || c == '-' || c == '+');
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

fn parse_vendor(output: &str) -> String {
    if let Some(vendor) = output.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "java.vendor").then(|| value.trim().to_string())
    }) {
        return vendor;
    }

    for (needle, vendor) in [
        ("Temurin", "Eclipse Adoptium"),
        ("Zulu", "Azul Zulu"),
        ("Corretto", "Amazon Corretto"),
        ("GraalVM", "GraalVM"),
        ("OpenJDK", "OpenJDK"),
        ("Java(TM)", "Oracle"),
    ] {
        if output.contains(needle) {
            return vendor.to_string();
        }
    }
    "unknown".to_string()
}

/// Java major a game version needs when its descriptor does not say.
///
/// Snapshots (`yyWwwx`): 2024 onward → 21, 2021–2023 → 17, older → 8.
/// Releases: 1.20.5+ → 21, 1.18+ → 17, 1.17 → 16, everything older → 8.
pub fn required_java_for_minecraft_version(minecraft_version: &str) -> u32 {
    let lower = minecraft_version.to_ascii_lowercase();
    if let Some((year, week)) = lower.split_once('w') {
        let is_snapshot =
            year.len() == 2 && week.get(..2).map_or(false, |w| w.parse::<u32>().is_ok());
        if let (true, Ok(year)) = (is_snapshot, year.parse::<u32>()) {
            return match year {
                y if y >= 24 => 21,
                21..=23 => 17,
                _ => 8,
            };
        }
    }

    let mut parts = lower
        .split(|c: char| c == '-' || c == ' ')
        .next()
        .unwrap_or("")
        .split('.');
    let major = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(1);
    let minor = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(0);

    if major > 1 || minor >= 21 || (minor == 20 && patch >= 5) {
        21
    } else if minor >= 18 {
        17
    } else if minor == 17 {
        16
    } else {
        8
    }
}
