// ─── Launch Task ───
// Spawns the game process from a finished launch plan.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::JavaInstallation;
use crate::core::platform::Platform;

use super::classpath::safe_path_str;

/// Everything needed to start the game, fully resolved.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchPlan {
    pub classpath: Vec<PathBuf>,
    pub runtime: JavaInstallation,
    /// Arguments after the executable.
    pub argument_vector: Vec<String>,
    pub working_dir: PathBuf,
    pub natives_dir: PathBuf,
}

/// Start the runtime with inherited stdio in the game directory.
pub fn spawn_game(plan: &LaunchPlan, platform: &Platform) -> LauncherResult<Child> {
    let java_bin = &plan.runtime.executable_path;

    let mut cmd = Command::new(java_bin);
    cmd.args(&plan.argument_vector)
        .current_dir(&plan.working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    configure_native_library_env(&mut cmd, platform, &plan.natives_dir);

    info!("Launching game with Java {}: {:?}", plan.runtime.major_version, java_bin);
    debug!("Command (copy/paste): {}", format_command_for_logs(cmd.as_std()));

    cmd.spawn().map_err(|e| LauncherError::spawn(java_bin, e))
}

fn configure_native_library_env(cmd: &mut Command, platform: &Platform, natives_dir: &Path) {
    let var = platform.library_path_var();
    let merged = append_env_path(
        std::env::var(var).ok(),
        &safe_path_str(natives_dir),
        platform.classpath_separator(),
    );
    cmd.env(var, merged);
}

fn append_env_path(existing: Option<String>, value: &str, separator: &str) -> String {
    match existing {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}

fn format_command_for_logs(cmd: &std::process::Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
