// ─── Launch Arguments ───
// Turns a descriptor's argument templates into the final JVM + game argv.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::auth::Account;
use crate::core::platform::Platform;
use crate::core::state::WindowGeometry;
use crate::core::version::{Argument, ArgumentSpec, Features, VersionDescriptor};

use super::classpath::safe_path_str;

/// Everything placeholders can resolve to.
#[derive(Debug, Clone)]
pub struct ArgumentContext<'a> {
    pub account: &'a Account,
    pub platform: Platform,
    pub version_type: &'a str,
    pub game_dir: PathBuf,
    pub assets_root: PathBuf,
    pub libraries_dir: PathBuf,
    pub natives_dir: PathBuf,
    /// Already joined with the platform separator.
    pub classpath: String,
    pub memory_mb: u32,
    pub window: Option<WindowGeometry>,
    pub launcher_name: &'a str,
    pub launcher_version: &'a str,
}

/// `-Xmx` is the configured allocation, `-Xms` half of it.
pub fn heap_flags(memory_mb: u32) -> [String; 2] {
    [format!("-Xmx{}M", memory_mb), format!("-Xms{}M", memory_mb / 2)]
}

/// Full argv for the runtime (the executable itself excluded):
/// heap flags, native path, JVM args, `-cp <classpath>`, main class, game args.
pub fn build_argument_vector(descriptor: &VersionDescriptor, ctx: &ArgumentContext<'_>) -> Vec<String> {
    let vars = placeholders(descriptor, ctx);

    let mut argv: Vec<String> = heap_flags(ctx.memory_mb).into();
    argv.push(format!("-Djava.library.path={}", safe_path_str(&ctx.natives_dir)));

    let game = match &descriptor.arguments {
        ArgumentSpec::Legacy(template) => {
            argv.push(format!("-Dminecraft.launcher.brand={}", ctx.launcher_name));
            argv.push(format!("-Dminecraft.launcher.version={}", ctx.launcher_version));

            let mut game = resolve_tokens(template.split_whitespace().map(str::to_string), &vars);
            if let Some(window) = ctx.window {
                game.extend([
                    "--width".to_string(),
                    window.width.to_string(),
                    "--height".to_string(),
                    window.height.to_string(),
                ]);
            }
            game
        }
        ArgumentSpec::Modern { game, jvm } => {
            let features = Features {
                custom_resolution: ctx.window.is_some(),
                demo_user: false,
            };
            argv.extend(sanitize_jvm_args(resolve_tokens(
                expand(jvm, &ctx.platform, &features),
                &vars,
            )));
            resolve_tokens(expand(game, &ctx.platform, &features), &vars)
        }
    };

    argv.push("-cp".to_string());
    argv.push(ctx.classpath.clone());
    argv.push(descriptor.main_class.clone());
    argv.extend(game);
    argv
}

fn placeholders(descriptor: &VersionDescriptor, ctx: &ArgumentContext<'_>) -> BTreeMap<&'static str, String> {
    let game_dir = safe_path_str(&ctx.game_dir);
    let assets_root = safe_path_str(&ctx.assets_root);
    let mut vars = BTreeMap::from([
        ("auth_player_name", ctx.account.username.clone()),
        ("version_name", descriptor.id.clone()),
        ("game_directory", game_dir),
        ("assets_root", assets_root.clone()),
        ("game_assets", assets_root),
        ("assets_index_name", descriptor.asset_index.id.clone()),
        ("auth_access_token", ctx.account.access_token.clone()),
        ("auth_session", ctx.account.access_token.clone()),
        ("user_type", ctx.account.user_type().to_string()),
        ("auth_uuid", ctx.account.uuid.clone()),
        ("user_properties", "{}".to_string()),
        ("version_type", ctx.version_type.to_string()),
        ("natives_directory", safe_path_str(&ctx.natives_dir)),
        ("library_directory", safe_path_str(&ctx.libraries_dir)),
        ("classpath", ctx.classpath.clone()),
        ("classpath_separator", ctx.platform.classpath_separator().to_string()),
        ("launcher_name", ctx.launcher_name.to_string()),
        ("launcher_version", ctx.launcher_version.to_string()),
    ]);
    if let Some(window) = ctx.window {
        vars.insert("resolution_width", window.width.to_string());
        vars.insert("resolution_height", window.height.to_string());
    }
    vars
}

fn expand(args: &[Argument], platform: &Platform, features: &Features) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.resolve(platform, features))
        .collect()
}

/// Substitute every known placeholder. A token still holding `${...}`
/// afterwards is dropped, together with the flag that introduced it.
fn resolve_tokens(tokens: impl IntoIterator<Item = String>, vars: &BTreeMap<&'static str, String>) -> Vec<String> {
    let mut out = Vec::new();
    for token in tokens {
        let mut resolved = token;
        for (key, value) in vars {
            let placeholder = format!("${{{key}}}");
            if resolved.contains(&placeholder) {
                resolved = resolved.replace(&placeholder, value);
            }
        }

        if resolved.contains("${") {
            drop_dangling_option(&mut out);
            continue;
        }
        out.push(resolved);
    }
    out
}

fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|last| last.starts_with("--")) {
        let _ = args.pop();
    }
}

/// The classpath and native path are injected by [`build_argument_vector`];
/// descriptor-provided copies are removed.
fn sanitize_jvm_args(args: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "-cp" || arg == "-classpath" || arg == "--class-path" {
            let _ = iter.next();
            continue;
        }
        if arg.starts_with("-Djava.library.path=") {
            continue;
        }
        out.push(arg);
    }
    out
}
