// ─── Native Extraction ───
// Unpacks platform binaries from native classifier jars into a flat,
// per-launch natives directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::EventBus;
use crate::core::platform::Platform;
use crate::core::version::VersionDescriptor;

const METADATA_DIR: &str = "META-INF/";

pub struct NativeExtractor {
    platform: Platform,
    libraries_dir: PathBuf,
    natives_dir: PathBuf,
}

impl NativeExtractor {
    pub fn new(
        platform: Platform,
        libraries_dir: impl Into<PathBuf>,
        natives_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            platform,
            libraries_dir: libraries_dir.into(),
            natives_dir: natives_dir.into(),
        }
    }

    /// Rebuild the natives directory from scratch. Returns the number of
    /// files written. A broken archive is skipped with a warning.
    #[instrument(skip_all, fields(version = %descriptor.id))]
    pub async fn extract(&self, descriptor: &VersionDescriptor, events: &EventBus) -> LauncherResult<usize> {
        self.reset_dir().await?;

        let mut written = 0;
        for lib in descriptor.allowed_libraries(&self.platform) {
            let Some(native) = lib.native_artifact(&self.platform) else {
                continue;
            };
            let jar = self.libraries_dir.join(&native.path);
            if !jar.is_file() {
                debug!("Native jar not on disk, skipping: {:?}", jar);
                continue;
            }

            let dest = self.natives_dir.clone();
            let excludes = lib.extract_excludes().to_vec();
            let source = jar.clone();
            let result =
                tokio::task::spawn_blocking(move || extract_archive(&source, &dest, &excludes))
                    .await
                    .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?;

            match result {
                Ok(count) => written += count,
                Err(e) => {
                    warn!("Cannot extract natives from {:?}: {}", jar, e);
                    events.warn(format!("Native library {} could not be extracted", lib.name));
                }
            }
        }

        info!("Extracted {} native file(s) into {:?}", written, self.natives_dir);
        Ok(written)
    }

    async fn reset_dir(&self) -> LauncherResult<()> {
        match tokio::fs::remove_dir_all(&self.natives_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(LauncherError::io(&self.natives_dir, e)),
        }
        tokio::fs::create_dir_all(&self.natives_dir)
            .await
            .map_err(|e| LauncherError::io(&self.natives_dir, e))
    }
}

/// Copy every file entry of `archive` into `dest` by its bare file name.
fn extract_archive(archive: &Path, dest: &Path, excludes: &[String]) -> LauncherResult<usize> {
    let file = std::fs::File::open(archive).map_err(|e| LauncherError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().replace('\\', "/");
        if name.starts_with(METADATA_DIR) || excludes.iter().any(|ex| name.starts_with(ex.as_str())) {
            continue;
        }
        let Some(file_name) = Path::new(&name).file_name() else {
            continue;
        };

        let target = dest.join(file_name);
        // Stream the entry; the header's declared size is not trusted.
        let mut out = std::fs::File::create(&target).map_err(|e| LauncherError::io(&target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&target, e))?;
        debug!("Extracted native: {}", name);
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn metadata_and_excluded_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("natives.jar");
        write_jar(
            &jar,
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
                ("liblwjgl.so", b"elf"),
                ("linux/x64/libglfw.so", b"elf2"),
                ("skip/me.txt", b"nope"),
            ],
        );
        let out = dir.path().join("natives");
        std::fs::create_dir_all(&out).unwrap();

        let count = extract_archive(&jar, &out, &["skip/".to_string()]).unwrap();
        assert_eq!(count, 2);
        assert!(out.join("liblwjgl.so").is_file());
        assert!(out.join("libglfw.so").is_file());
        assert!(!out.join("MANIFEST.MF").exists());
        assert!(!out.join("me.txt").exists());
    }

    #[test]
    fn entries_are_streamed_and_overwrite_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("natives.jar");
        let big: Vec<u8> = (0..3 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
        write_jar(&jar, &[("libbig.so", big.as_slice()), ("a/liblwjgl.so", &b"new"[..])]);

        let out = dir.path().join("natives");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("liblwjgl.so"), b"older and longer").unwrap();

        assert_eq!(extract_archive(&jar, &out, &[]).unwrap(), 2);
        assert_eq!(std::fs::read(out.join("libbig.so")).unwrap(), big);
        assert_eq!(std::fs::read(out.join("liblwjgl.so")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn natives_dir_is_rebuilt_and_bad_archives_are_tolerated() {
        use crate::core::platform::{Arch, OsKind};

        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("libraries");
        let natives = dir.path().join("natives");
        std::fs::create_dir_all(&natives).unwrap();
        std::fs::write(natives.join("stale.so"), b"old").unwrap();

        let descriptor: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "1.8.9",
            "mainClass": "Main",
            "minecraftArguments": "",
            "assetIndex": {"id": "1.8", "url": "u"},
            "libraries": [
                {"name": "org.lwjgl:good:1.0", "natives": {"linux": "natives-linux"}},
                {"name": "org.lwjgl:broken:1.0", "natives": {"linux": "natives-linux"}}
            ]
        }))
        .unwrap();

        write_jar(
            &libs.join("org/lwjgl/good/1.0/good-1.0-natives-linux.jar"),
            &[("libgood.so", b"elf")],
        );
        let broken = libs.join("org/lwjgl/broken/1.0/broken-1.0-natives-linux.jar");
        std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
        std::fs::write(&broken, b"not a zip").unwrap();

        let events = EventBus::new();
        let mut rx = events.subscribe();
        let extractor = NativeExtractor::new(Platform::new(OsKind::Linux, Arch::X64), &libs, &natives);
        let count = extractor.extract(&descriptor, &events).await.unwrap();

        assert_eq!(count, 1);
        assert!(natives.join("libgood.so").is_file());
        assert!(!natives.join("stale.so").exists());
        assert!(matches!(
            rx.try_recv().unwrap(),
            crate::core::events::LaunchEvent::Warning { .. }
        ));
    }
}
