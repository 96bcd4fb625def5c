// ─── Platform ───
// One place that answers every OS/arch question the launcher asks.
// Detected once and handed down; tests build simulated platforms directly.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsKind {
    Windows,
    MacOs,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    X86,
    Arm64,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: OsKind,
    pub arch: Arch,
}

impl Platform {
    pub const fn new(os: OsKind, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "windows" => OsKind::Windows,
            "macos" => OsKind::MacOs,
            _ => OsKind::Linux,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "x86" => Arch::X86,
            "aarch64" => Arch::Arm64,
            _ => Arch::Other,
        };
        Self { os, arch }
    }

    /// OS name as written in version descriptor rules and `natives` maps.
    pub fn rule_os_name(&self) -> &'static str {
        match self.os {
            OsKind::Windows => "windows",
            OsKind::MacOs => "osx",
            OsKind::Linux => "linux",
        }
    }

    /// Arch name as written in the `os.arch` field of descriptor rules.
    pub fn rule_arch_name(&self) -> &'static str {
        match self.arch {
            Arch::X64 => "x86_64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
            Arch::Other => "unknown",
        }
    }

    /// Value substituted for `${arch}` in native classifiers.
    pub fn classifier_bits(&self) -> &'static str {
        match self.arch {
            Arch::X86 => "32",
            _ => "64",
        }
    }

    pub fn classpath_separator(&self) -> &'static str {
        match self.os {
            OsKind::Windows => ";",
            _ => ":",
        }
    }

    pub fn java_executable(&self) -> &'static str {
        match self.os {
            OsKind::Windows => "java.exe",
            _ => "java",
        }
    }

    /// Subfolder of the bundled runtime directory that holds this platform's JRE.
    pub fn bundled_runtime_folder(&self) -> String {
        let os = match self.os {
            OsKind::Windows => "windows",
            OsKind::MacOs => "macos",
            OsKind::Linux => "linux",
        };
        let arch = match self.arch {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
            Arch::Other => "other",
        };
        format!("{os}-{arch}")
    }

    /// Environment variable the dynamic loader searches for shared libraries.
    pub fn library_path_var(&self) -> &'static str {
        match self.os {
            OsKind::Windows => "PATH",
            OsKind::MacOs => "DYLD_LIBRARY_PATH",
            OsKind::Linux => "LD_LIBRARY_PATH",
        }
    }

    /// Directories under which the common JDK distributions install themselves.
    /// Each child directory of these is treated as a candidate Java home.
    pub fn well_known_java_dirs(&self, home: Option<PathBuf>) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = match self.os {
            OsKind::Windows => {
                let mut roots = Vec::new();
                for base in ["C:\\Program Files", "C:\\Program Files (x86)"] {
                    for vendor in [
                        "Java",
                        "Eclipse Adoptium",
                        "Eclipse Foundation",
                        "AdoptOpenJDK",
                        "Zulu",
                        "Microsoft",
                        "Amazon Corretto",
                        "BellSoft",
                        "Semeru",
                    ] {
                        roots.push(PathBuf::from(base).join(vendor));
                    }
                }
                roots
            }
            OsKind::MacOs => vec![
                PathBuf::from("/Library/Java/JavaVirtualMachines"),
                PathBuf::from("/System/Library/Java/JavaVirtualMachines"),
                PathBuf::from("/opt/homebrew/opt"),
                PathBuf::from("/usr/local/opt"),
            ],
            OsKind::Linux => vec![
                PathBuf::from("/usr/lib/jvm"),
                PathBuf::from("/usr/lib64/jvm"),
                PathBuf::from("/usr/java"),
                PathBuf::from("/opt/java"),
                PathBuf::from("/opt/jdk"),
            ],
        };

        if let Some(home) = home {
            dirs.push(home.join(".jdks"));
            dirs.push(home.join(".sdkman").join("candidates").join("java"));
            if self.os == OsKind::MacOs {
                dirs.push(home.join("Library").join("Java").join("JavaVirtualMachines"));
            }
        }

        dirs
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_names_follow_descriptor_vocabulary() {
        let mac = Platform::new(OsKind::MacOs, Arch::Arm64);
        assert_eq!(mac.rule_os_name(), "osx");
        assert_eq!(mac.classpath_separator(), ":");
        assert_eq!(mac.bundled_runtime_folder(), "macos-arm64");

        let win = Platform::new(OsKind::Windows, Arch::X86);
        assert_eq!(win.rule_os_name(), "windows");
        assert_eq!(win.classifier_bits(), "32");
        assert_eq!(win.java_executable(), "java.exe");
        assert_eq!(win.classpath_separator(), ";");
    }

    #[test]
    fn home_relative_jdk_dirs_are_appended() {
        let linux = Platform::new(OsKind::Linux, Arch::X64);
        let dirs = linux.well_known_java_dirs(Some(PathBuf::from("/home/steve")));
        assert_eq!(dirs[0], PathBuf::from("/usr/lib/jvm"));
        assert!(dirs.contains(&PathBuf::from("/home/steve/.jdks")));
    }
}
