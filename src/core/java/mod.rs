pub mod discovery;
pub mod runtime;

pub use discovery::{select_runtime, RuntimeDiscovery};
pub use runtime::{
    parse_major_version, probe_java, required_java_for_minecraft_version, JavaInstallation,
    RuntimeOrigin,
};
