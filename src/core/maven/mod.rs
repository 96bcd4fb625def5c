mod artifact;

pub use artifact::MavenArtifact;

/// Repositories that host the game's libraries, in fallback order.
pub const MOJANG_LIBRARIES: &str = "https://libraries.minecraft.net";
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";
