pub mod arguments;
pub mod classpath;
pub mod natives;
pub mod orchestrator;
pub mod task;

pub use arguments::{build_argument_vector, heap_flags, ArgumentContext};
pub use classpath::{build_classpath, join_classpath};
pub use natives::NativeExtractor;
pub use orchestrator::LaunchOrchestrator;
pub use task::{spawn_game, LaunchPlan};
