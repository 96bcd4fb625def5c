// ─── Launch Events ───
// The orchestrator publishes into an `EventBus`; hosts subscribe to it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::error::{LauncherError, LauncherResult};

const EVENT_CAPACITY: usize = 256;

/// Phases of a launch, in the only order they may be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchState {
    Idle,
    ResolvingManifest,
    FetchingClientJar,
    FetchingLibraries,
    FetchingAssets,
    ExtractingNatives,
    DiscoveringRuntime,
    BuildingPlan,
    Launching,
    Running,
    Closed,
    Error,
}

impl LaunchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LaunchState::Closed | LaunchState::Error)
    }
}

/// Everything a host can observe about a launch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchEvent {
    StateChanged { state: LaunchState },
    /// Overall progress, 0–100. Never decreases within one launch.
    Progress { value: u8 },
    /// A tolerated failure: the launch continues.
    Warning { message: String },
    /// The game process was spawned.
    Started { pid: Option<u32> },
    /// The game process exited.
    Closed { exit_code: i32 },
}

/// Fan-out channel for launch events plus the shared progress high-water mark.
///
/// Cloning is cheap and every clone publishes into the same stream, so
/// concurrent download tasks can report without coordination.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LaunchEvent>,
    progress: Arc<AtomicU8>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sender,
            progress: Arc::new(AtomicU8::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LaunchEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: LaunchEvent) {
        // No subscribers is fine: events are informational.
        let _ = self.sender.send(event);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.publish(LaunchEvent::Warning {
            message: message.into(),
        });
    }

    /// Report overall progress. Values below the current high-water mark are dropped.
    pub fn progress(&self, value: u8) {
        let value = value.min(100);
        let previous = self.progress.fetch_max(value, Ordering::SeqCst);
        if value > previous {
            self.publish(LaunchEvent::Progress { value });
        }
    }

    pub fn current_progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }

    /// Start a new launch: progress goes back to zero.
    pub fn reset_progress(&self) {
        self.progress.store(0, Ordering::SeqCst);
    }

    pub fn phase(&self, span: ProgressSpan) -> PhaseProgress {
        PhaseProgress {
            bus: self.clone(),
            span,
        }
    }
}

/// A reserved slice of the 0–100 progress range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSpan {
    pub start: u8,
    pub end: u8,
}

impl ProgressSpan {
    pub const MANIFEST: ProgressSpan = ProgressSpan { start: 0, end: 5 };
    pub const CLIENT_JAR: ProgressSpan = ProgressSpan { start: 5, end: 35 };
    pub const LIBRARIES: ProgressSpan = ProgressSpan { start: 35, end: 85 };
    pub const ASSETS: ProgressSpan = ProgressSpan { start: 85, end: 100 };

    /// Map `done / total` of this phase onto the overall range.
    pub fn interpolate(&self, done: usize, total: usize) -> u8 {
        if total == 0 || done >= total {
            return self.end;
        }
        let width = u64::from(self.end - self.start);
        let offset = width * done as u64 / total as u64;
        self.start + offset as u8
    }
}

/// Progress handle for one phase; what the downloaders receive.
#[derive(Debug, Clone)]
pub struct PhaseProgress {
    bus: EventBus,
    span: ProgressSpan,
}

impl PhaseProgress {
    /// A handle whose reports go nowhere.
    pub fn detached(span: ProgressSpan) -> Self {
        EventBus::new().phase(span)
    }

    pub fn report(&self, done: usize, total: usize) {
        self.bus.progress(self.span.interpolate(done, total));
    }

    pub fn finish(&self) {
        self.bus.progress(self.span.end);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.bus.warn(message);
    }
}

/// Strictly-forward launch state machine. `Error` is reachable from any
/// non-terminal state and is itself terminal.
#[derive(Debug, Clone)]
pub struct LaunchStateMachine {
    state: LaunchState,
}

impl Default for LaunchStateMachine {
    fn default() -> Self {
        Self {
            state: LaunchState::Idle,
        }
    }
}

impl LaunchStateMachine {
    pub fn state(&self) -> LaunchState {
        self.state
    }

    /// Move to `next`, which must come strictly after the current state.
    pub fn advance(&mut self, next: LaunchState) -> LauncherResult<LaunchState> {
        let allowed = !self.state.is_terminal() && next != LaunchState::Error && next > self.state;
        if !allowed {
            return Err(LauncherError::InvalidState {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(next)
    }

    pub fn fail(&mut self) -> LaunchState {
        self.state = LaunchState::Error;
        self.state
    }

    /// Back to `Idle` for a fresh launch.
    pub fn reset(&mut self) {
        self.state = LaunchState::Idle;
    }
}
