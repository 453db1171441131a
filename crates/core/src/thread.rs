//! Thread: a thread inside a Process.

use crate::id::Koid;
use crate::simple_display;
use crate::stack::Stack;
use serde::{Deserialize, Serialize};

/// Execution state of a Thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    Suspended,
    Blocked(String),
    CoreDump,
    Dying,
    Dead,
}

simple_display! {
    ThreadState {
        Running => "running",
        Suspended => "suspended",
        Blocked(..) => "blocked",
        CoreDump => "core dump",
        Dying => "dying",
        Dead => "dead",
    }
}

/// Exception kinds at the protocol level (spec §6). Reused directly by
/// [`crate::protocol::Notification::ThreadStopped`] — there is exactly one
/// definition, not a core-side copy of a wire-side enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    None,
    General,
    PageFault,
    PolicyError,
    UndefinedInstruction,
    UnalignedAccess,
    HardwareBreakpoint,
    Watchpoint,
    SoftwareBreakpoint,
    SingleStep,
    Synthetic,
}

impl ExceptionKind {
    /// Debug-oriented exceptions get a terse one-line stop header; the rest
    /// get a multi-line formatted exception record (spec §4.3).
    pub fn is_debug_oriented(self) -> bool {
        matches!(
            self,
            ExceptionKind::None
                | ExceptionKind::SingleStep
                | ExceptionKind::SoftwareBreakpoint
                | ExceptionKind::HardwareBreakpoint
                | ExceptionKind::Watchpoint
                | ExceptionKind::Synthetic
        )
    }
}

/// Details attached to a stop notification's exception record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExceptionDetails {
    pub faulting_address: Option<u64>,
    pub description: Option<String>,
}

/// Everything delivered to the client on a single stop notification (spec
/// §4.3), before the controller stack and ConsoleContext have processed it.
#[derive(Debug, Clone)]
pub struct StopInfo {
    pub exception: ExceptionKind,
    pub details: ExceptionDetails,
    /// Internal ids of BreakpointLocations whose match caused this stop.
    pub matched_breakpoint_locations: Vec<u64>,
}

/// A thread inside a Process.
pub struct Thread {
    koid: Koid,
    name: String,
    state: ThreadState,
    stack: Stack,
    observers: Vec<Box<dyn ThreadObserver>>,
}

impl std::fmt::Debug for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thread")
            .field("koid", &self.koid)
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

impl Thread {
    pub fn new(koid: Koid, name: String) -> Self {
        Self {
            koid,
            name,
            state: ThreadState::Running,
            stack: Stack::default(),
            observers: Vec::new(),
        }
    }

    pub fn koid(&self) -> Koid {
        self.koid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &ThreadState {
        &self.state
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    pub fn add_observer(&mut self, observer: Box<dyn ThreadObserver>) {
        self.observers.push(observer);
    }

    /// Processing order step 1 (spec §4.3): update state and replace the
    /// stack's top with the fresh frames, retaining inline expansion below
    /// the replaced portion. The caller (stop-dispatch orchestration in
    /// `dbg-engine`) is responsible for steps 2-4.
    pub fn apply_stop(&mut self, new_top: Stack) {
        self.state = ThreadState::Suspended;
        self.stack.replace_top(new_top);
    }

    pub fn set_state(&mut self, state: ThreadState) {
        self.state = state;
    }

    /// Fires `on_thread_stopped` observers. Called by stop-dispatch after
    /// the controller stack has decided to actually stop (not Continue).
    pub fn notify_stopped(&mut self, info: &StopInfo) {
        for observer in &mut self.observers {
            observer.on_thread_stopped(self.koid, info);
        }
    }

    /// Fired whenever `SyncFrames` completes and the stack's frame list
    /// below the previously-known portion changes.
    pub fn notify_frames_invalidated(&mut self) {
        for observer in &mut self.observers {
            observer.on_frames_invalidated(self.koid);
        }
    }
}

/// Non-owning observer of a single Thread's stop/frame-invalidation events.
pub trait ThreadObserver {
    fn on_thread_stopped(&mut self, _thread: Koid, _info: &StopInfo) {}
    fn on_frames_invalidated(&mut self, _thread: Koid) {}
}

#[cfg(test)]
#[path = "thread_tests.rs"]
mod tests;
