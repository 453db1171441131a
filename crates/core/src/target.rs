//! Target: a slot that may or may not currently refer to a running process.

use crate::id::TargetId;
use crate::process::Process;
use crate::simple_display;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`Target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    /// No process attached or being attached.
    None,
    /// A `Launch` request is in flight.
    Starting,
    /// An `Attach` request is in flight.
    Attaching,
    /// Owns exactly one live Process.
    Running,
}

simple_display! {
    TargetState {
        None => "none",
        Starting => "starting",
        Attaching => "attaching",
        Running => "running",
    }
}

/// How a Target's Process came to be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartOrigin {
    Attach,
    Component,
    Launch,
}

/// Program arguments and environment configuration carried by a Target,
/// independent of whether it is currently running anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Component URL, when launching a component rather than a raw binary.
    pub component_url: Option<String>,
}

/// Reason a Target's Process went away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyReason {
    Exited { code: i64 },
    Detached,
    Killed,
}

/// A client-side slot that can be empty, starting, attaching, or running;
/// when running, owns a Process.
///
/// Invariant: `state == Running` iff `process.is_some()`.
#[derive(Debug)]
pub struct Target {
    id: TargetId,
    state: TargetState,
    config: LaunchConfig,
    process: Option<Process>,
    observers: Vec<Box<dyn TargetObserver>>,
}

impl Target {
    pub fn new(id: TargetId) -> Self {
        Self {
            id,
            state: TargetState::None,
            config: LaunchConfig::default(),
            process: None,
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LaunchConfig) {
        self.config = config;
    }

    pub fn process(&self) -> Option<&Process> {
        self.process.as_ref()
    }

    pub fn process_mut(&mut self) -> Option<&mut Process> {
        self.process.as_mut()
    }

    pub fn add_observer(&mut self, observer: Box<dyn TargetObserver>) {
        self.observers.push(observer);
    }

    /// Mark the target as mid-attach or mid-launch. Returns an error if a
    /// Process is already running (a Target can only pursue one
    /// attach/launch operation at a time).
    pub fn begin_pending(&mut self, state: TargetState) -> crate::error::Result<()> {
        if self.process.is_some() {
            return Err(crate::error::Error::WrongState(
                "target already has a running process".into(),
            ));
        }
        debug_assert!(matches!(state, TargetState::Starting | TargetState::Attaching));
        self.state = state;
        Ok(())
    }

    /// Atomically transition Starting/Attaching → Running, installing the
    /// new Process and firing `did_create_process`. Per spec §4.2 this
    /// transition must be atomic with respect to observers: by the time any
    /// observer runs, `self.process()` already returns the new Process.
    pub fn commit_process(&mut self, process: Process) {
        for observer in &mut self.observers {
            observer.did_create_process(self.id, &process);
        }
        self.process = Some(process);
        self.state = TargetState::Running;
    }

    /// A pending attach/launch failed. Reverts to `None` and returns the
    /// error for the caller to surface with structured context.
    pub fn fail_pending(&mut self, err: crate::error::Error) -> crate::error::Error {
        self.state = TargetState::None;
        err.with_context(format!("Target {}", self.id))
    }

    /// Removes the Process (Kill and Detach both resolve here) and fires
    /// `will_destroy_process` before the Process is actually dropped.
    pub fn destroy_process(&mut self, reason: DestroyReason) {
        if let Some(process) = &self.process {
            for observer in &mut self.observers {
                observer.will_destroy_process(self.id, process, &reason);
            }
        }
        self.process = None;
        self.state = TargetState::None;
    }
}

/// Non-owning observer of a single Target's process lifecycle.
pub trait TargetObserver {
    fn did_create_process(&mut self, _target: TargetId, _process: &Process) {}
    fn will_destroy_process(&mut self, _target: TargetId, _process: &Process, _reason: &DestroyReason) {}
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
