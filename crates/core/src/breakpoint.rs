//! Breakpoint: a logical intent expressed by [`BreakpointSettings`], plus
//! the concrete [`BreakpointLocation`]s it resolves to per process.
//!
//! Resolution itself (symbolic name / file:line / bare line / address →
//! concrete addresses) is a `dbg-engine` concern (`breakpoint_engine.rs`),
//! since it needs a `SymbolService`. This module only holds the settled
//! data shape and the hit-counting arithmetic that has no symbol
//! dependency.

use crate::id::{BreakpointId, Koid, TargetId, ThreadId};
use crate::simple_display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointType {
    Software,
    HardwareExec,
    HardwareWrite,
    ReadWrite,
}

simple_display! {
    BreakpointType {
        Software => "software",
        HardwareExec => "hardware-execute",
        HardwareWrite => "hardware-write",
        ReadWrite => "read-write",
    }
}

/// Which processes/threads a Breakpoint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointScope {
    System,
    Target(TargetId),
    Thread(TargetId, ThreadId),
}

/// What to suspend when a Breakpoint is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    None,
    Thread,
    Process,
    All,
}

/// A symbolic or concrete reference to a breakpoint-able location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLocation {
    Symbol(String),
    FileLine { file: String, line: u32 },
    Line(u32),
    Address(u64),
}

/// User-facing intent for a Breakpoint, independent of resolution state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointSettings {
    pub kind: BreakpointType,
    pub scope: BreakpointScope,
    pub locations: Vec<InputLocation>,
    pub stop_mode: StopMode,
    pub enabled: bool,
    pub one_shot: bool,
    pub byte_size: Option<u8>,
    pub hit_mult: u32,
    pub condition: Option<String>,
}

impl BreakpointSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.hit_mult == 0 {
            return Err(crate::error::Error::Input(
                "hit_mult must be >= 1".into(),
            ));
        }
        if self.locations.is_empty() {
            return Err(crate::error::Error::Input(
                "breakpoint must have at least one location".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BreakpointSettings {
    fn default() -> Self {
        Self {
            kind: BreakpointType::Software,
            scope: BreakpointScope::System,
            locations: Vec::new(),
            stop_mode: StopMode::All,
            enabled: true,
            one_shot: false,
            byte_size: None,
            hit_mult: 1,
            condition: None,
        }
    }
}

/// A concrete `(Process, resolved address)` realization of a Breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointLocation {
    pub process: Koid,
    pub address: u64,
    pub enabled: bool,
    pub hit_count: u64,
}

impl BreakpointLocation {
    pub fn new(process: Koid, address: u64) -> Self {
        Self { process, address, enabled: true, hit_count: 0 }
    }
}

/// A logical breakpoint intent plus its resolved locations.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    id: BreakpointId,
    settings: BreakpointSettings,
    locations: Vec<BreakpointLocation>,
    hit_count: u64,
    /// Invisible to the user; installed by a ThreadController. Never
    /// listed; matches are delivered only to the installing controller.
    internal: bool,
}

impl Breakpoint {
    pub fn new(id: BreakpointId, settings: BreakpointSettings, internal: bool) -> Self {
        Self { id, settings, locations: Vec::new(), hit_count: 0, internal }
    }

    pub fn id(&self) -> BreakpointId {
        self.id
    }

    pub fn settings(&self) -> &BreakpointSettings {
        &self.settings
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// A Breakpoint with no resolved locations is "pending" — valid but
    /// currently matches nothing.
    pub fn is_pending(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn locations(&self) -> &[BreakpointLocation] {
        &self.locations
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Replace the resolution result wholesale; called by
    /// `dbg-engine::breakpoint_engine` after re-resolving InputLocations.
    pub fn set_locations(&mut self, locations: Vec<BreakpointLocation>) {
        self.locations = locations;
    }

    pub fn update_settings(&mut self, settings: BreakpointSettings) -> crate::error::Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Record a matching hit and decide whether it should be user-visible,
    /// per `hit_mult` (spec §4.6): a breakpoint with `hit_mult > 1` only
    /// reports hits on every Nth matching hit; missed hits still increment
    /// the count but are treated as continue.
    pub fn record_hit(&mut self) -> bool {
        self.hit_count += 1;
        self.hit_count % self.settings.hit_mult as u64 == 0
    }

    /// A breakpoint whose scope thread was destroyed becomes scope-less and
    /// is auto-disabled (spec §8 boundary behavior).
    pub fn on_scope_thread_destroyed(&mut self, target: TargetId, thread: ThreadId) {
        if self.settings.scope == BreakpointScope::Thread(target, thread) {
            self.settings.scope = BreakpointScope::System;
            self.settings.enabled = false;
        }
    }
}

#[cfg(test)]
#[path = "breakpoint_tests.rs"]
mod tests;
