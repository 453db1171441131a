//! JobContext: an attached container-of-processes used to observe process
//! births.

use crate::id::{JobContextId, Koid};
use crate::simple_display;

/// Lifecycle state of a [`JobContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobContextState {
    None,
    Attaching,
    Attached,
}

simple_display! {
    JobContextState {
        None => "none",
        Attaching => "attaching",
        Attached => "attached",
    }
}

/// Attach slot for a container-of-processes (a "job" in the target OS's
/// terminology) used to observe process creation within it.
#[derive(Debug)]
pub struct JobContext {
    id: JobContextId,
    state: JobContextState,
    koid: Option<Koid>,
    name: String,
    observers: Vec<Box<dyn JobContextObserver>>,
}

impl JobContext {
    pub fn new(id: JobContextId) -> Self {
        Self {
            id,
            state: JobContextState::None,
            koid: None,
            name: String::new(),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> JobContextId {
        self.id
    }

    pub fn state(&self) -> JobContextState {
        self.state
    }

    pub fn koid(&self) -> Option<Koid> {
        self.koid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_observer(&mut self, observer: Box<dyn JobContextObserver>) {
        self.observers.push(observer);
    }

    pub fn begin_attaching(&mut self) -> crate::error::Result<()> {
        if self.state != JobContextState::None {
            return Err(crate::error::Error::WrongState(
                "job context is already attaching or attached".into(),
            ));
        }
        self.state = JobContextState::Attaching;
        Ok(())
    }

    pub fn commit_attached(&mut self, koid: Koid, name: String) {
        self.koid = Some(koid);
        self.name = name;
        self.state = JobContextState::Attached;
    }

    pub fn detach(&mut self) {
        self.koid = None;
        self.state = JobContextState::None;
    }

    /// Whether a newly-reported process, which is a descendant of exactly
    /// the containers in `ancestry` (innermost last), is observed by this
    /// JobContext. "Most specific attached container" (spec §3) means the
    /// caller picks the matching JobContext with the longest ancestry match
    /// among all attached contexts; this method only answers membership.
    pub fn observes(&self, ancestry: &[Koid]) -> bool {
        match self.koid {
            Some(koid) => ancestry.contains(&koid),
            None => false,
        }
    }
}

/// Non-owning observer of a JobContext's attach lifecycle.
pub trait JobContextObserver {
    fn did_attach(&mut self, _job: JobContextId) {}
    fn will_detach(&mut self, _job: JobContextId) {}
}

#[cfg(test)]
#[path = "job_context_tests.rs"]
mod tests;
