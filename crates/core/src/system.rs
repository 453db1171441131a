//! System: owns the collections of Targets, JobContexts, Breakpoints,
//! Filters, SymbolServers, and global settings.

use crate::breakpoint::Breakpoint;
use crate::filter::Filter;
use crate::id::{BreakpointId, FilterId, IdAllocator, JobContextId, SymbolServerId, TargetId};
use crate::job_context::JobContext;
use crate::target::Target;
use std::collections::HashMap;

/// Connection state of a symbol server (an external index the client
/// queries; this struct only tracks the connection, not the index itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolServer {
    id: SymbolServerId,
    url: String,
    connected: bool,
}

impl SymbolServer {
    pub fn new(id: SymbolServerId, url: String) -> Self {
        Self { id, url, connected: false }
    }

    pub fn id(&self) -> SymbolServerId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

/// Key/value interface the core uses to read and write namespaced settings
/// (`System.*`, `Target.*`, `Thread.*`, `Breakpoint.*`). Persistence is an
/// external collaborator's job (spec §1/§6); this trait is the seam.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: String);
}

/// In-memory `SettingsStore`, the default until a real backend is wired in.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: HashMap<String, String>,
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// Well-known settings key for the autoattach pause behavior (spec §4.2).
pub const PAUSE_ON_ATTACH: &str = "System.pause-on-attach";

/// Owns every Target/JobContext/Breakpoint/Filter/SymbolServer for the life
/// of a Session, plus global settings.
pub struct System {
    target_ids: IdAllocator,
    job_ids: IdAllocator,
    breakpoint_ids: IdAllocator,
    filter_ids: IdAllocator,
    symbol_server_ids: IdAllocator,

    targets: Vec<Target>,
    job_contexts: Vec<JobContext>,
    breakpoints: Vec<Breakpoint>,
    filters: Vec<Filter>,
    symbol_servers: Vec<SymbolServer>,

    settings: Box<dyn SettingsStore>,
    observers: Vec<Box<dyn SystemObserver>>,
}

impl Default for System {
    fn default() -> Self {
        Self::new(Box::new(MemorySettingsStore::default()))
    }
}

impl System {
    pub fn new(settings: Box<dyn SettingsStore>) -> Self {
        Self {
            target_ids: IdAllocator::new(),
            job_ids: IdAllocator::new(),
            breakpoint_ids: IdAllocator::new(),
            filter_ids: IdAllocator::new(),
            symbol_server_ids: IdAllocator::new(),
            targets: Vec::new(),
            job_contexts: Vec::new(),
            breakpoints: Vec::new(),
            filters: Vec::new(),
            symbol_servers: Vec::new(),
            settings,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SystemObserver>) {
        self.observers.push(observer);
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn settings_mut(&mut self) -> &mut dyn SettingsStore {
        self.settings.as_mut()
    }

    pub fn pause_on_attach(&self) -> bool {
        self.settings.get(PAUSE_ON_ATTACH) == Some("true")
    }

    // --- Targets ---

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id() == id)
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.id() == id)
    }

    /// Creates a new, empty (State::None) Target and returns its id.
    pub fn create_target(&mut self) -> TargetId {
        let id = TargetId::from(self.target_ids.alloc());
        self.targets.push(Target::new(id));
        for observer in &mut self.observers {
            observer.did_create_target(id);
        }
        id
    }

    /// Reuses the first unused (State::None) Target, if any, else creates
    /// one. Used by autoattach-on-filter-match (spec §4.2).
    pub fn unused_or_new_target(&mut self) -> TargetId {
        if let Some(existing) = self
            .targets
            .iter()
            .find(|t| t.state() == crate::target::TargetState::None)
            .map(|t| t.id())
        {
            return existing;
        }
        self.create_target()
    }

    pub fn destroy_target(&mut self, id: TargetId) {
        if let Some(pos) = self.targets.iter().position(|t| t.id() == id) {
            for observer in &mut self.observers {
                observer.will_destroy_target(id);
            }
            self.targets.remove(pos);
        }
    }

    // --- JobContexts ---

    pub fn job_contexts(&self) -> &[JobContext] {
        &self.job_contexts
    }

    pub fn job_context(&self, id: JobContextId) -> Option<&JobContext> {
        self.job_contexts.iter().find(|j| j.id() == id)
    }

    pub fn job_context_mut(&mut self, id: JobContextId) -> Option<&mut JobContext> {
        self.job_contexts.iter_mut().find(|j| j.id() == id)
    }

    pub fn create_job_context(&mut self) -> JobContextId {
        let id = JobContextId::from(self.job_ids.alloc());
        self.job_contexts.push(JobContext::new(id));
        for observer in &mut self.observers {
            observer.did_create_job_context(id);
        }
        id
    }

    pub fn destroy_job_context(&mut self, id: JobContextId) {
        if let Some(pos) = self.job_contexts.iter().position(|j| j.id() == id) {
            for observer in &mut self.observers {
                observer.will_destroy_job_context(id);
            }
            self.job_contexts.remove(pos);
        }
    }

    // --- Breakpoints ---

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn breakpoint(&self, id: BreakpointId) -> Option<&Breakpoint> {
        self.breakpoints.iter().find(|b| b.id() == id)
    }

    pub fn breakpoint_mut(&mut self, id: BreakpointId) -> Option<&mut Breakpoint> {
        self.breakpoints.iter_mut().find(|b| b.id() == id)
    }

    pub fn breakpoints_mut(&mut self) -> &mut [Breakpoint] {
        &mut self.breakpoints
    }

    pub fn create_breakpoint(
        &mut self,
        settings: crate::breakpoint::BreakpointSettings,
        internal: bool,
    ) -> crate::error::Result<BreakpointId> {
        settings.validate()?;
        let id = BreakpointId::from(self.breakpoint_ids.alloc());
        self.breakpoints.push(Breakpoint::new(id, settings, internal));
        for observer in &mut self.observers {
            observer.did_create_breakpoint(id);
        }
        Ok(id)
    }

    pub fn destroy_breakpoint(&mut self, id: BreakpointId) {
        if let Some(pos) = self.breakpoints.iter().position(|b| b.id() == id) {
            for observer in &mut self.observers {
                observer.will_destroy_breakpoint(id);
            }
            self.breakpoints.remove(pos);
        }
    }

    // --- Filters ---

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn filter(&self, id: FilterId) -> Option<&Filter> {
        self.filters.iter().find(|f| f.id() == id)
    }

    pub fn create_filter(
        &mut self,
        pattern: crate::filter::FilterPattern,
        job_scope: Option<JobContextId>,
    ) -> FilterId {
        let id = FilterId::from(self.filter_ids.alloc());
        self.filters.push(Filter::new(id, pattern, job_scope));
        for observer in &mut self.observers {
            observer.did_create_filter(id);
        }
        id
    }

    /// A Breakpoint's resolved address count changed without a direct user
    /// request (a module load re-resolved it). Spec §2 supplement.
    pub fn notify_breakpoint_matched(&mut self, id: BreakpointId, matched_locations: usize) {
        for observer in &mut self.observers {
            observer.on_breakpoint_matched(id, matched_locations);
        }
    }

    pub fn destroy_filter(&mut self, id: FilterId) {
        if let Some(pos) = self.filters.iter().position(|f| f.id() == id) {
            for observer in &mut self.observers {
                observer.will_destroy_filter(id);
            }
            self.filters.remove(pos);
        }
    }

    // --- Symbol servers ---

    pub fn symbol_servers(&self) -> &[SymbolServer] {
        &self.symbol_servers
    }

    pub fn create_symbol_server(&mut self, url: String) -> SymbolServerId {
        let id = SymbolServerId::from(self.symbol_server_ids.alloc());
        self.symbol_servers.push(SymbolServer::new(id, url));
        for observer in &mut self.observers {
            observer.did_create_symbol_server(id);
        }
        id
    }
}

/// Non-owning observer of System-level entity creation/destruction.
pub trait SystemObserver {
    fn did_create_target(&mut self, _id: TargetId) {}
    fn will_destroy_target(&mut self, _id: TargetId) {}
    fn did_create_job_context(&mut self, _id: JobContextId) {}
    fn will_destroy_job_context(&mut self, _id: JobContextId) {}
    fn did_create_breakpoint(&mut self, _id: BreakpointId) {}
    fn will_destroy_breakpoint(&mut self, _id: BreakpointId) {}
    fn did_create_filter(&mut self, _id: FilterId) {}
    fn will_destroy_filter(&mut self, _id: FilterId) {}
    fn did_create_symbol_server(&mut self, _id: SymbolServerId) {}
    /// Fired when a module load causes a Breakpoint's resolved address
    /// count to change without a direct user request (spec §2 supplement).
    fn on_breakpoint_matched(&mut self, _id: BreakpointId, _matched_locations: usize) {}
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
