//! ConsoleContext (spec §4.8): the central id registry, active-selection
//! tracker, and stop-notification orchestrator, grounded in
//! `console_context.cc` (read in full).
//!
//! Target/JobContext/Breakpoint/Filter/SymbolServer already carry a stable,
//! never-reused console id directly through [`System`] (`dbg_core::id`'s
//! `define_console_id!` covers exactly the "id ↔ entity" requirement for
//! those five kinds). The one entity this module must assign its own id
//! for is Thread, which `dbg-core` keys by kernel [`Koid`] rather than a
//! console id, scoped per-Target (spec §4.8).
//!
//! `dbg_core::session::Session` owns its `System` by value, which doesn't
//! compose with `dbg-engine`'s `Arc<Mutex<System>>` sharing requirement
//! (`StopDispatch`/`BreakpointEngine` both need a handle they can lock from
//! async contexts). `ConsoleContext` holds that shared handle directly and
//! re-implements `Session`'s thin connect/disconnect surface against it,
//! rather than fighting the ownership mismatch.

use std::collections::HashMap;
use std::sync::Arc;

use dbg_core::breakpoint::BreakpointScope;
use dbg_core::error::{Error, Result};
use dbg_core::id::{
    BreakpointId, FilterId, IdAllocator, JobContextId, Koid, SymbolServerId, TargetId, ThreadId,
};
use dbg_core::process::Process;
use dbg_core::protocol::{LimboProcess, Notification, Reply, Request, WireIoStream};
use dbg_core::symbol_service::SymbolService;
use dbg_core::system::System;
use dbg_core::target::{DestroyReason, TargetState};
use dbg_core::thread::{ExceptionDetails, StopInfo, Thread};
use dbg_core::transport::AgentTransport;
use tokio::sync::Mutex;

use dbg_engine::breakpoint_engine::BreakpointEngine;
use dbg_engine::filter_engine::FilterEngine;
use dbg_engine::stop_dispatch::StopDispatch;

use crate::format::{self, OutputBuffer, Span, StopContext, Syntax};

/// Per-Target bidirectional map between kernel Koid and console ThreadId,
/// allocated monotonically and never reused while the thread lives (spec
/// §4.8).
#[derive(Default)]
struct ThreadIdTable {
    ids: IdAllocator,
    koid_to_id: HashMap<Koid, ThreadId>,
    id_to_koid: HashMap<ThreadId, Koid>,
}

impl ThreadIdTable {
    fn id_for(&mut self, koid: Koid) -> ThreadId {
        if let Some(&id) = self.koid_to_id.get(&koid) {
            return id;
        }
        let id = ThreadId::from(self.ids.alloc());
        self.koid_to_id.insert(koid, id);
        self.id_to_koid.insert(id, koid);
        id
    }

    fn koid_for(&self, id: ThreadId) -> Option<Koid> {
        self.id_to_koid.get(&id).copied()
    }

    fn forget(&mut self, koid: Koid) {
        if let Some(id) = self.koid_to_id.remove(&koid) {
            self.id_to_koid.remove(&id);
        }
    }

    fn live_ids_sorted(&self) -> Vec<ThreadId> {
        let mut ids: Vec<ThreadId> = self.id_to_koid.keys().copied().collect();
        ids.sort_by_key(|id| id.get());
        ids
    }
}

/// The active selection (spec §4.8): one Target, one Thread per Target, one
/// Frame per Thread, plus one active Breakpoint/Filter/JobContext/
/// SymbolServer. `NONE` (id 0) means nothing of that kind is selected.
struct ActiveSelection {
    target: TargetId,
    thread_by_target: HashMap<TargetId, ThreadId>,
    frame_by_thread: HashMap<(TargetId, ThreadId), usize>,
    breakpoint: BreakpointId,
    filter: FilterId,
    job_context: JobContextId,
    symbol_server: SymbolServerId,
}

impl Default for ActiveSelection {
    fn default() -> Self {
        Self {
            target: TargetId::NONE,
            thread_by_target: HashMap::new(),
            frame_by_thread: HashMap::new(),
            breakpoint: BreakpointId::NONE,
            filter: FilterId::NONE,
            job_context: JobContextId::NONE,
            symbol_server: SymbolServerId::NONE,
        }
    }
}

/// Picks the first remaining id (id-sorted) from `live`, or `none` if
/// `live` is empty — the destroy/recreate rule spec §4.8 applies uniformly
/// to every kind of active selection.
fn first_remaining_or_none<T: Ord + Copy>(live: impl Iterator<Item = T>, none: T) -> T {
    live.min().unwrap_or(none)
}

pub struct ConsoleContext {
    system: Arc<Mutex<System>>,
    transport: Arc<dyn AgentTransport>,
    breakpoints: Arc<BreakpointEngine>,
    stop_dispatch: Arc<StopDispatch>,
    symbols: Arc<dyn SymbolService>,
    thread_ids: HashMap<TargetId, ThreadIdTable>,
    active: ActiveSelection,
    /// Per-thread `display` expressions re-evaluated and printed on every
    /// stop of that thread (spec §4.8 point 4).
    display_expressions: HashMap<(TargetId, ThreadId), Vec<String>>,
}

impl ConsoleContext {
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        symbols: Arc<dyn SymbolService>,
    ) -> Self {
        let system = Arc::new(Mutex::new(System::default()));
        let breakpoints = Arc::new(BreakpointEngine::new(transport.clone(), system.clone()));
        let stop_dispatch = Arc::new(StopDispatch::new(
            system.clone(),
            transport.clone(),
            breakpoints.clone(),
            symbols.clone(),
        ));
        Self {
            system,
            transport,
            breakpoints,
            stop_dispatch,
            symbols,
            thread_ids: HashMap::new(),
            active: ActiveSelection::default(),
        }
    }

    pub fn system(&self) -> &Arc<Mutex<System>> {
        &self.system
    }

    pub fn stop_dispatch(&self) -> &Arc<StopDispatch> {
        &self.stop_dispatch
    }

    pub fn breakpoints(&self) -> &Arc<BreakpointEngine> {
        &self.breakpoints
    }

    pub fn transport(&self) -> &Arc<dyn AgentTransport> {
        &self.transport
    }

    pub fn symbols(&self) -> &Arc<dyn SymbolService> {
        &self.symbols
    }

    /// `Session::connect` (spec §4.1), re-implemented here against the
    /// shared `Arc<Mutex<System>>` handle (see module doc).
    pub async fn connect(&mut self) -> Result<Vec<LimboProcess>> {
        match self.transport.send(Request::Hello).await? {
            Reply::Ok(_) => Ok(Vec::new()),
            Reply::Error { code, message } => Err(Error::Agent { status: code, message }),
        }
    }

    pub async fn disconnect(&mut self) {
        let mut system = self.system.lock().await;
        let target_ids: Vec<_> = system.targets().iter().map(|t| t.id()).collect();
        for id in target_ids {
            if let Some(target) = system.target_mut(id) {
                target.destroy_process(DestroyReason::Detached);
            }
        }
        for breakpoint in system.breakpoints_mut() {
            breakpoint.set_locations(Vec::new());
        }
    }

    // --- Active selection ---

    pub fn active_target(&self) -> TargetId {
        self.active.target
    }

    pub fn active_thread(&self, target: TargetId) -> ThreadId {
        self.active.thread_by_target.get(&target).copied().unwrap_or(ThreadId::NONE)
    }

    pub fn active_frame(&self, target: TargetId, thread: ThreadId) -> usize {
        self.active.frame_by_thread.get(&(target, thread)).copied().unwrap_or(0)
    }

    pub fn active_breakpoint(&self) -> BreakpointId {
        self.active.breakpoint
    }

    pub fn active_filter(&self) -> FilterId {
        self.active.filter
    }

    pub fn active_job_context(&self) -> JobContextId {
        self.active.job_context
    }

    pub fn active_symbol_server(&self) -> SymbolServerId {
        self.active.symbol_server
    }

    pub fn set_active_target(&mut self, target: TargetId) {
        self.active.target = target;
    }

    pub fn set_active_thread(&mut self, target: TargetId, thread: ThreadId) {
        self.active.thread_by_target.insert(target, thread);
    }

    pub fn set_active_frame(&mut self, target: TargetId, thread: ThreadId, frame: usize) {
        self.active.frame_by_thread.insert((target, thread), frame);
    }

    pub fn set_active_breakpoint(&mut self, breakpoint: BreakpointId) {
        self.active.breakpoint = breakpoint;
    }

    pub fn set_active_filter(&mut self, filter: FilterId) {
        self.active.filter = filter;
    }

    pub fn set_active_job_context(&mut self, job_context: JobContextId) {
        self.active.job_context = job_context;
    }

    pub fn set_active_symbol_server(&mut self, symbol_server: SymbolServerId) {
        self.active.symbol_server = symbol_server;
    }

    /// Resolves the console-assigned thread id for a thread koid under
    /// `target`, assigning one if this is the first time the thread has
    /// been seen.
    fn thread_id_for(&mut self, target: TargetId, koid: Koid) -> ThreadId {
        self.thread_ids.entry(target).or_default().id_for(koid)
    }

    pub fn thread_koid(&self, target: TargetId, id: ThreadId) -> Option<Koid> {
        self.thread_ids.get(&target).and_then(|table| table.koid_for(id))
    }

    /// Reverse of [`Self::thread_koid`]: the console id assigned to a
    /// thread koid under `target`, if it has been seen. Used by `thread`
    /// listings, which only have the live `Thread`s (keyed by koid) to
    /// iterate over.
    pub fn thread_id_for_koid(&self, target: TargetId, koid: Koid) -> Option<ThreadId> {
        self.thread_ids.get(&target).and_then(|table| table.koid_to_id.get(&koid).copied())
    }

    // --- Entity destruction with the active-selection recreate rule ---

    pub async fn destroy_target(&mut self, id: TargetId) {
        let mut system = self.system.lock().await;
        system.destroy_target(id);
        self.thread_ids.remove(&id);
        self.active.thread_by_target.remove(&id);
        if self.active.target == id {
            let live = system.targets().iter().map(|t| t.id());
            self.active.target = first_remaining_or_none(live, TargetId::NONE);
        }
    }

    pub async fn destroy_breakpoint(&mut self, id: BreakpointId) -> Result<()> {
        self.breakpoints.remove(id).await?;
        if self.active.breakpoint == id {
            let system = self.system.lock().await;
            let live = system.breakpoints().iter().map(|b| b.id());
            self.active.breakpoint = first_remaining_or_none(live, BreakpointId::NONE);
        }
        Ok(())
    }

    pub async fn destroy_filter(&mut self, id: FilterId) {
        let mut system = self.system.lock().await;
        system.destroy_filter(id);
        if self.active.filter == id {
            let live = system.filters().iter().map(|f| f.id());
            self.active.filter = first_remaining_or_none(live, FilterId::NONE);
        }
    }

    pub async fn destroy_job_context(&mut self, id: JobContextId) {
        let mut system = self.system.lock().await;
        system.destroy_job_context(id);
        if self.active.job_context == id {
            let live = system.job_contexts().iter().map(|j| j.id());
            self.active.job_context = first_remaining_or_none(live, JobContextId::NONE);
        }
    }

    // --- Display expressions (spec §4.8 point 4) ---

    pub fn set_display_expressions(&mut self, target: TargetId, thread: ThreadId, expressions: Vec<String>) {
        self.display_expressions.insert((target, thread), expressions);
    }

    async fn evaluate_display_expressions(
        &self,
        target: TargetId,
        thread_koid: Koid,
        thread_id: ThreadId,
        process_koid: Koid,
        frame_pc: u64,
    ) -> OutputBuffer {
        let mut out = OutputBuffer::new();
        let Some(expressions) = self.display_expressions.get(&(target, thread_id)) else {
            return out;
        };
        for expr in expressions {
            match self
                .symbols
                .evaluate(process_koid.get(), thread_koid.get(), frame_pc, expr)
                .await
            {
                Ok(value) => {
                    out.append(Span::new(Syntax::Variable, expr.clone()));
                    out.append(Span::normal(format!(" = {value}\n")));
                }
                Err(err) => {
                    out.append(Span::new(Syntax::Error, format!("{expr}: {err}\n")));
                }
            }
        }
        out
    }

    // --- Notification application ---

    /// Applies one agent notification to the object model and console
    /// state, returning formatted output when the notification is
    /// directly user-visible (a stop, or a crashed-process presentation).
    /// This is the single place a raw wire [`Notification`] becomes
    /// `System`/`Process`/`Thread` mutation plus console-id bookkeeping —
    /// there is no `System`-internal observer wiring for it (see module
    /// doc: `ProcessObserver`/`TargetObserver` only ever see an already-
    /// constructed `Process`, too late to register a thread-id tracker on).
    pub async fn handle_notification(&mut self, notification: Notification) -> Result<Option<OutputBuffer>> {
        match notification {
            Notification::ProcessStarting { koid, name } => {
                let (target_id, pause_on_attach) = {
                    let mut system = self.system.lock().await;
                    let pause_on_attach = system.pause_on_attach();
                    let target_id = FilterEngine::on_process_starting(&mut system, koid, &name, None, None);
                    (target_id, pause_on_attach)
                };
                let Some(target_id) = target_id else {
                    return Ok(None);
                };

                // Spec §4.2/§8.4 "attaches by koid": the filter match only
                // updates the local model; the agent still needs an
                // explicit Attach before it actually controls the process.
                match self.transport.send(Request::Attach { koid }).await {
                    Ok(Reply::Ok(_)) => {}
                    Ok(Reply::Error { code, message }) => {
                        let mut system = self.system.lock().await;
                        if let Some(target) = system.target_mut(target_id) {
                            target.destroy_process(DestroyReason::Detached);
                        }
                        let mut out = OutputBuffer::new();
                        out.append(Span::new(
                            Syntax::Error,
                            format!("autoattach to {name} (koid={koid}) failed: {message} (status {code})\n"),
                        ));
                        return Ok(Some(out));
                    }
                    Err(err) => {
                        let mut out = OutputBuffer::new();
                        out.append(Span::new(
                            Syntax::Error,
                            format!("autoattach to {name} (koid={koid}) failed: {err}\n"),
                        ));
                        return Ok(Some(out));
                    }
                }

                if pause_on_attach {
                    let mut out = OutputBuffer::new();
                    out.append(Span::new(
                        Syntax::Warning,
                        format!(
                            "process {name} (koid={koid}) initializing under target {target_id}, \
                             suspended (pause on attach)\n"
                        ),
                    ));
                    return Ok(Some(out));
                }
                Ok(None)
            }
            Notification::ProcessExiting { koid, exit_code } => {
                let mut system = self.system.lock().await;
                if let Some(target_id) = self.target_owning_process(&system, koid) {
                    if let Some(target) = system.target_mut(target_id) {
                        target.destroy_process(DestroyReason::Exited { code: exit_code });
                    }
                }
                Ok(None)
            }
            Notification::ThreadStarting { process, thread, name } => {
                let mut system = self.system.lock().await;
                if let Some(target_id) = self.target_owning_process(&system, process) {
                    if let Some(proc) = system.target_mut(target_id).and_then(|t| t.process_mut()) {
                        proc.did_create_thread(Thread::new(thread, name));
                    }
                    drop(system);
                    self.thread_id_for(target_id, thread);
                }
                Ok(None)
            }
            Notification::ThreadExiting { process, thread } => {
                let target_id = {
                    let mut system = self.system.lock().await;
                    let target_id = self.target_owning_process(&system, process);
                    if let Some(target_id) = target_id {
                        if let Some(proc) = system.target_mut(target_id).and_then(|t| t.process_mut()) {
                            proc.will_destroy_thread(thread);
                        }
                    }
                    target_id
                };
                let Some(target_id) = target_id else {
                    return Ok(None);
                };

                let thread_id = self.thread_id_for_koid(target_id, thread);
                if let Some(table) = self.thread_ids.get_mut(&target_id) {
                    table.forget(thread);
                }

                let Some(thread_id) = thread_id else {
                    return Ok(None);
                };

                if self.active.thread_by_target.get(&target_id).copied() == Some(thread_id) {
                    let live = self.thread_ids.get(&target_id).map(ThreadIdTable::live_ids_sorted).unwrap_or_default();
                    let new_active = first_remaining_or_none(live.into_iter(), ThreadId::NONE);
                    self.active.thread_by_target.insert(target_id, new_active);
                    self.active.frame_by_thread.remove(&(target_id, thread_id));
                }

                let disabled = self.on_thread_destroyed_for_breakpoints(target_id, thread_id).await;
                if disabled.is_empty() {
                    return Ok(None);
                }
                let mut out = OutputBuffer::new();
                for id in disabled {
                    out.append(Span::new(
                        Syntax::Warning,
                        format!("breakpoint {id} scoped to thread {thread_id}: thread exited, disabled\n"),
                    ));
                }
                Ok(Some(out))
            }
            Notification::ThreadStopped {
                process,
                thread,
                exception,
                faulting_address,
                frames,
                has_all_frames,
                matched_breakpoint_ids,
            } => {
                self.on_thread_stopped(
                    process,
                    thread,
                    exception,
                    faulting_address,
                    frames,
                    has_all_frames,
                    matched_breakpoint_ids,
                )
                .await
            }
            Notification::ModuleLoaded { process, name, build_id, base } => {
                let mut system = self.system.lock().await;
                if let Some(target_id) = self.target_owning_process(&system, process) {
                    if let Some(proc) = system.target_mut(target_id).and_then(|t| t.process_mut()) {
                        proc.on_module_loaded(dbg_core::process::Module { name, build_id, base });
                    }
                }
                Ok(None)
            }
            Notification::IoOutput { process, stream, data } => {
                let mut system = self.system.lock().await;
                if let Some(target_id) = self.target_owning_process(&system, process) {
                    if let Some(proc) = system.target_mut(target_id).and_then(|t| t.process_mut()) {
                        let stream = match stream {
                            WireIoStream::Stdout => dbg_core::process::IoStream::Stdout,
                            WireIoStream::Stderr => dbg_core::process::IoStream::Stderr,
                        };
                        proc.on_stdio(stream, &data);
                    }
                }
                Ok(None)
            }
            Notification::LimboProcesses { processes } => Ok(Some(self.present_limbo_processes(processes))),
        }
    }

    fn target_owning_process(&self, system: &System, koid: Koid) -> Option<TargetId> {
        system
            .targets()
            .iter()
            .find(|t| t.process().map(Process::koid) == Some(koid))
            .map(|t| t.id())
    }

    /// Reconnect presentation (spec §2 supplement,
    /// `HandleProcessesInLimbo`): lists crashed processes waiting in the
    /// agent's limbo queue so the user can `attach` to one explicitly.
    fn present_limbo_processes(&self, processes: Vec<LimboProcess>) -> OutputBuffer {
        let mut out = OutputBuffer::new();
        if processes.is_empty() {
            return out;
        }
        out.append(Span::heading("Processes waiting in limbo:\n"));
        for process in processes {
            out.append(Span::new(Syntax::Comment, format!("  {} ", process.koid)));
            out.append(Span::new(Syntax::Variable, process.name));
            out.append_newline();
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    async fn on_thread_stopped(
        &mut self,
        process: Koid,
        thread: Koid,
        exception: dbg_core::thread::ExceptionKind,
        faulting_address: Option<u64>,
        frames: Vec<dbg_core::protocol::WireFrame>,
        has_all_frames: bool,
        matched_breakpoint_ids: Vec<u32>,
    ) -> Result<Option<OutputBuffer>> {
        let stop_info = self
            .stop_dispatch
            .on_thread_stopped(
                process,
                thread,
                exception,
                faulting_address,
                frames,
                has_all_frames,
                matched_breakpoint_ids,
            )
            .await?;
        let Some(stop_info) = stop_info else {
            return Ok(None);
        };

        let system = self.system.lock().await;
        let target_id = self
            .target_owning_process(&system, process)
            .ok_or_else(|| Error::NotFound(format!("process {process}")))?;
        drop(system);

        let thread_id = self.thread_id_for(target_id, thread);
        self.set_active_target(target_id);
        self.set_active_thread(target_id, thread_id);
        self.set_active_frame(target_id, thread_id, 0);
        self.active.breakpoint = self.pick_active_breakpoint(process, &stop_info).await;

        let system = self.system.lock().await;
        let total_targets = system.targets().iter().filter(|t| t.state() == TargetState::Running).count();
        let total_threads_in_process = system
            .targets()
            .iter()
            .find(|t| t.id() == target_id)
            .and_then(|t| t.process())
            .map(|p| p.threads().count())
            .unwrap_or(1);
        let frame0 = system
            .targets()
            .iter()
            .find(|t| t.id() == target_id)
            .and_then(|t| t.process())
            .and_then(|p| p.thread(thread))
            .and_then(|t| t.stack().frame(0).ok().cloned());
        drop(system);

        let hit_breakpoints = self.hit_breakpoint_ids(process, &stop_info).await;
        let mut out = format::format_stop(&StopContext {
            target_id,
            thread_id,
            total_targets,
            total_threads_in_process,
            exception,
            details: &stop_info.details,
            frame0: frame0.as_ref(),
            hit_breakpoints: &hit_breakpoints,
        });
        let frame_pc = frame0.as_ref().map(|f| f.pc).unwrap_or(0);
        out.extend(self.evaluate_display_expressions(target_id, thread, thread_id, process, frame_pc).await);
        Ok(Some(out))
    }

    /// The non-internal breakpoint ids whose installed address matched
    /// this stop, used both for "on bp N,M" display and for picking the
    /// new active breakpoint.
    async fn hit_breakpoint_ids(&self, process: Koid, stop: &StopInfo) -> Vec<BreakpointId> {
        if stop.matched_breakpoint_locations.is_empty() {
            return Vec::new();
        }
        let system = self.system.lock().await;
        let mut ids: Vec<BreakpointId> = system
            .breakpoints()
            .iter()
            .filter(|bp| !bp.is_internal())
            .filter(|bp| {
                bp.locations()
                    .iter()
                    .any(|loc| loc.process == process && stop.matched_breakpoint_locations.contains(&loc.address))
            })
            .map(|bp| bp.id())
            .collect();
        ids.sort_by_key(|id| id.get());
        ids
    }

    /// Spec §4.8 point 2: "the highest-id non-internal breakpoint among
    /// the hit set (the most-recently-added wins ties)". Leaves the active
    /// breakpoint unchanged when nothing in the hit set was a real
    /// (non-internal) breakpoint match.
    async fn pick_active_breakpoint(&self, process: Koid, stop: &StopInfo) -> BreakpointId {
        let ids = self.hit_breakpoint_ids(process, stop).await;
        ids.into_iter().max_by_key(|id| id.get()).unwrap_or(self.active.breakpoint)
    }

    /// A Breakpoint's scope references a Thread that was just destroyed
    /// (spec §8 boundary behavior): auto-disable it system-wide. Returns
    /// the ids of breakpoints disabled this way, for the caller to warn
    /// about.
    pub async fn on_thread_destroyed_for_breakpoints(
        &mut self,
        target: TargetId,
        thread: ThreadId,
    ) -> Vec<BreakpointId> {
        let mut system = self.system.lock().await;
        let mut disabled = Vec::new();
        for breakpoint in system.breakpoints_mut() {
            if breakpoint.settings().scope == BreakpointScope::Thread(target, thread) {
                breakpoint.on_scope_thread_destroyed(target, thread);
                disabled.push(breakpoint.id());
            }
        }
        disabled
    }

    /// `Launch`/`Attach` success path, shared by the `run`/`attach` verbs:
    /// commits `process` onto `target`.
    pub async fn commit_process(&mut self, target: TargetId, process: Process) -> Result<()> {
        let mut system = self.system.lock().await;
        let target_ref = system
            .target_mut(target)
            .ok_or_else(|| Error::NotFound(format!("target {target}")))?;
        target_ref.commit_process(process);
        Ok(())
    }
}

#[cfg(test)]
#[path = "console_context_tests.rs"]
mod tests;
