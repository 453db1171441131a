//! Top-level per-stop orchestration (spec §4.3): the processing order a
//! `ThreadStopped` notification goes through before the console ever sees
//! it.
//!
//! 1. Build a unified stack from the agent's physical frames
//!    ([`crate::stack_builder`]) and apply it to the `Thread`.
//! 2. Dispatch matched breakpoint hits ([`crate::breakpoint_engine`]),
//!    applying `hit_mult`/conditions.
//! 3. Consult the thread's [`ControllerStack`].
//! 4. Resume silently on `Decision::Continue`, or notify observers and
//!    report the stop otherwise.

use std::collections::HashMap;
use std::sync::Arc;

use dbg_core::error::{Error, Result};
use dbg_core::id::{Koid, TargetId};
use dbg_core::protocol::{Request, ResumeMode, WireFrame};
use dbg_core::symbol_service::SymbolService;
use dbg_core::system::System;
use dbg_core::thread::{ExceptionDetails, ExceptionKind, StopInfo, Thread};
use dbg_core::transport::AgentTransport;
use tokio::sync::Mutex;

use crate::breakpoint_engine::BreakpointEngine;
use crate::controller::{ControllerEnv, ControllerStack, Decision, ThreadController};
use crate::stack_builder::build_unified_stack;

fn find_thread_mut(system: &mut System, process: Koid, thread: Koid) -> Option<&mut Thread> {
    let target_ids: Vec<TargetId> = system.targets().iter().map(|t| t.id()).collect();
    for id in target_ids {
        if let Some(target) = system.target_mut(id) {
            if let Some(proc) = target.process_mut() {
                if proc.koid() == process {
                    return proc.thread_mut(thread);
                }
            }
        }
    }
    None
}

/// Drives `ControllerStack`s and resumes/reports threads as stops arrive.
/// One instance is shared across the whole client session.
pub struct StopDispatch {
    system: Arc<Mutex<System>>,
    transport: Arc<dyn AgentTransport>,
    breakpoints: Arc<BreakpointEngine>,
    symbols: Arc<dyn SymbolService>,
    stacks: Mutex<HashMap<Koid, ControllerStack>>,
}

impl StopDispatch {
    pub fn new(
        system: Arc<Mutex<System>>,
        transport: Arc<dyn AgentTransport>,
        breakpoints: Arc<BreakpointEngine>,
        symbols: Arc<dyn SymbolService>,
    ) -> Self {
        Self { system, transport, breakpoints, symbols, stacks: Mutex::new(HashMap::new()) }
    }

    /// Pushes a new controller onto `thread`'s stack, running its `init`.
    /// Used by verb handlers (`next`, `step`, `finish`, `until`, ...) to
    /// start a stepping plan.
    pub async fn push_controller(
        &self,
        process: Koid,
        thread: Koid,
        controller: Box<dyn ThreadController>,
    ) -> Result<()> {
        let mut system = self.system.lock().await;
        let thread_ref = find_thread_mut(&mut system, process, thread)
            .ok_or_else(|| Error::NotFound(format!("thread {thread}")))?;
        let mut env = ControllerEnv { process, thread: thread_ref, symbols: self.symbols.as_ref() };
        let mut stacks = self.stacks.lock().await;
        let stack = stacks.entry(thread).or_default();
        stack.push(controller, &mut env).await
    }

    /// The resume mode the thread's topmost controller would request right
    /// now. A verb handler reads this right after [`Self::push_controller`]
    /// to issue the initial `Resume` that actually starts the plan —
    /// pushing alone never resumes a thread.
    pub async fn top_resume_mode(&self, thread: Koid) -> Option<ResumeMode> {
        let stacks = self.stacks.lock().await;
        stacks.get(&thread).and_then(|s| s.top_resume_mode())
    }

    /// `CancelAllThreadControllers` (spec §4.5, `pause --clear-state`).
    pub async fn cancel_all(&self, thread: Koid) {
        let mut stacks = self.stacks.lock().await;
        if let Some(stack) = stacks.get_mut(&thread) {
            stack.cancel_all();
        }
    }

    /// Processes one `ThreadStopped` notification end to end. Returns
    /// `Some(StopInfo)` when the thread actually stopped and should be
    /// reported, `None` when it was silently resumed.
    #[allow(clippy::too_many_arguments)]
    pub async fn on_thread_stopped(
        &self,
        process: Koid,
        thread: Koid,
        exception: ExceptionKind,
        faulting_address: Option<u64>,
        frames: Vec<WireFrame>,
        has_all_frames: bool,
        matched_breakpoint_ids: Vec<u32>,
    ) -> Result<Option<StopInfo>> {
        let stack = build_unified_stack(process, frames, has_all_frames, self.symbols.as_ref()).await?;
        let pc = stack.frame(0).map(|f| f.pc).unwrap_or(0);

        // The agent reports which breakpoint ids it matched; the address
        // they matched at is always the pc the exception landed on.
        let matched_addresses: Vec<u64> = if matched_breakpoint_ids.is_empty() { Vec::new() } else { vec![pc] };

        let reported = if matched_addresses.is_empty() {
            Vec::new()
        } else {
            self.breakpoints
                .dispatch_hit(process, thread, pc, &matched_addresses, self.symbols.as_ref())
                .await?
        };

        let stop_info = StopInfo {
            exception,
            details: ExceptionDetails { faulting_address, description: None },
            matched_breakpoint_locations: matched_addresses.clone(),
        };

        // A hit breakpoint nobody claimed (condition false, hit_mult not
        // yet reached) resumes silently, unless a controller plan is in
        // flight and wants a say (e.g. `Until`'s transient breakpoint).
        let silent_breakpoint_miss = !matched_addresses.is_empty() && reported.is_empty();

        let mut system = self.system.lock().await;
        let mut stacks = self.stacks.lock().await;

        let thread_ref = find_thread_mut(&mut system, process, thread)
            .ok_or_else(|| Error::NotFound(format!("thread {thread}")))?;
        thread_ref.apply_stop(stack);

        let controller_stack = stacks.entry(thread).or_default();
        let (decision, resume_mode) = if silent_breakpoint_miss && controller_stack.is_empty() {
            (Decision::Continue, Some(ResumeMode::Continue))
        } else {
            let mut env = ControllerEnv { process, thread: &mut *thread_ref, symbols: self.symbols.as_ref() };
            controller_stack.on_thread_stopped(&mut env, &stop_info).await?
        };

        match decision {
            Decision::Continue => {
                let mode = resume_mode.unwrap_or(ResumeMode::Continue);
                drop(stacks);
                drop(system);
                self.transport.send(Request::Resume { thread, mode }).await?;
                Ok(None)
            }
            Decision::Stop | Decision::StopAndReport => {
                thread_ref.notify_stopped(&stop_info);
                Ok(Some(stop_info))
            }
            Decision::KeepSteppingWithNewPlan => {
                unreachable!("ControllerStack::on_thread_stopped resolves this internally")
            }
        }
    }
}

#[cfg(test)]
#[path = "stop_dispatch_tests.rs"]
mod tests;
