//! The `ThreadController` state-machine interface (spec §4.5) and the
//! per-thread controller stack that drives it.
//!
//! Controllers compose by explicit nesting rather than a class hierarchy
//! (spec §9, "Controller composition"): a controller that wants sub-behavior
//! holds a boxed inner controller and forwards to it, overriding the inner
//! decision when its own precondition fires.

mod finish;
mod jump_to;
mod step_into;
mod step_into_specific;
mod step_over;
mod step_range;
pub mod steps_prompt;
mod until;

pub use finish::FinishPhysicalController;
pub use jump_to::JumpToController;
pub use step_into::StepIntoController;
pub use step_into_specific::StepIntoSpecificController;
pub use step_over::StepOverController;
pub use step_range::StepRangeController;
pub use until::UntilController;

use async_trait::async_trait;
use dbg_core::error::Result;
use dbg_core::id::Koid;
use dbg_core::protocol::ResumeMode;
use dbg_core::thread::{StopInfo, Thread};
use std::sync::Arc;

/// Decision a controller makes after observing a stop (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Resume the thread using [`ThreadController::get_resume_mode`].
    Continue,
    /// Stop; the controller is popped and `OnThreadStopped` fires.
    Stop,
    /// Like `Stop`, but the caller should additionally report/echo the
    /// decision explicitly (used by synchronous operations like `JumpTo`
    /// that never actually resumed).
    StopAndReport,
    /// The controller replaced its own plan (e.g. stepped into a callee
    /// and installed a nested `FinishPhysical`); the stack should be
    /// re-consulted from the top again without firing `OnThreadStopped`.
    KeepSteppingWithNewPlan,
}

/// Everything a controller needs about the thread it is driving. Borrowed
/// for the duration of a single `init`/`on_thread_stopped` call.
pub struct ControllerEnv<'a> {
    pub process: Koid,
    pub thread: &'a mut Thread,
    pub symbols: &'a dyn dbg_core::symbol_service::SymbolService,
}

/// Seam a controller uses to ask the agent to stop the process at
/// addresses that will not necessarily be reached by single-stepping —
/// `Until`'s transient multi-location breakpoint (spec §4.5) and
/// `FinishPhysical`'s optional "breakpoint at the return address" fast
/// path. Implemented by [`crate::breakpoint_engine::BreakpointEngine`]
/// using an internal (invisible, spec §4.6) `Breakpoint`.
#[async_trait]
pub trait TransientBreakpoints: Send + Sync {
    /// Installs a one-shot internal breakpoint at `addresses` in
    /// `process`, returning a handle to later match against
    /// `StopInfo::matched_breakpoint_locations` or to remove early.
    async fn install(&self, process: Koid, addresses: Vec<u64>) -> Result<u64>;

    /// Removes a previously-installed transient breakpoint. A no-op if it
    /// already auto-removed on hit.
    async fn remove(&self, handle: u64);
}

/// A state machine driving the next few stop/resume cycles of a thread to
/// implement a stepping primitive (spec §4.5).
#[async_trait]
pub trait ThreadController: Send {
    /// Issued when pushed onto the controller stack. May perform a
    /// synchronous stack sync or symbol query.
    async fn init(&mut self, env: &mut ControllerEnv<'_>) -> Result<()>;

    /// Called on each stop while the controller is active.
    async fn on_thread_stopped(&mut self, env: &mut ControllerEnv<'_>, stop: &StopInfo) -> Result<Decision>;

    /// The resume style requested if the controller's last decision was
    /// `Decision::Continue`.
    fn get_resume_mode(&self) -> ResumeMode;

    /// Drops any nested sub-controller; called before popping.
    fn cancel(&mut self) {}

    /// Short name for logging/debugging (e.g. `"step-over"`).
    fn name(&self) -> &'static str;
}

/// Per-thread LIFO stack of active controllers (spec §3, "Owns a stack of
/// active ThreadControllers (most recent on top)").
#[derive(Default)]
pub struct ControllerStack {
    controllers: Vec<Box<dyn ThreadController>>,
    generation: u64,
}

impl ControllerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The resume mode the topmost controller would request right now —
    /// used by a verb handler to kick off the very first resume after
    /// `push`, since the thread is still stopped at that point and
    /// `on_thread_stopped` hasn't run yet to produce one itself.
    pub fn top_resume_mode(&self) -> Option<ResumeMode> {
        self.controllers.last().map(|c| c.get_resume_mode())
    }

    /// Pushes a controller after calling its `init`. If `init` fails the
    /// controller is not pushed.
    pub async fn push(
        &mut self,
        mut controller: Box<dyn ThreadController>,
        env: &mut ControllerEnv<'_>,
    ) -> Result<()> {
        controller.init(env).await?;
        self.controllers.push(controller);
        Ok(())
    }

    /// Consults controllers top-down; the first non-`Continue` decision
    /// wins (spec §4.3 step 2). Popped controllers have `cancel` called
    /// before being dropped, in LIFO order (spec §4.5 "Termination").
    ///
    /// Returns the winning decision and, when it's `Continue`, the resume
    /// mode the deciding (topmost still-active) controller requested.
    pub async fn on_thread_stopped(
        &mut self,
        env: &mut ControllerEnv<'_>,
        stop: &StopInfo,
    ) -> Result<(Decision, Option<ResumeMode>)> {
        loop {
            let Some(mut top) = self.controllers.pop() else {
                return Ok((Decision::Stop, None));
            };
            let decision = top.on_thread_stopped(env, stop).await?;
            match decision {
                Decision::Continue => {
                    let mode = top.get_resume_mode();
                    self.controllers.push(top);
                    return Ok((Decision::Continue, Some(mode)));
                }
                Decision::KeepSteppingWithNewPlan => {
                    // `top` already replaced its own inner plan; keep it on
                    // the stack and re-consult from here (it is the
                    // topmost controller again).
                    self.controllers.push(top);
                    continue;
                }
                Decision::Stop | Decision::StopAndReport => {
                    top.cancel();
                    // `top` is dropped (popped); controllers further down
                    // never see this stop — spec §4.3 "the first
                    // non-Continue decision wins".
                    return Ok((decision, None));
                }
            }
        }
    }

    /// `CancelAllThreadControllers`: unconditionally discards the stack
    /// (used by `pause --clear-state`, spec §4.5). Bumps the generation
    /// counter so a controller whose async `init` resolves afterward can
    /// detect the clear and no-op instead of pushing itself onto a stack
    /// that moved on without it (spec §9 Open Question #3).
    pub fn cancel_all(&mut self) {
        for mut controller in self.controllers.drain(..).rev() {
            controller.cancel();
        }
        self.generation += 1;
    }
}

/// A snapshot of the generation a caller observed before starting an
/// async `init`; used to detect a `cancel_all` race (spec §9 decision #3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(pub u64);

/// Shared handle controllers that need the transient-breakpoint seam are
/// constructed with. `Arc` because `Until` may outlive the call that
/// constructed it and the same `BreakpointEngine` is shared across threads
/// in the same process.
pub type SharedTransientBreakpoints = Arc<dyn TransientBreakpoints>;
