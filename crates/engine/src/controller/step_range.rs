//! The shared range-stepping primitive `StepInto`/`StepOver` both build on
//! (spec §4.5): keep issuing `StepInstruction`/`StepRange` resumes while the
//! PC stays inside `[begin, end)`, stop as soon as it leaves.

use async_trait::async_trait;
use dbg_core::error::Result;
use dbg_core::protocol::ResumeMode;
use dbg_core::thread::StopInfo;

use super::{ControllerEnv, Decision, ThreadController};

/// Runs until the thread's PC leaves `[begin, end)`, then stops
/// unconditionally. Used standalone by nothing; `StepInto`/`StepOver` wrap
/// it and look at the frame once it stops to decide what to do next.
pub struct StepRangeController {
    begin: u64,
    end: u64,
}

impl StepRangeController {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    pub fn range(&self) -> (u64, u64) {
        (self.begin, self.end)
    }
}

#[async_trait]
impl ThreadController for StepRangeController {
    async fn init(&mut self, _env: &mut ControllerEnv<'_>) -> Result<()> {
        Ok(())
    }

    async fn on_thread_stopped(&mut self, env: &mut ControllerEnv<'_>, _stop: &StopInfo) -> Result<Decision> {
        let pc = env.thread.stack().frame(0)?.pc;
        if pc >= self.begin && pc < self.end {
            Ok(Decision::Continue)
        } else {
            Ok(Decision::Stop)
        }
    }

    fn get_resume_mode(&self) -> ResumeMode {
        ResumeMode::StepRange { begin_inclusive: self.begin, end_exclusive: self.end }
    }

    fn name(&self) -> &'static str {
        "step-range"
    }
}

#[cfg(test)]
#[path = "step_range_tests.rs"]
mod tests;
