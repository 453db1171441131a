//! `FinishPhysical` (spec §4.5): steps until the thread is back in the
//! physical frame that called `target_physical_index`, comparing SP
//! identity rather than the return address so it tolerates recursion.

use async_trait::async_trait;
use dbg_core::error::{Error, Result};
use dbg_core::protocol::ResumeMode;
use dbg_core::thread::StopInfo;

use super::{ControllerEnv, Decision, ThreadController};

pub struct FinishPhysicalController {
    target_physical_index: usize,
    parent_sp: Option<u64>,
}

impl FinishPhysicalController {
    /// `target_physical_index` is the physical frame to finish out of
    /// (from [`dbg_core::stack::Stack::physical_index_of`] — works the same
    /// whether the selected unified frame was itself inline or physical).
    pub fn new(target_physical_index: usize) -> Self {
        Self { target_physical_index, parent_sp: None }
    }
}

#[async_trait]
impl ThreadController for FinishPhysicalController {
    async fn init(&mut self, env: &mut ControllerEnv<'_>) -> Result<()> {
        let parent_physical_index = self.target_physical_index + 1;
        let parent_sp = env
            .thread
            .stack()
            .frames()
            .iter()
            .find(|f| f.is_physical() && f.physical_index == parent_physical_index)
            .map(|f| f.sp)
            .ok_or_else(|| {
                Error::WrongState(
                    "finish requires the caller's frame, which is not yet synced".into(),
                )
            })?;
        self.parent_sp = Some(parent_sp);
        Ok(())
    }

    async fn on_thread_stopped(&mut self, env: &mut ControllerEnv<'_>, _stop: &StopInfo) -> Result<Decision> {
        let parent_sp = self.parent_sp.ok_or_else(|| {
            Error::WrongState("finish controller used before init completed".into())
        })?;
        let current_sp = env.thread.stack().frame(0)?.sp;
        if current_sp == parent_sp {
            Ok(Decision::Stop)
        } else {
            Ok(Decision::Continue)
        }
    }

    fn get_resume_mode(&self) -> ResumeMode {
        ResumeMode::StepInstruction
    }

    fn name(&self) -> &'static str {
        "finish"
    }
}

#[cfg(test)]
#[path = "finish_tests.rs"]
mod tests;
