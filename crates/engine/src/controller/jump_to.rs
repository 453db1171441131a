//! `JumpTo` (spec §4.5): not a stepper. Writes the thread's PC register
//! directly and reports the new location without resuming. Modeled as a
//! `ThreadController` for interface uniformity with the rest of `steps`,
//! but a verb handler invokes it synchronously (`init` performs the
//! register write; the immediate `Decision::StopAndReport` from
//! `on_thread_stopped` is never actually reached through the stop-dispatch
//! path since the thread never resumes) rather than pushing it onto a
//! thread's controller stack.

use async_trait::async_trait;
use dbg_core::error::Result;
use dbg_core::protocol::{Request, ResumeMode};
use dbg_core::thread::StopInfo;
use dbg_core::transport::AgentTransport;
use std::sync::Arc;

use super::{ControllerEnv, Decision, ThreadController};

pub struct JumpToController {
    address: u64,
    transport: Arc<dyn AgentTransport>,
}

impl JumpToController {
    pub fn new(address: u64, transport: Arc<dyn AgentTransport>) -> Self {
        Self { address, transport }
    }

    /// Performs the jump: writes the PC register and returns the reply so
    /// the caller can re-sync the stack and report the new frame 0
    /// directly, without ever entering the controller stack.
    pub async fn jump(&self, thread: dbg_core::id::Koid) -> Result<()> {
        self.transport
            .send(Request::WriteRegisters { thread, values: vec![("pc".to_string(), self.address)] })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ThreadController for JumpToController {
    async fn init(&mut self, env: &mut ControllerEnv<'_>) -> Result<()> {
        self.jump(env.thread.koid()).await
    }

    async fn on_thread_stopped(&mut self, _env: &mut ControllerEnv<'_>, _stop: &StopInfo) -> Result<Decision> {
        Ok(Decision::StopAndReport)
    }

    fn get_resume_mode(&self) -> ResumeMode {
        ResumeMode::Continue
    }

    fn name(&self) -> &'static str {
        "jump-to"
    }
}

#[cfg(test)]
#[path = "jump_to_tests.rs"]
mod tests;
