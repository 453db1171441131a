//! `StepIntoSpecific` (spec §4.5): a specialized step-over whose range ends
//! exactly at a known call instruction. Once the PC reaches that address it
//! issues one `StepInstruction` to land inside the callee, then stops.

use async_trait::async_trait;
use dbg_core::error::Result;
use dbg_core::protocol::ResumeMode;
use dbg_core::thread::StopInfo;

use super::{ControllerEnv, Decision, ThreadController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    RunningToCall,
    SteppedIntoCall,
}

pub struct StepIntoSpecificController {
    begin: u64,
    call_address: u64,
    state: State,
}

impl StepIntoSpecificController {
    pub fn new(begin: u64, call_address: u64) -> Self {
        Self { begin, call_address, state: State::RunningToCall }
    }
}

#[async_trait]
impl ThreadController for StepIntoSpecificController {
    async fn init(&mut self, _env: &mut ControllerEnv<'_>) -> Result<()> {
        Ok(())
    }

    async fn on_thread_stopped(&mut self, env: &mut ControllerEnv<'_>, _stop: &StopInfo) -> Result<Decision> {
        let pc = env.thread.stack().frame(0)?.pc;
        match self.state {
            State::RunningToCall if pc == self.call_address => {
                self.state = State::SteppedIntoCall;
                Ok(Decision::Continue)
            }
            State::RunningToCall => Ok(Decision::Continue),
            State::SteppedIntoCall => Ok(Decision::Stop),
        }
    }

    fn get_resume_mode(&self) -> ResumeMode {
        match self.state {
            State::RunningToCall => {
                ResumeMode::StepRange { begin_inclusive: self.begin, end_exclusive: self.call_address }
            }
            State::SteppedIntoCall => ResumeMode::StepInstruction,
        }
    }

    fn name(&self) -> &'static str {
        "step-into-specific"
    }
}

#[cfg(test)]
#[path = "step_into_specific_tests.rs"]
mod tests;
