//! `StepInto` (spec §4.5): steps by source line, descending into any call.
//! Landing somewhere with no symbols steps back out automatically unless
//! `stop_on_no_symbols` is set; landing inside a function's prologue first
//! steps over the prologue before reporting the stop.

use async_trait::async_trait;
use dbg_core::error::{Error, Result};
use dbg_core::protocol::ResumeMode;
use dbg_core::thread::StopInfo;

use super::step_range::StepRangeController;
use super::{ControllerEnv, Decision, ThreadController};

pub struct StepIntoController {
    stop_on_no_symbols: bool,
    range: Option<StepRangeController>,
    inner: Option<Box<dyn ThreadController>>,
}

impl StepIntoController {
    pub fn new(stop_on_no_symbols: bool) -> Self {
        Self { stop_on_no_symbols, range: None, inner: None }
    }

    /// After landing outside the current range: either install a nested
    /// controller to keep stepping (no symbols, or inside a prologue), or
    /// decide this is a real stop.
    async fn settle(&mut self, env: &mut ControllerEnv<'_>) -> Result<Decision> {
        let pc = env.thread.stack().frame(0)?.pc;
        if let Some(range) = &self.range {
            let (begin, end) = range.range();
            if pc >= begin && pc < end {
                return Ok(Decision::Continue);
            }
        }
        match env.symbols.source_line_range(env.process.get(), pc).await {
            Err(Error::Symbol(_)) if !self.stop_on_no_symbols => {
                let physical_index = env.thread.stack().physical_index_of(0)?;
                let mut finish = super::FinishPhysicalController::new(physical_index);
                finish.init(env).await?;
                self.inner = Some(Box::new(finish));
                Ok(Decision::KeepSteppingWithNewPlan)
            }
            Err(err) => Err(err),
            Ok(_) => {
                if let Some(prologue) = env.symbols.prologue(env.process.get(), pc).await? {
                    if pc >= prologue.begin && pc < prologue.end {
                        self.range = Some(StepRangeController::new(pc, prologue.end));
                        return Ok(Decision::Continue);
                    }
                }
                Ok(Decision::Stop)
            }
        }
    }
}

#[async_trait]
impl ThreadController for StepIntoController {
    async fn init(&mut self, env: &mut ControllerEnv<'_>) -> Result<()> {
        let pc = env.thread.stack().frame(0)?.pc;
        let (begin, end) = env.symbols.source_line_range(env.process.get(), pc).await?;
        self.range = Some(StepRangeController::new(begin, end));
        Ok(())
    }

    async fn on_thread_stopped(&mut self, env: &mut ControllerEnv<'_>, stop: &StopInfo) -> Result<Decision> {
        if let Some(mut inner) = self.inner.take() {
            let decision = inner.on_thread_stopped(env, stop).await?;
            match decision {
                Decision::Continue | Decision::KeepSteppingWithNewPlan => {
                    self.inner = Some(inner);
                    Ok(decision)
                }
                Decision::Stop | Decision::StopAndReport => self.settle(env).await,
            }
        } else if let Some(range) = &mut self.range {
            match range.on_thread_stopped(env, stop).await? {
                Decision::Continue => Ok(Decision::Continue),
                _ => self.settle(env).await,
            }
        } else {
            self.settle(env).await
        }
    }

    fn get_resume_mode(&self) -> ResumeMode {
        if let Some(inner) = &self.inner {
            inner.get_resume_mode()
        } else if let Some(range) = &self.range {
            range.get_resume_mode()
        } else {
            ResumeMode::StepInstruction
        }
    }

    fn cancel(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.cancel();
        }
    }

    fn name(&self) -> &'static str {
        "step-into"
    }
}

#[cfg(test)]
#[path = "step_into_tests.rs"]
mod tests;
