//! `StepOver` (spec §4.5): steps by source line, stepping over any call
//! instead of descending into it — unless a "fragment" predicate says this
//! particular callee should be stopped in (the `steps` chooser, spec
//! supplement, §4.5's "stop in a specific subframe").

use async_trait::async_trait;
use dbg_core::error::Result;
use dbg_core::protocol::ResumeMode;
use dbg_core::thread::StopInfo;

use super::step_range::StepRangeController;
use super::{ControllerEnv, Decision, ThreadController};

type SubframePredicate = Box<dyn Fn(u64) -> bool + Send>;

pub struct StepOverController {
    begin: u64,
    end: u64,
    base_sp: Option<u64>,
    subframe_should_stop: Option<SubframePredicate>,
    inner: Option<Box<dyn ThreadController>>,
}

impl StepOverController {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end, base_sp: None, subframe_should_stop: None, inner: None }
    }

    /// Installs a predicate (keyed by callee entry pc) that says whether a
    /// particular call should be stopped in rather than stepped over —
    /// backs the `steps` interactive chooser (spec supplement).
    pub fn with_subframe_filter(mut self, predicate: SubframePredicate) -> Self {
        self.subframe_should_stop = Some(predicate);
        self
    }
}

#[async_trait]
impl ThreadController for StepOverController {
    async fn init(&mut self, env: &mut ControllerEnv<'_>) -> Result<()> {
        self.base_sp = Some(env.thread.stack().frame(0)?.sp);
        Ok(())
    }

    async fn on_thread_stopped(&mut self, env: &mut ControllerEnv<'_>, stop: &StopInfo) -> Result<Decision> {
        if let Some(mut inner) = self.inner.take() {
            let decision = inner.on_thread_stopped(env, stop).await?;
            return match decision {
                Decision::Continue | Decision::KeepSteppingWithNewPlan => {
                    self.inner = Some(inner);
                    Ok(decision)
                }
                Decision::Stop | Decision::StopAndReport => {
                    let pc = env.thread.stack().frame(0)?.pc;
                    if pc >= self.begin && pc < self.end {
                        Ok(Decision::Continue)
                    } else {
                        Ok(Decision::Stop)
                    }
                }
            };
        }

        let frame = env.thread.stack().frame(0)?;
        let pc = frame.pc;
        let sp = frame.sp;
        let base_sp = self.base_sp.unwrap_or(sp);

        if pc >= self.begin && pc < self.end {
            return Ok(Decision::Continue);
        }

        if sp < base_sp {
            // Deeper than when we started: a call was made.
            if self.subframe_should_stop.as_deref().is_some_and(|pred| pred(pc)) {
                return Ok(Decision::Stop);
            }
            let physical_index = env.thread.stack().physical_index_of(0)?;
            let mut finish = super::FinishPhysicalController::new(physical_index);
            finish.init(env).await?;
            self.inner = Some(Box::new(finish));
            return Ok(Decision::KeepSteppingWithNewPlan);
        }

        // Returned out of the function the line belongs to, or otherwise
        // left the tracked range by going shallower: report it.
        Ok(Decision::Stop)
    }

    fn get_resume_mode(&self) -> ResumeMode {
        if let Some(inner) = &self.inner {
            inner.get_resume_mode()
        } else {
            ResumeMode::StepRange { begin_inclusive: self.begin, end_exclusive: self.end }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.cancel();
        }
    }

    fn name(&self) -> &'static str {
        "step-over"
    }
}

#[cfg(test)]
#[path = "step_over_tests.rs"]
mod tests;
