//! `Until` (spec §4.5): behaves like a transient, one-shot, multi-location
//! breakpoint. `init` resolves every given [`InputLocation`] to addresses
//! and asks [`TransientBreakpoints`] to install an internal breakpoint
//! there; the controller itself just watches for the PC landing on one of
//! its own addresses and stops — the agent-side breakpoint is what
//! actually produces the stop rather than free-running past the target.

use async_trait::async_trait;
use dbg_core::breakpoint::InputLocation;
use dbg_core::error::Result;
use dbg_core::protocol::ResumeMode;
use dbg_core::thread::StopInfo;
use std::collections::HashSet;

use super::{ControllerEnv, Decision, SharedTransientBreakpoints, ThreadController};

pub struct UntilController {
    locations: Vec<InputLocation>,
    breakpoints: SharedTransientBreakpoints,
    addresses: HashSet<u64>,
    handle: Option<u64>,
}

impl UntilController {
    pub fn new(locations: Vec<InputLocation>, breakpoints: SharedTransientBreakpoints) -> Self {
        Self { locations, breakpoints, addresses: HashSet::new(), handle: None }
    }
}

#[async_trait]
impl ThreadController for UntilController {
    async fn init(&mut self, env: &mut ControllerEnv<'_>) -> Result<()> {
        let mut addresses = HashSet::new();
        for location in &self.locations {
            for addr in env.symbols.resolve_location(env.process.get(), location).await? {
                addresses.insert(addr);
            }
        }
        let handle = self
            .breakpoints
            .install(env.process, addresses.iter().copied().collect())
            .await?;
        self.addresses = addresses;
        self.handle = Some(handle);
        Ok(())
    }

    async fn on_thread_stopped(&mut self, env: &mut ControllerEnv<'_>, _stop: &StopInfo) -> Result<Decision> {
        let pc = env.thread.stack().frame(0)?.pc;
        if self.addresses.contains(&pc) {
            Ok(Decision::Stop)
        } else {
            Ok(Decision::Continue)
        }
    }

    fn get_resume_mode(&self) -> ResumeMode {
        ResumeMode::Continue
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            let breakpoints = self.breakpoints.clone();
            tokio::spawn(async move { breakpoints.remove(handle).await });
        }
    }

    fn name(&self) -> &'static str {
        "until"
    }
}

#[cfg(test)]
#[path = "until_tests.rs"]
mod tests;
