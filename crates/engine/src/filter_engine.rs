//! Autoattach-on-filter-match (spec §4.2/§4.6).
//!
//! A pure function over [`System`]: given a newly-started process the agent
//! reported, find whether any [`Filter`] matches it and, if so, attach it
//! to an unused or fresh [`Target`]. Tie-break decision (spec §9 Open
//! Question #2): when multiple filters match, only the lowest `FilterId`
//! is considered to have triggered the attach — current behavior, per the
//! original, "triggers one attach and ignores the rest."

use dbg_core::id::{JobContextId, Koid, TargetId};
use dbg_core::process::Process;
use dbg_core::system::System;
use dbg_core::target::{StartOrigin, TargetState};

pub struct FilterEngine;

impl FilterEngine {
    /// Returns the `Target` the process was attached to, if any filter
    /// matched.
    pub fn on_process_starting(
        system: &mut System,
        koid: Koid,
        name: &str,
        url: Option<&str>,
        reported_under: Option<JobContextId>,
    ) -> Option<TargetId> {
        let matched = system
            .filters()
            .iter()
            .filter(|f| f.matches(name, url, reported_under))
            .min_by_key(|f| f.id().get())?
            .id();
        tracing::debug!(filter = matched.get(), process = koid.get(), "filter matched, autoattaching");

        let target_id = system.unused_or_new_target();
        let target = system.target_mut(target_id)?;
        if target.begin_pending(TargetState::Attaching).is_ok() {
            target.commit_process(Process::new(koid, name.to_string(), StartOrigin::Attach));
        }
        Some(target_id)
    }
}

#[cfg(test)]
#[path = "filter_engine_tests.rs"]
mod tests;
