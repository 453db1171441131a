//! Job-noun verbs (spec §4.8): `job attach <koid>`/`job detach` and the
//! Job noun's listing/selection.
//!
//! There is no wire request that attaches a JobContext directly — the agent
//! only learns about a job through `JobFilter` (sent once a `Filter` scoped
//! to this job is created, see `breakpoint::set_filter`). `job attach` is
//! therefore local bookkeeping: it commits the JobContext so later `filter
//! --job=N` calls have somewhere to scope to, mirroring how `Target`'s
//! config can be set before any process is actually running.

use dbg_core::error::{Error, Result};
use dbg_core::id::{JobContextId, Koid};

use crate::command::BoundCommand;
use crate::console_context::ConsoleContext;
use crate::format::{render_job_context, OutputBuffer};

async fn runnable_job_context(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<JobContextId> {
    let existing = bound.job_context;
    let state = {
        let system = ctx.system().lock().await;
        system.job_context(existing).map(|j| j.state())
    };
    match state {
        Some(dbg_core::job_context::JobContextState::None) => Ok(existing),
        Some(_) | None => {
            let mut system = ctx.system().lock().await;
            let id = system.create_job_context();
            drop(system);
            ctx.set_active_job_context(id);
            Ok(id)
        }
    }
}

pub async fn attach(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("job attach requires a job koid".into()))?;
    let koid = Koid::new(raw.parse().map_err(|_| Error::Input(format!("invalid job koid: {raw}")))?);

    let id = runnable_job_context(bound, ctx).await?;
    let mut system = ctx.system().lock().await;
    let job = system
        .job_context_mut(id)
        .ok_or_else(|| Error::NotFound(format!("job {id}")))?;
    job.begin_attaching()?;
    job.commit_attached(koid, format!("job {koid}"));
    Ok(render_job_context(id.get(), job))
}

pub async fn detach(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let mut system = ctx.system().lock().await;
    let job = system
        .job_context_mut(bound.job_context)
        .ok_or_else(|| Error::NotFound(format!("job {}", bound.job_context)))?;
    job.detach();
    Ok(render_job_context(bound.job_context.get(), job))
}

pub async fn list_or_select(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let system = ctx.system().lock().await;
    if bound.listing_subject_had_index {
        let job = system
            .job_context(bound.job_context)
            .ok_or_else(|| Error::NotFound(format!("job {}", bound.job_context)))?;
        return Ok(render_job_context(bound.job_context.get(), job));
    }
    let mut out = OutputBuffer::new();
    for job in system.job_contexts() {
        out.extend(render_job_context(job.id().get(), job));
        out.append_newline();
    }
    Ok(out)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
