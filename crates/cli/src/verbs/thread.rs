//! Thread-noun listing/selection (spec §4.8): threads have no dedicated
//! verb of their own — only `thread N <verb>` binding and `thread`/`thread N`
//! listing/selection, grounded in `console_context.cc`'s thread-table
//! iteration.

use dbg_core::error::{Error, Result};
use dbg_core::id::ThreadId;

use crate::command::BoundCommand;
use crate::console_context::ConsoleContext;
use crate::format::{render_thread_summary, OutputBuffer};

pub async fn list_or_select(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let system = ctx.system().lock().await;
    let target = system
        .target(bound.target)
        .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
    let process = target
        .process()
        .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?;

    if bound.listing_subject_had_index {
        let koid = ctx
            .thread_koid(bound.target, bound.thread)
            .ok_or_else(|| Error::NotFound(format!("thread {}", bound.thread)))?;
        let thread = process
            .thread(koid)
            .ok_or_else(|| Error::NotFound(format!("thread {}", bound.thread)))?;
        return Ok(render_thread_summary(bound.thread.get(), thread));
    }

    let mut rows: Vec<(ThreadId, &dbg_core::thread::Thread)> = process
        .threads()
        .filter_map(|thread| {
            ctx.thread_id_for_koid(bound.target, thread.koid()).map(|id| (id, thread))
        })
        .collect();
    rows.sort_by_key(|(id, _)| id.get());

    let mut out = OutputBuffer::new();
    for (id, thread) in rows {
        out.extend(render_thread_summary(id.get(), thread));
        out.append_newline();
    }
    Ok(out)
}

#[cfg(test)]
#[path = "thread_tests.rs"]
mod tests;
