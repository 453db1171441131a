//! Frame-noun listing/selection and the `stack` verb (spec §3, §4.4).

use dbg_core::error::{Error, Result};

use crate::command::BoundCommand;
use crate::console_context::ConsoleContext;
use crate::format::{render_frame, render_stack, OutputBuffer};

fn thread_koid(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<dbg_core::id::Koid> {
    ctx.thread_koid(bound.target, bound.thread)
        .ok_or_else(|| Error::NotRunning("no active thread".into()))
}

pub async fn stack(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let koid = thread_koid(bound, ctx)?;
    let system = ctx.system().lock().await;
    let target = system
        .target(bound.target)
        .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
    let process = target
        .process()
        .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?;
    let thread = process
        .thread(koid)
        .ok_or_else(|| Error::NotFound(format!("thread {}", bound.thread)))?;
    Ok(render_stack(thread.stack()))
}

pub async fn list_or_select(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let koid = thread_koid(bound, ctx)?;
    let system = ctx.system().lock().await;
    let target = system
        .target(bound.target)
        .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
    let process = target
        .process()
        .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?;
    let thread = process
        .thread(koid)
        .ok_or_else(|| Error::NotFound(format!("thread {}", bound.thread)))?;

    if bound.listing_subject_had_index {
        let frame = thread.stack().frame(bound.frame)?;
        return Ok(render_frame(bound.frame, frame));
    }
    Ok(render_stack(thread.stack()))
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
