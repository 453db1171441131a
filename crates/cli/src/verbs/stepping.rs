//! Stepping verbs (spec §4.5's `step`/`next`/`stepi`/`nexti`/`finish`/
//! `until`/`jump`, plus the `steps` interactive chooser), grounded in
//! `dbg_engine::controller`: a verb handler's job is just to build the
//! right controller, push it (or, for `jump`, drive it synchronously),
//! and send the `Resume` request its `get_resume_mode()` asks for —
//! `StopDispatch::push_controller` never resumes on its own.

use std::collections::HashSet;

use dbg_core::error::{Error, Result};
use dbg_core::id::Koid;
use dbg_core::protocol::{Reply, Request, ResumeMode};

use dbg_engine::controller::steps_prompt::{self, StepsChoice};
use dbg_engine::controller::{
    FinishPhysicalController, JumpToController, StepIntoController, StepOverController,
    StepRangeController, ThreadController, UntilController,
};

use crate::command::BoundCommand;
use crate::console_context::ConsoleContext;
use crate::format::{render_frame, OutputBuffer, Span, Syntax};
use crate::verbs::VerbOutcome;

use super::breakpoint::parse_location;

/// Resolves the koids and current frame-0 pc a stepping verb needs. Every
/// verb here operates on frame 0, never an inspected older frame — you
/// can't resume execution from frame 3 (spec §4.5).
async fn thread_context(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<(Koid, Koid, u64)> {
    let thread_koid = ctx
        .thread_koid(bound.target, bound.thread)
        .ok_or_else(|| Error::NotRunning("no active thread".into()))?;
    let system = ctx.system().lock().await;
    let target = system
        .target(bound.target)
        .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
    let process = target
        .process()
        .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?;
    let process_koid = process.koid();
    let thread = process
        .thread(thread_koid)
        .ok_or_else(|| Error::NotFound(format!("thread {}", bound.thread)))?;
    let pc = thread.stack().frame(0)?.pc;
    Ok((process_koid, thread_koid, pc))
}

fn unwrap_empty(reply: Reply) -> Result<()> {
    match reply {
        Reply::Ok(_) => Ok(()),
        Reply::Error { code, message } => Err(Error::Agent { status: code, message }),
    }
}

/// Pushes `controller` for `thread` (running its `init`), then issues the
/// `Resume` its post-init state asks for — pushing alone never resumes a
/// thread sitting stopped.
async fn push_and_resume(
    ctx: &ConsoleContext,
    process: Koid,
    thread: Koid,
    controller: impl ThreadController + 'static,
) -> Result<()> {
    ctx.stop_dispatch().push_controller(process, thread, Box::new(controller)).await?;
    let mode = ctx.stop_dispatch().top_resume_mode(thread).await.unwrap_or(ResumeMode::Continue);
    unwrap_empty(ctx.transport().send(Request::Resume { thread, mode }).await?)
}

fn stepping_started(label: &str) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{label}\n")));
    out
}

pub async fn step(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let (process, thread, pc) = thread_context(bound, ctx).await?;

    match bound.args.first() {
        None => {
            let stop_on_no_symbols = crate::command::has_switch(&bound.switches, "unsymbolized");
            push_and_resume(ctx, process, thread, StepIntoController::new(stop_on_no_symbols)).await?;
            Ok(stepping_started("stepping"))
        }
        Some(fragment) => {
            let (begin, end) = ctx.symbols().source_line_range(process.get(), pc).await?;
            let call_sites = ctx.symbols().call_sites_on_line(process.get(), pc).await?;
            let mut entry_addresses = HashSet::new();
            for call in &call_sites {
                let Some(destination) = &call.destination else { continue };
                if !destination.contains(fragment.as_str()) {
                    continue;
                }
                let location = dbg_core::breakpoint::InputLocation::Symbol(destination.clone());
                for addr in ctx.symbols().resolve_location(process.get(), &location).await? {
                    entry_addresses.insert(addr);
                }
            }
            let controller = StepOverController::new(begin, end)
                .with_subframe_filter(Box::new(move |landed_pc| entry_addresses.contains(&landed_pc)));
            push_and_resume(ctx, process, thread, controller).await?;
            Ok(stepping_started(&format!("stepping, stopping in calls matching `{fragment}`")))
        }
    }
}

pub async fn next(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let (process, thread, pc) = thread_context(bound, ctx).await?;
    let (begin, end) = ctx.symbols().source_line_range(process.get(), pc).await?;
    push_and_resume(ctx, process, thread, StepOverController::new(begin, end)).await?;
    Ok(stepping_started("stepping over"))
}

pub async fn stepi(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let (process, thread, pc) = thread_context(bound, ctx).await?;
    push_and_resume(ctx, process, thread, StepRangeController::new(pc, pc + 1)).await?;
    Ok(stepping_started("stepping one instruction"))
}

pub async fn nexti(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let (process, thread, pc) = thread_context(bound, ctx).await?;
    push_and_resume(ctx, process, thread, StepOverController::new(pc, pc + 1)).await?;
    Ok(stepping_started("stepping over one instruction"))
}

pub async fn finish(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let (process, thread, _pc) = thread_context(bound, ctx).await?;
    let physical_index = {
        let system = ctx.system().lock().await;
        let target = system
            .target(bound.target)
            .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
        let proc = target
            .process()
            .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?;
        let thread_ref = proc
            .thread(thread)
            .ok_or_else(|| Error::NotFound(format!("thread {}", bound.thread)))?;
        thread_ref.stack().physical_index_of(bound.frame)?
    };
    push_and_resume(ctx, process, thread, FinishPhysicalController::new(physical_index)).await?;
    Ok(stepping_started("finishing"))
}

pub async fn until(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    if bound.args.is_empty() {
        return Err(Error::Input("until requires a location".into()));
    }
    let (process, thread, _pc) = thread_context(bound, ctx).await?;
    let locations = bound.args.iter().map(|a| parse_location(a)).collect();
    let breakpoints = ctx.breakpoints().clone();
    push_and_resume(ctx, process, thread, UntilController::new(locations, breakpoints)).await?;
    Ok(stepping_started("running until the given location"))
}

pub async fn jump(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("jump requires an address".into()))?;
    let address = if let Some(hex) = raw.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).map_err(|_| Error::Input(format!("invalid address: {raw}")))?
    } else {
        raw.parse().map_err(|_| Error::Input(format!("invalid address: {raw}")))?
    };

    let thread_koid = ctx
        .thread_koid(bound.target, bound.thread)
        .ok_or_else(|| Error::NotRunning("no active thread".into()))?;
    let controller = JumpToController::new(address, ctx.transport().clone());
    controller.jump(thread_koid).await?;

    let mut system = ctx.system().lock().await;
    let target = system
        .target_mut(bound.target)
        .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
    let proc = target
        .process_mut()
        .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?;
    let thread = proc
        .thread_mut(thread_koid)
        .ok_or_else(|| Error::NotFound(format!("thread {}", bound.thread)))?;

    let mut frame0 = thread.stack().frame(0)?.clone();
    frame0.pc = address;
    frame0.is_inline = false;
    thread.stack_mut().replace_top(dbg_core::stack::Stack::new(vec![frame0.clone()], false));

    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, "jumped to "));
    out.extend(render_frame(0, &frame0));
    out.append_newline();
    Ok(out)
}

/// Holds what's needed to resume the `steps` interactive chooser on the
/// next command line (spec supplement, `verb_steps.cc`'s `CompleteSteps`).
pub struct StepsPromptState {
    process: Koid,
    thread: Koid,
    expected_pc: u64,
    choices: Vec<StepsChoice>,
}

pub async fn steps(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<VerbOutcome> {
    let (process, thread, pc) = thread_context(bound, ctx).await?;
    let call_sites = ctx.symbols().call_sites_on_line(process.get(), pc).await?;
    let choices = steps_prompt::build_choices(pc, &call_sites);

    if choices.is_empty() {
        let mut out = OutputBuffer::new();
        out.append(Span::new(Syntax::Warning, "no calls on the current line\n"));
        return Ok(VerbOutcome::Done(out));
    }
    if choices.len() == 1 {
        let controller = steps_prompt::controller_for_choice(pc, &choices[0]);
        push_and_resume(ctx, process, thread, controller).await?;
        return Ok(VerbOutcome::Done(stepping_started("stepping into the only call on this line")));
    }

    let mut out = OutputBuffer::new();
    out.append(Span::heading("Which call do you want to step into?\n"));
    for choice in &choices {
        let destination = choice.destination.as_deref().unwrap_or("<unknown>");
        out.append(Span::new(
            Syntax::Comment,
            format!("  {}) {:#018x} {}\n", choice.index, choice.call_address, destination),
        ));
    }
    out.append(Span::new(Syntax::Comment, "  q) cancel\n"));
    Ok(VerbOutcome::AwaitingStepsChoice(StepsPromptState { process, thread, expected_pc: pc, choices }))
}

/// Continues a `steps` prompt once the user answers on the next line (spec
/// supplement): validates the thread hasn't moved, then either pushes the
/// chosen `StepIntoSpecific` controller or reports the cancellation.
pub async fn complete_steps(
    state: StepsPromptState,
    input: &str,
    ctx: &ConsoleContext,
) -> Result<OutputBuffer> {
    let current_pc = {
        let system = ctx.system().lock().await;
        let target = system
            .targets()
            .iter()
            .find(|t| t.process().map(|p| p.koid()) == Some(state.process))
            .ok_or_else(|| Error::NotFound(format!("process {}", state.process)))?;
        let proc = target.process().ok_or_else(|| Error::NotRunning("process".into()))?;
        let thread = proc
            .thread(state.thread)
            .ok_or_else(|| Error::NotFound(format!("thread {}", state.thread)))?;
        thread.stack().frame(0)?.pc
    };
    steps_prompt::validate_thread_unmoved(state.expected_pc, current_pc)?;

    let Some(choice) = steps_prompt::parse_selection(input, &state.choices)? else {
        let mut out = OutputBuffer::new();
        out.append(Span::new(Syntax::Comment, "cancelled\n"));
        return Ok(out);
    };

    let controller = steps_prompt::controller_for_choice(state.expected_pc, choice);
    push_and_resume(ctx, state.process, state.thread, controller).await?;
    Ok(stepping_started("stepping into the selected call"))
}

#[cfg(test)]
#[path = "stepping_tests.rs"]
mod tests;
