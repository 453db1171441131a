//! Verb execution (spec §4.7): the "verb_or_listing" half of a bound
//! command. A bare noun (`listing_subject` set, no verb) lists or
//! switches the active selection; a verb executes against the bound
//! context and must deliver exactly one user-visible completion or error.

mod breakpoint;
mod expr;
mod frame;
mod job;
mod process;
mod stepping;
mod thread;

pub use stepping::{complete_steps, StepsPromptState};

use dbg_core::error::{Error, Result};

use crate::command::{BoundCommand, Noun};
use crate::console_context::ConsoleContext;
use crate::format::OutputBuffer;

/// What came out of running one bound command line.
pub enum VerbOutcome {
    /// A complete, user-visible result.
    Done(OutputBuffer),
    /// `steps` found more than one call on the current line and is
    /// waiting for the user to pick one (or quit) on the *next* line.
    AwaitingStepsChoice(StepsPromptState),
}

impl VerbOutcome {
    pub fn done(out: OutputBuffer) -> Self {
        VerbOutcome::Done(out)
    }
}

/// Runs a bound command to completion. `None` verb means a noun-only line:
/// list the collection (no index given) or report the newly-active entity
/// (index given) — spec §4.7 "Execution".
pub async fn dispatch(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<VerbOutcome> {
    let Some(verb) = bound.verb.as_deref() else {
        return list_or_report_selection(bound, ctx).await.map(VerbOutcome::Done);
    };

    let out = match verb {
        "run" => process::run(bound, ctx).await?,
        "attach" if bound.mentions(Noun::Job) => job::attach(bound, ctx).await?,
        "attach" => process::attach(bound, ctx).await?,
        "detach" if bound.mentions(Noun::Job) => job::detach(bound, ctx).await?,
        "detach" => process::detach(bound, ctx).await?,
        "kill" => process::kill(bound, ctx).await?,
        "continue" => process::cont(bound, ctx).await?,
        "pause" => process::pause(bound, ctx).await?,
        "libs" => process::libs(bound, ctx).await?,
        "aspace" => process::aspace(bound, ctx).await?,
        "handle" => process::handle(bound, ctx).await?,
        "stdout" => process::stdout(bound, ctx)?,
        "stderr" => process::stderr(bound, ctx)?,

        "step" => stepping::step(bound, ctx).await?,
        "next" => stepping::next(bound, ctx).await?,
        "stepi" => stepping::stepi(bound, ctx).await?,
        "nexti" => stepping::nexti(bound, ctx).await?,
        "finish" => stepping::finish(bound, ctx).await?,
        "until" => stepping::until(bound, ctx).await?,
        "jump" => stepping::jump(bound, ctx).await?,
        "steps" => return stepping::steps(bound, ctx).await,

        "break" => breakpoint::set_break(bound, ctx).await?,
        "clear" => breakpoint::clear(bound, ctx).await?,
        "filter" => breakpoint::set_filter(bound, ctx).await?,

        "stack" => frame::stack(bound, ctx).await?,

        "print" => expr::print(bound, ctx).await?,
        "sym-info" => expr::sym_info(bound, ctx).await?,
        "sym-near" => expr::sym_near(bound, ctx).await?,
        "mem-read" => expr::mem_read(bound, ctx).await?,
        "mem-analyze" => expr::mem_analyze(bound, ctx).await?,

        other => return Err(Error::Input(format!("unknown verb `{other}`"))),
    };
    Ok(VerbOutcome::Done(out))
}

async fn list_or_report_selection(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let Some(noun) = bound.listing_subject else {
        return Ok(OutputBuffer::new());
    };
    match noun {
        Noun::Process => process::list_or_select(bound, ctx).await,
        Noun::Thread => thread::list_or_select(bound, ctx).await,
        Noun::Frame => frame::list_or_select(bound, ctx).await,
        Noun::Job => job::list_or_select(bound, ctx).await,
        Noun::Breakpoint => breakpoint::list_breakpoints_or_select(bound, ctx).await,
        Noun::Filter => breakpoint::list_filters_or_select(bound, ctx).await,
        Noun::SymServer => expr::list_sym_servers_or_select(bound, ctx).await,
        Noun::Global => Ok(OutputBuffer::new()),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
