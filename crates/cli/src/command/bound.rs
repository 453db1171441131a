//! Context binding (spec §4.7 "Context binding"): fills
//! `(target, thread, frame, breakpoint, filter, job, sym-server)` into a
//! [`ParsedCommand`] using explicit indices where given and the
//! `ConsoleContext`'s active selection elsewhere.
//!
//! An explicit `noun_ref` index both scopes this command and becomes the
//! new active selection of that kind — mirroring how `console_context.cc`
//! treats specifying e.g. `process 2` as switching the current process,
//! not just a one-off override.

use dbg_core::id::{BreakpointId, FilterId, JobContextId, SymbolServerId, TargetId, ThreadId};

use super::{Noun, NounRef, ParsedCommand, Switch};
use crate::console_context::ConsoleContext;

/// A [`ParsedCommand`] with every noun slot resolved to a concrete id.
#[derive(Debug, Clone)]
pub struct BoundCommand {
    pub target: TargetId,
    pub thread: ThreadId,
    /// 0-based, matching `Stack`/`render_frame`'s unified-index convention
    /// (frame 0 is innermost) rather than the 1-based convention spec §6
    /// states for the console-assigned ids proper — frame position isn't
    /// one of the id kinds §4.8 tracks.
    pub frame: usize,
    pub breakpoint: BreakpointId,
    pub filter: FilterId,
    pub job_context: JobContextId,
    pub sym_server: SymbolServerId,
    pub verb: Option<String>,
    pub switches: Vec<Switch>,
    pub args: Vec<String>,
    /// The noun a verb-less command is about — the last `noun_ref` in the
    /// line. `None` for an empty line or a command with a verb.
    pub listing_subject: Option<Noun>,
    /// Whether `listing_subject` carried an explicit index (select-as-
    /// active) or not (list the collection).
    pub listing_subject_had_index: bool,
    /// Every noun kind written on the line, in order, regardless of
    /// whether a verb followed — lets a verb that accepts more than one
    /// noun kind (`attach`/`detach` on `process` vs. `job`) tell which one
    /// the user actually typed, since the id fields above are always
    /// populated from the active selection when no explicit index was
    /// given.
    pub mentioned_nouns: Vec<Noun>,
}

impl BoundCommand {
    /// Whether `noun` was written explicitly on this command line.
    pub fn mentions(&self, noun: Noun) -> bool {
        self.mentioned_nouns.contains(&noun)
    }
}

pub fn bind(parsed: ParsedCommand, ctx: &mut ConsoleContext) -> BoundCommand {
    let mut target = ctx.active_target();
    let mut thread = ctx.active_thread(target);
    let mut frame = ctx.active_frame(target, thread);
    let mut breakpoint = ctx.active_breakpoint();
    let mut filter = ctx.active_filter();
    let mut job_context = ctx.active_job_context();
    let mut sym_server = ctx.active_symbol_server();

    let mut listing_subject = None;
    let mut listing_subject_had_index = false;
    let mentioned_nouns: Vec<Noun> = parsed.nouns.iter().map(|r| r.noun).collect();

    for noun_ref in &parsed.nouns {
        let NounRef { noun, index } = *noun_ref;
        match noun {
            Noun::Process => {
                if let Some(index) = index {
                    target = TargetId::from(index);
                    ctx.set_active_target(target);
                    thread = ctx.active_thread(target);
                    frame = ctx.active_frame(target, thread);
                }
            }
            Noun::Thread => {
                if let Some(index) = index {
                    thread = ThreadId::from(index);
                    ctx.set_active_thread(target, thread);
                    frame = ctx.active_frame(target, thread);
                }
            }
            Noun::Frame => {
                if let Some(index) = index {
                    frame = index as usize;
                    ctx.set_active_frame(target, thread, frame);
                }
            }
            Noun::Job => {
                if let Some(index) = index {
                    job_context = JobContextId::from(index);
                    ctx.set_active_job_context(job_context);
                }
            }
            Noun::Breakpoint => {
                if let Some(index) = index {
                    breakpoint = BreakpointId::from(index);
                    ctx.set_active_breakpoint(breakpoint);
                }
            }
            Noun::Filter => {
                if let Some(index) = index {
                    filter = FilterId::from(index);
                    ctx.set_active_filter(filter);
                }
            }
            Noun::SymServer => {
                if let Some(index) = index {
                    sym_server = SymbolServerId::from(index);
                    ctx.set_active_symbol_server(sym_server);
                }
            }
            Noun::Global => {}
        }
        listing_subject = Some(noun);
        listing_subject_had_index = index.is_some();
    }

    if parsed.verb.is_some() {
        listing_subject = None;
        listing_subject_had_index = false;
    }

    BoundCommand {
        target,
        thread,
        frame,
        breakpoint,
        filter,
        job_context,
        sym_server,
        verb: parsed.verb,
        switches: parsed.switches,
        args: parsed.args,
        listing_subject,
        listing_subject_had_index,
        mentioned_nouns,
    }
}

#[cfg(test)]
#[path = "bound_tests.rs"]
mod tests;
