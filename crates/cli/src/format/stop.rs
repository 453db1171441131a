//! Stop-notification formatting (spec §4.3, §2 supplement): process/thread
//! count elision and the terse-vs-multiline exception split, grounded in
//! `console_context.cc::OutputThreadContext`/`DescribeHitBreakpoints`.

use dbg_core::id::{BreakpointId, TargetId, ThreadId};
use dbg_core::stack::Frame;
use dbg_core::thread::{ExceptionDetails, ExceptionKind};

use super::entity::render_frame;
use super::{OutputBuffer, Span, Syntax};

/// `"on bp 1,2"` when one or more non-internal breakpoints matched, `None`
/// otherwise (nothing to append to the stop header).
pub fn describe_hit_breakpoints(ids: &[BreakpointId]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    let joined = ids.iter().map(|id| id.get().to_string()).collect::<Vec<_>>().join(",");
    Some(format!("on bp {joined}"))
}

/// Everything [`format_stop`] needs to know about a single stop, pre-gathered
/// by the caller (`dbg-cli::console_context`) so this module stays a pure
/// function of plain data.
pub struct StopContext<'a> {
    pub target_id: TargetId,
    pub thread_id: ThreadId,
    /// Count of currently-Running Targets; only print "Process N" when > 1.
    pub total_targets: usize,
    /// Count of Threads in the stopping Process; only print "Thread N" when > 1.
    pub total_threads_in_process: usize,
    pub exception: ExceptionKind,
    pub details: &'a ExceptionDetails,
    pub frame0: Option<&'a Frame>,
    pub hit_breakpoints: &'a [BreakpointId],
}

/// Renders the one-line-or-multi-line stop header per spec §4.3's
/// debug-oriented/other exception split, and the elision rules from
/// SPEC_FULL §2.
pub fn format_stop(ctx: &StopContext<'_>) -> OutputBuffer {
    let mut out = OutputBuffer::new();

    if ctx.total_targets > 1 {
        out.append(Span::new(Syntax::Comment, format!("Process {} ", ctx.target_id)));
    }
    if ctx.total_threads_in_process > 1 {
        out.append(Span::new(Syntax::Comment, format!("Thread {} ", ctx.thread_id)));
    }

    if ctx.exception.is_debug_oriented() {
        out.append(Span::new(Syntax::Heading, "stopped"));
        if let Some(frame) = ctx.frame0 {
            out.append_normal(" at ");
            out.extend(render_frame(0, frame));
        }
        if let Some(suffix) = describe_hit_breakpoints(ctx.hit_breakpoints) {
            out.append(Span::new(Syntax::Comment, format!(" ({suffix})")));
        }
        out.append_newline();
    } else {
        out.append(Span::new(Syntax::Error, format!("Exception: {:?}\n", ctx.exception)));
        if let Some(addr) = ctx.details.faulting_address {
            out.append(Span::normal(format!("  faulting address: {addr:#x}\n")));
        }
        if let Some(description) = &ctx.details.description {
            out.append(Span::normal(format!("  {description}\n")));
        }
        if let Some(frame) = ctx.frame0 {
            out.extend(render_frame(0, frame));
            out.append_newline();
        }
    }
    out
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
