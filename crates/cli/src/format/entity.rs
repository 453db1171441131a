//! Rendering entities, locations, frames, and stacks into [`OutputBuffer`]s
//! (spec §2 "Formatting"). Each function here takes plain data, never the
//! live object model directly, so it can be unit tested without a `System`.

use dbg_core::breakpoint::{Breakpoint, InputLocation};
use dbg_core::filter::{Filter, FilterPattern};
use dbg_core::job_context::{JobContext, JobContextState};
use dbg_core::stack::{Frame, Stack};
use dbg_core::system::SymbolServer;
use dbg_core::target::{Target, TargetState};
use dbg_core::thread::{Thread, ThreadState};

use super::{OutputBuffer, Span, Syntax};

/// `main.cc:42`, a bare address, or a symbolic name, matching the
/// `InputLocation` variant given.
pub fn render_location(location: &InputLocation) -> String {
    match location {
        InputLocation::Symbol(name) => name.clone(),
        InputLocation::FileLine { file, line } => format!("{file}:{line}"),
        InputLocation::Line(line) => line.to_string(),
        InputLocation::Address(addr) => format!("{addr:#x}"),
    }
}

/// One stack frame, e.g. `3 inline my_func() • main.cc:42`.
pub fn render_frame(unified_index: usize, frame: &Frame) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{unified_index:<3} ")));
    if frame.is_inline {
        out.append(Span::new(Syntax::Special, "inline "));
    }
    match &frame.symbol.function_name {
        Some(name) => out.append(Span::new(Syntax::Variable, name.clone())),
        None => out.append(Span::normal(format!("{:#018x}", frame.pc))),
    };
    if let Some(file) = &frame.symbol.file {
        let line = frame
            .symbol
            .line
            .map(|l| format!(":{l}"))
            .unwrap_or_default();
        out.append(Span::new(Syntax::Comment, format!(" • {file}{line}")));
    }
    out
}

/// The full unified stack, one rendered frame per line. Appends a trailing
/// note when the stack is only partially known.
pub fn render_stack(stack: &Stack) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    for (index, frame) in stack.frames().iter().enumerate() {
        out.extend(render_frame(index, frame));
        out.append_newline();
    }
    if !stack.has_all_frames() {
        out.append(Span::new(Syntax::Comment, "(more frames available, use `frame` to sync)\n"));
    }
    out
}

/// A one-line summary of a Thread for `thread` listings, e.g.
/// `2 worker-thread running`.
pub fn render_thread_summary(id: u32, thread: &Thread) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{id} ")));
    out.append(Span::new(Syntax::Variable, thread.name().to_string()));
    out.append_normal(" ");
    let state_syntax = match thread.state() {
        ThreadState::Running => Syntax::Normal,
        ThreadState::Suspended => Syntax::Special,
        ThreadState::Blocked(_) => Syntax::Warning,
        ThreadState::CoreDump | ThreadState::Dying | ThreadState::Dead => Syntax::Error,
    };
    out.append(Span::new(state_syntax, thread.state().to_string()));
    out
}

/// A breakpoint listing row: id, enabled marker, location list, hit count.
pub fn render_breakpoint(breakpoint: &Breakpoint) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    let marker = if breakpoint.settings().enabled { "●" } else { "○" };
    out.append(Span::new(Syntax::Comment, format!("{} {} ", breakpoint.id(), marker)));
    let locations: Vec<String> = breakpoint.settings().locations.iter().map(render_location).collect();
    out.append(Span::new(Syntax::Variable, locations.join(", ")));
    if breakpoint.is_pending() {
        out.append(Span::new(Syntax::Warning, " (pending)"));
    }
    out.append(Span::new(Syntax::Comment, format!(" hit {} time(s)", breakpoint.hit_count())));
    out
}

/// A Target listing/completion row, e.g. `2 running zxdb-example 4213`,
/// grounded in `FormatTarget`'s "state, then process name and koid when
/// running" shape.
pub fn render_target(id: u32, target: &Target) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{id} ")));
    let state_syntax = match target.state() {
        TargetState::None => Syntax::Comment,
        TargetState::Starting | TargetState::Attaching => Syntax::Special,
        TargetState::Running => Syntax::Normal,
    };
    out.append(Span::new(state_syntax, target.state().to_string()));
    if let Some(process) = target.process() {
        out.append_normal(" ");
        out.append(Span::new(Syntax::Variable, process.name().to_string()));
        out.append(Span::new(Syntax::Comment, format!(" koid={}", process.koid())));
    } else if !target.config().argv.is_empty() {
        out.append(Span::new(Syntax::Comment, format!(" ({})", target.config().argv.join(" "))));
    }
    out
}

/// A JobContext listing/completion row.
pub fn render_job_context(id: u32, job: &JobContext) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{id} ")));
    let state_syntax = match job.state() {
        JobContextState::None => Syntax::Comment,
        JobContextState::Attaching => Syntax::Special,
        JobContextState::Attached => Syntax::Normal,
    };
    out.append(Span::new(state_syntax, job.state().to_string()));
    if let Some(koid) = job.koid() {
        out.append_normal(" ");
        out.append(Span::new(Syntax::Variable, job.name().to_string()));
        out.append(Span::new(Syntax::Comment, format!(" koid={koid}")));
    }
    out
}

/// A Filter listing row: id, pattern, and job scope when present.
pub fn render_filter(id: u32, filter: &Filter) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{id} ")));
    let pattern = match filter.pattern() {
        FilterPattern::Substring(s) => format!("substring \"{s}\""),
        FilterPattern::ExactName(s) => format!("name \"{s}\""),
        FilterPattern::Url(s) => format!("url \"{s}\""),
    };
    out.append(Span::new(Syntax::Variable, pattern));
    if let Some(job) = filter.job_scope() {
        out.append(Span::new(Syntax::Comment, format!(" (job {job})")));
    }
    out
}

/// A SymbolServer listing row: id, url, connection state.
pub fn render_symbol_server(server: &SymbolServer) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{} ", server.id())));
    out.append(Span::new(Syntax::Variable, server.url().to_string()));
    let status_syntax = if server.is_connected() { Syntax::Normal } else { Syntax::Warning };
    let status = if server.is_connected() { "connected" } else { "disconnected" };
    out.append(Span::new(status_syntax, format!(" {status}")));
    out
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
