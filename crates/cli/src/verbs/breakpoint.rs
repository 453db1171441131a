//! `break`/`clear`/`filter` verbs and the Breakpoint/Filter noun listings
//! (spec §4.6), grounded in `breakpoint_engine.rs`'s resolve/install split.

use dbg_core::breakpoint::{BreakpointScope, BreakpointSettings, InputLocation, StopMode};
use dbg_core::error::{Error, Result};
use dbg_core::filter::FilterPattern;
use dbg_core::id::JobContextId;
use dbg_core::protocol::Request;

use crate::command::{has_switch, switch_value, BoundCommand};
use crate::console_context::ConsoleContext;
use crate::format::{render_breakpoint, render_filter, OutputBuffer, Span, Syntax};

/// Parses a location argument the way `break`/`until` both accept it:
/// `0x...` is an address, `file:line` a file/line pair, a bare positive
/// integer a line number in the current file context, anything else a
/// symbolic name.
pub(crate) fn parse_location(raw: &str) -> InputLocation {
    if let Some(hex) = raw.strip_prefix("0x") {
        if let Ok(addr) = u64::from_str_radix(hex, 16) {
            return InputLocation::Address(addr);
        }
    }
    if let Some((file, line)) = raw.rsplit_once(':') {
        if let Ok(line) = line.parse() {
            return InputLocation::FileLine { file: file.to_string(), line };
        }
    }
    if let Ok(line) = raw.parse() {
        return InputLocation::Line(line);
    }
    InputLocation::Symbol(raw.to_string())
}

pub async fn set_break(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("break requires a location".into()))?;
    let location = parse_location(raw);

    let scope = if has_switch(&bound.switches, "system") {
        BreakpointScope::System
    } else if has_switch(&bound.switches, "thread") {
        BreakpointScope::Thread(bound.target, bound.thread)
    } else {
        BreakpointScope::Target(bound.target)
    };
    let hit_mult = switch_value(&bound.switches, "hit-mult")?
        .map(|v| v.parse::<u32>().map_err(|_| Error::Input(format!("invalid --hit-mult value: {v}"))))
        .transpose()?
        .unwrap_or(1);
    let condition = switch_value(&bound.switches, "if")?.map(str::to_string);

    let settings = BreakpointSettings {
        scope,
        locations: vec![location],
        stop_mode: StopMode::All,
        hit_mult,
        condition,
        ..BreakpointSettings::default()
    };

    let id = {
        let mut system = ctx.system().lock().await;
        system.create_breakpoint(settings, false)?
    };

    let process = {
        let system = ctx.system().lock().await;
        system.target(bound.target).and_then(|t| t.process()).map(|p| p.koid())
    };
    if let Some(process) = process {
        ctx.breakpoints().resolve_and_install(id, process, ctx.symbols().as_ref(), true).await?;
    }

    let system = ctx.system().lock().await;
    let breakpoint = system
        .breakpoint(id)
        .ok_or_else(|| Error::NotFound(format!("breakpoint {id}")))?;
    Ok(render_breakpoint(breakpoint))
}

pub async fn clear(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    ctx.destroy_breakpoint(bound.breakpoint).await?;
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("breakpoint {} cleared\n", bound.breakpoint)));
    Ok(out)
}

pub async fn list_breakpoints_or_select(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let system = ctx.system().lock().await;
    if bound.listing_subject_had_index {
        let breakpoint = system
            .breakpoint(bound.breakpoint)
            .ok_or_else(|| Error::NotFound(format!("breakpoint {}", bound.breakpoint)))?;
        return Ok(render_breakpoint(breakpoint));
    }
    let mut out = OutputBuffer::new();
    for breakpoint in system.breakpoints().iter().filter(|b| !b.is_internal()) {
        out.extend(render_breakpoint(breakpoint));
        out.append_newline();
    }
    Ok(out)
}

pub async fn set_filter(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("filter requires a pattern".into()))?;
    let pattern = if let Some(name) = raw.strip_prefix("name:") {
        FilterPattern::ExactName(name.to_string())
    } else if let Some(url) = raw.strip_prefix("url:") {
        FilterPattern::Url(url.to_string())
    } else {
        FilterPattern::Substring(raw.to_string())
    };

    let job_scope = switch_value(&bound.switches, "job")?
        .map(|v| v.parse::<u32>().map_err(|_| Error::Input(format!("invalid --job value: {v}"))))
        .transpose()?
        .map(JobContextId::from);

    let id = {
        let mut system = ctx.system().lock().await;
        system.create_filter(pattern.clone(), job_scope)
    };

    if let Some(job_id) = job_scope {
        let system = ctx.system().lock().await;
        if let Some(job_koid) = system.job_context(job_id).and_then(|j| j.koid()) {
            let wire_pattern = match &pattern {
                FilterPattern::Substring(s) | FilterPattern::ExactName(s) | FilterPattern::Url(s) => s.clone(),
            };
            drop(system);
            ctx.transport().send(Request::JobFilter { job: job_koid, pattern: wire_pattern }).await?;
        }
    }

    let system = ctx.system().lock().await;
    let filter = system.filter(id).ok_or_else(|| Error::NotFound(format!("filter {id}")))?;
    Ok(render_filter(id.get(), filter))
}

pub async fn list_filters_or_select(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let system = ctx.system().lock().await;
    if bound.listing_subject_had_index {
        let filter = system
            .filter(bound.filter)
            .ok_or_else(|| Error::NotFound(format!("filter {}", bound.filter)))?;
        return Ok(render_filter(bound.filter.get(), filter));
    }
    let mut out = OutputBuffer::new();
    for filter in system.filters() {
        out.extend(render_filter(filter.id().get(), filter));
        out.append_newline();
    }
    Ok(out)
}

#[cfg(test)]
#[path = "breakpoint_tests.rs"]
mod tests;
