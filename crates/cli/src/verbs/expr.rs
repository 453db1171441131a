//! Expression, symbol-lookup, and memory verbs (spec §4.7's `print`,
//! `sym-info`, `sym-near`, `mem-read`, `mem-analyze`), grounded in the
//! `SymbolService` query surface (spec §1/§6, "external collaborator") —
//! this module never parses an expression or a symbol table itself, it
//! only shapes requests to that service and the agent's `ReadMemory`.

use dbg_core::error::{Error, Result};
use dbg_core::id::Koid;
use dbg_core::protocol::{ReplyPayload, Request};

use crate::command::{switch_value, BoundCommand};
use crate::console_context::ConsoleContext;
use crate::format::{OutputBuffer, Span, Syntax};

/// `0x...` hex or bare decimal, the two forms `mem-read`/`sym-near`/
/// `mem-analyze` accept for an address argument.
fn parse_address(raw: &str) -> Result<u64> {
    if let Some(hex) = raw.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).map_err(|_| Error::Input(format!("invalid address: {raw}")));
    }
    raw.parse().map_err(|_| Error::Input(format!("invalid address: {raw}")))
}

/// The process koid, thread koid, and current frame's pc for the bound
/// context — the triple every expression-evaluating verb here needs.
async fn eval_context(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<(Koid, Koid, u64)> {
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
    let pc = thread.stack().frame(bound.frame)?.pc;
    Ok((process_koid, thread_koid, pc))
}

pub async fn print(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let expression = bound.args.join(" ");
    if expression.is_empty() {
        return Err(Error::Input("print requires an expression".into()));
    }
    let (process, thread, pc) = eval_context(bound, ctx).await?;
    let value = ctx.symbols().evaluate(process.get(), thread.get(), pc, &expression).await?;
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Variable, expression));
    out.append(Span::normal(format!(" = {value}\n")));
    Ok(out)
}

pub async fn sym_info(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let name = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("sym-info requires a symbol name".into()))?;
    let (process, _thread, _pc) = eval_context(bound, ctx).await?;
    let location = dbg_core::breakpoint::InputLocation::Symbol(name.clone());
    let addresses = ctx.symbols().resolve_location(process.get(), &location).await?;
    if addresses.is_empty() {
        return Err(Error::NotFound(format!("symbol `{name}`")));
    }

    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Variable, name.clone()));
    out.append_newline();
    for address in addresses {
        out.append(Span::new(Syntax::Comment, format!("  {address:#018x}")));
        if let Ok((begin, end)) = ctx.symbols().source_line_range(process.get(), address).await {
            out.append(Span::normal(format!(" range [{begin:#x}, {end:#x})")));
        }
        out.append_newline();
    }
    Ok(out)
}

pub async fn sym_near(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("sym-near requires an address".into()))?;
    let address = parse_address(raw)?;
    let (process, _thread, _pc) = eval_context(bound, ctx).await?;

    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, format!("{address:#018x} ")));
    let chain = ctx.symbols().inline_call_chain(process.get(), address).await?;
    if let Some(innermost) = chain.last() {
        out.append(Span::new(Syntax::Variable, innermost.function_name.clone()));
        if let Some(file) = &innermost.file {
            let line = innermost.line.map(|l| format!(":{l}")).unwrap_or_default();
            out.append(Span::new(Syntax::Comment, format!(" • {file}{line}")));
        }
    } else {
        out.append(Span::new(Syntax::Warning, "no symbol information"));
    }
    out.append_newline();
    Ok(out)
}

pub async fn mem_read(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("mem-read requires an address".into()))?;
    let address = parse_address(raw)?;
    let size = switch_value(&bound.switches, "size")?
        .map(|v| v.parse::<u64>().map_err(|_| Error::Input(format!("invalid --size value: {v}"))))
        .transpose()?
        .unwrap_or(64);

    let process = {
        let system = ctx.system().lock().await;
        system
            .target(bound.target)
            .and_then(|t| t.process())
            .map(|p| p.koid())
            .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?
    };

    let reply = ctx.transport().send(Request::ReadMemory { process, address, size }).await?;
    let data = match reply {
        dbg_core::protocol::Reply::Ok(ReplyPayload::Memory { data }) => data,
        dbg_core::protocol::Reply::Ok(_) => return Err(Error::FormatError("expected a Memory reply".into())),
        dbg_core::protocol::Reply::Error { code, message } => return Err(Error::Agent { status: code, message }),
    };

    Ok(render_hex_dump(address, &data))
}

pub async fn mem_analyze(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("mem-analyze requires an address".into()))?;
    let address = parse_address(raw)?;
    let word_size = switch_value(&bound.switches, "size")?
        .map(|v| v.parse::<u64>().map_err(|_| Error::Input(format!("invalid --size value: {v}"))))
        .transpose()?
        .unwrap_or(8);
    let num_words = switch_value(&bound.switches, "num")?
        .map(|v| v.parse::<u64>().map_err(|_| Error::Input(format!("invalid --num value: {v}"))))
        .transpose()?
        .unwrap_or(16);

    let process = {
        let system = ctx.system().lock().await;
        system
            .target(bound.target)
            .and_then(|t| t.process())
            .map(|p| p.koid())
            .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?
    };

    let reply = ctx
        .transport()
        .send(Request::ReadMemory { process, address, size: word_size * num_words })
        .await?;
    let data = match reply {
        dbg_core::protocol::Reply::Ok(ReplyPayload::Memory { data }) => data,
        dbg_core::protocol::Reply::Ok(_) => return Err(Error::FormatError("expected a Memory reply".into())),
        dbg_core::protocol::Reply::Error { code, message } => return Err(Error::Agent { status: code, message }),
    };

    let mut out = OutputBuffer::new();
    for (index, chunk) in data.chunks(word_size as usize).enumerate() {
        if chunk.len() < word_size as usize {
            break;
        }
        let word_addr = address + index as u64 * word_size;
        let mut bytes = [0u8; 8];
        bytes[..chunk.len().min(8)].copy_from_slice(&chunk[..chunk.len().min(8)]);
        let value = u64::from_le_bytes(bytes);

        out.append(Span::new(Syntax::Comment, format!("{word_addr:#018x}: ")));
        out.append(Span::normal(format!("{value:#018x}")));
        if let Ok(chain) = ctx.symbols().inline_call_chain(process.get(), value).await {
            if let Some(sym) = chain.last() {
                out.append(Span::new(Syntax::Variable, format!(" -> {}", sym.function_name)));
            }
        }
        out.append_newline();
    }
    Ok(out)
}

fn render_hex_dump(base: u64, data: &[u8]) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    for (row, chunk) in data.chunks(16).enumerate() {
        out.append(Span::new(Syntax::Comment, format!("{:#018x}: ", base + row as u64 * 16)));
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        out.append(Span::normal(hex.join(" ")));
        out.append_newline();
    }
    out
}

pub async fn list_sym_servers_or_select(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let system = ctx.system().lock().await;
    if bound.listing_subject_had_index {
        let server = system
            .symbol_servers()
            .iter()
            .find(|s| s.id() == bound.sym_server)
            .ok_or_else(|| Error::NotFound(format!("sym-server {}", bound.sym_server)))?;
        return Ok(crate::format::render_symbol_server(server));
    }
    let mut out = OutputBuffer::new();
    for server in system.symbol_servers() {
        out.extend(crate::format::render_symbol_server(server));
        out.append_newline();
    }
    Ok(out)
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod tests;
