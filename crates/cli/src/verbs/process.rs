//! Process-noun verbs (spec §4.1/§4.7), grounded in `verbs_process.cc`'s
//! `GetRunnableTarget`/`ProcessCommandCallback` pattern: `run`/`attach`
//! reuse the bound Target if it is unused (`State::None`), silently create
//! and activate a fresh one if the current Target is busy and no explicit
//! `process N` was given, and hard-error if one *was* given and is busy.

use dbg_core::error::{Error, Result};
use dbg_core::id::{Koid, TargetId};
use dbg_core::process::Process;
use dbg_core::protocol::{Reply, ReplyPayload, Request};
use dbg_core::target::{DestroyReason, LaunchConfig, StartOrigin, TargetState};

use crate::command::{switch_value, BoundCommand, Noun};
use crate::console_context::ConsoleContext;
use crate::format::{render_target, OutputBuffer, Span, Syntax};

fn unwrap_empty(reply: Reply) -> Result<()> {
    match reply {
        Reply::Ok(_) => Ok(()),
        Reply::Error { code, message } => Err(Error::Agent { status: code, message }),
    }
}

fn unwrap_attached(reply: Reply) -> Result<(Koid, String)> {
    match reply {
        Reply::Ok(ReplyPayload::Attached { koid, name }) => Ok((koid, name)),
        Reply::Ok(_) => Err(Error::FormatError("expected an Attached reply".into())),
        Reply::Error { code, message } => Err(Error::Agent { status: code, message }),
    }
}

/// `GetRunnableTarget`: picks the Target to run/attach into.
async fn runnable_target(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<TargetId> {
    let state = {
        let system = ctx.system().lock().await;
        system.target(bound.target).map(|t| t.state())
    };
    match state {
        Some(TargetState::None) => Ok(bound.target),
        Some(_) if bound.mentions(Noun::Process) => Err(Error::WrongState(
            "the specified process is already starting, attaching, or running; \
             kill it or use a new process context"
                .into(),
        )),
        Some(_) | None => {
            let mut system = ctx.system().lock().await;
            let id = system.create_target();
            drop(system);
            ctx.set_active_target(id);
            Ok(id)
        }
    }
}

fn report(id: u32, target: &dbg_core::target::Target) -> OutputBuffer {
    render_target(id, target)
}

async fn report_target(target_id: TargetId, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let system = ctx.system().lock().await;
    let target = system
        .target(target_id)
        .ok_or_else(|| Error::NotFound(format!("target {target_id}")))?;
    Ok(report(target_id.get(), target))
}

pub async fn run(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let target_id = runnable_target(bound, ctx).await?;
    let component_url = switch_value(&bound.switches, "component")?.map(str::to_string);
    let argv = bound.args.clone();
    if argv.is_empty() && component_url.is_none() {
        return Err(Error::Input("run requires a program path or --component=<url>".into()));
    }

    {
        let mut system = ctx.system().lock().await;
        let target = system
            .target_mut(target_id)
            .ok_or_else(|| Error::NotFound(format!("target {target_id}")))?;
        target.set_config(LaunchConfig { argv: argv.clone(), env: Vec::new(), component_url: component_url.clone() });
        target.begin_pending(TargetState::Starting)?;
    }

    let reply = ctx.transport().send(Request::Launch { argv, component_url }).await;
    let (koid, name) = match reply.and_then(unwrap_attached) {
        Ok(pair) => pair,
        Err(err) => {
            let mut system = ctx.system().lock().await;
            let target = system.target_mut(target_id).ok_or_else(|| err.clone())?;
            return Err(target.fail_pending(err));
        }
    };

    ctx.commit_process(target_id, Process::new(koid, name, StartOrigin::Launch)).await?;
    report_target(target_id, ctx).await
}

pub async fn attach(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let target_id = runnable_target(bound, ctx).await?;
    let raw = bound
        .args
        .first()
        .ok_or_else(|| Error::Input("attach requires a process koid".into()))?;
    let koid = Koid::new(
        raw.parse()
            .map_err(|_| Error::Input(format!("invalid process koid: {raw}")))?,
    );

    {
        let mut system = ctx.system().lock().await;
        let target = system
            .target_mut(target_id)
            .ok_or_else(|| Error::NotFound(format!("target {target_id}")))?;
        target.begin_pending(TargetState::Attaching)?;
    }

    let reply = ctx.transport().send(Request::Attach { koid }).await;
    let (koid, name) = match reply.and_then(unwrap_attached) {
        Ok(pair) => pair,
        Err(err) => {
            let mut system = ctx.system().lock().await;
            let target = system.target_mut(target_id).ok_or_else(|| err.clone())?;
            return Err(target.fail_pending(err));
        }
    };

    ctx.commit_process(target_id, Process::new(koid, name, StartOrigin::Attach)).await?;
    report_target(target_id, ctx).await
}

fn process_koid(target: &dbg_core::target::Target, target_id: TargetId) -> Result<Koid> {
    target
        .process()
        .map(|p| p.koid())
        .ok_or_else(|| Error::NotRunning(format!("Process {target_id}")))
}

/// `detach <koid>` where `<koid>` names a process no Target tracks (spec
/// §8.6): detaches directly through the agent without touching any Target.
pub async fn detach(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    if let Some(raw) = bound.args.first() {
        let koid = Koid::new(raw.parse().map_err(|_| Error::Input(format!("invalid process koid: {raw}")))?);
        let owning_target = {
            let system = ctx.system().lock().await;
            system.targets().iter().find(|t| t.process().map(Process::koid) == Some(koid)).map(|t| t.id())
        };
        let Some(target_id) = owning_target else {
            unwrap_empty(ctx.transport().send(Request::Detach { koid }).await?)?;
            let mut out = OutputBuffer::new();
            out.append(Span::new(Syntax::Comment, format!("Successfully detached from {koid}\n")));
            return Ok(out);
        };
        return detach_target(target_id, ctx).await;
    }
    detach_target(bound.target, ctx).await
}

async fn detach_target(target_id: TargetId, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let koid = {
        let system = ctx.system().lock().await;
        let target = system.target(target_id).ok_or_else(|| Error::NotFound(format!("target {target_id}")))?;
        process_koid(target, target_id)?
    };
    unwrap_empty(ctx.transport().send(Request::Detach { koid }).await?)?;
    {
        let mut system = ctx.system().lock().await;
        if let Some(target) = system.target_mut(target_id) {
            target.destroy_process(DestroyReason::Detached);
        }
    }
    report_target(target_id, ctx).await
}

pub async fn kill(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let koid = {
        let system = ctx.system().lock().await;
        let target = system
            .target(bound.target)
            .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
        process_koid(target, bound.target)?
    };
    unwrap_empty(ctx.transport().send(Request::Kill { koid }).await?)?;
    {
        let mut system = ctx.system().lock().await;
        if let Some(target) = system.target_mut(bound.target) {
            target.destroy_process(DestroyReason::Killed);
        }
    }
    report_target(bound.target, ctx).await
}

pub async fn cont(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let thread_koid = ctx
        .thread_koid(bound.target, bound.thread)
        .ok_or_else(|| Error::NotRunning("no active thread to continue".into()))?;
    unwrap_empty(
        ctx.transport()
            .send(Request::Resume { thread: thread_koid, mode: dbg_core::protocol::ResumeMode::Continue })
            .await?,
    )?;
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, "continuing\n"));
    Ok(out)
}

pub async fn pause(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let timeout_ms = switch_value(&bound.switches, "timeout")?
        .map(|v| v.parse::<u64>().map_err(|_| Error::Input(format!("invalid --timeout value: {v}"))))
        .transpose()?;
    let koid = ctx.system().lock().await.target(bound.target).and_then(|t| t.process()).map(|p| p.koid());
    unwrap_empty(ctx.transport().send(Request::Pause { koid, timeout_ms }).await?)?;

    if crate::command::has_switch(&bound.switches, "clear-state") {
        if let Some(thread_koid) = ctx.thread_koid(bound.target, bound.thread) {
            ctx.stop_dispatch().cancel_all(thread_koid).await;
        }
    }

    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, "paused\n"));
    Ok(out)
}

/// Sends the `Modules` sync request (so the agent re-reports any modules
/// loaded before this client connected, spec §6) then renders whatever the
/// client currently knows locally — the reply itself carries no payload
/// (`ReplyPayload` only gives `Launch`/`Attach` and the read-style
/// requests meaningful data back, per `protocol.rs`).
pub async fn libs(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let koid = {
        let system = ctx.system().lock().await;
        let target = system
            .target(bound.target)
            .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
        process_koid(target, bound.target)?
    };
    unwrap_empty(ctx.transport().send(Request::Modules { process: koid }).await?)?;

    let system = ctx.system().lock().await;
    let modules = system
        .target(bound.target)
        .and_then(|t| t.process())
        .map(|p| p.modules())
        .unwrap_or_default();
    let mut out = OutputBuffer::new();
    for module in modules {
        out.append(Span::new(Syntax::Variable, module.name.clone()));
        out.append(Span::new(Syntax::Comment, format!(" {:#x} {}\n", module.base, module.build_id)));
    }
    Ok(out)
}

pub async fn aspace(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let koid = {
        let system = ctx.system().lock().await;
        let target = system
            .target(bound.target)
            .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
        process_koid(target, bound.target)?
    };
    unwrap_empty(ctx.transport().send(Request::AddressSpace { process: koid }).await?)?;
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, "requested address space map from the agent\n"));
    Ok(out)
}

pub async fn handle(bound: &BoundCommand, ctx: &mut ConsoleContext) -> Result<OutputBuffer> {
    let koid = {
        let system = ctx.system().lock().await;
        let target = system
            .target(bound.target)
            .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
        process_koid(target, bound.target)?
    };
    unwrap_empty(ctx.transport().send(Request::HandleTable { process: koid }).await?)?;
    let mut out = OutputBuffer::new();
    out.append(Span::new(Syntax::Comment, "requested handle table from the agent\n"));
    Ok(out)
}

pub fn stdout(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    io_stream(bound, ctx, |p| p.stdout())
}

pub fn stderr(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    io_stream(bound, ctx, |p| p.stderr())
}

fn io_stream(
    bound: &BoundCommand,
    ctx: &ConsoleContext,
    pick: impl FnOnce(&Process) -> &dbg_core::process::IoRingBuffer,
) -> Result<OutputBuffer> {
    let system = ctx.system().try_lock().map_err(|_| Error::WrongState("system busy".into()))?;
    let target = system
        .target(bound.target)
        .ok_or_else(|| Error::NotFound(format!("target {}", bound.target)))?;
    let process = target
        .process()
        .ok_or_else(|| Error::NotRunning(format!("Process {}", bound.target)))?;
    let bytes = pick(process).as_bytes();
    let mut out = OutputBuffer::new();
    out.append(Span::normal(String::from_utf8_lossy(&bytes).into_owned()));
    Ok(out)
}

pub async fn list_or_select(bound: &BoundCommand, ctx: &ConsoleContext) -> Result<OutputBuffer> {
    let system = ctx.system().lock().await;
    if bound.listing_subject_had_index {
        let target = system
            .target(bound.target)
            .ok_or_else(|| Error::NotFound(format!("process {}", bound.target)))?;
        return Ok(report(bound.target.get(), target));
    }
    let mut out = OutputBuffer::new();
    for target in system.targets() {
        out.extend(report(target.id().get(), target));
        out.append_newline();
    }
    Ok(out)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
