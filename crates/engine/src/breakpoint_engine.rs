//! Breakpoint resolution and hit dispatch (spec §4.6), grounded in
//! `console_context.cc`'s `OnBreakpointMatched`/`DescribeHitBreakpoints`
//! handling of agent-reported breakpoint matches.
//!
//! Owns the only path that talks `AddOrChangeBreakpoint`/`RemoveBreakpoint`
//! to the agent; also implements [`crate::controller::TransientBreakpoints`]
//! so `Until`/`FinishPhysical` can install one-shot internal breakpoints
//! through the same machinery rather than a side channel.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dbg_core::breakpoint::{
    BreakpointLocation, BreakpointScope, BreakpointSettings, BreakpointType, InputLocation, StopMode,
};
use dbg_core::error::{Error, Result};
use dbg_core::id::{BreakpointId, Koid};
use dbg_core::protocol::{Reply, Request, WireBreakpointLocation, WireBreakpointType};
use dbg_core::symbol_service::SymbolService;
use dbg_core::system::System;
use dbg_core::transport::AgentTransport;
use tokio::sync::Mutex;

use crate::controller::TransientBreakpoints;

fn to_wire_kind(kind: BreakpointType) -> WireBreakpointType {
    match kind {
        BreakpointType::Software => WireBreakpointType::Software,
        BreakpointType::HardwareExec => WireBreakpointType::HardwareExecute,
        BreakpointType::HardwareWrite => WireBreakpointType::HardwareWrite,
        BreakpointType::ReadWrite => WireBreakpointType::ReadWrite,
    }
}

fn unwrap_reply(reply: Reply) -> Result<()> {
    match reply {
        Reply::Ok(_) => Ok(()),
        Reply::Error { code, message } => Err(Error::Agent { status: code, message }),
    }
}

pub struct BreakpointEngine {
    transport: Arc<dyn AgentTransport>,
    system: Arc<Mutex<System>>,
}

impl BreakpointEngine {
    pub fn new(transport: Arc<dyn AgentTransport>, system: Arc<Mutex<System>>) -> Self {
        Self { transport, system }
    }

    /// Resolves `breakpoint`'s `InputLocation`s against `process` and pushes
    /// the result to the agent. A Breakpoint with no matching addresses
    /// becomes pending (spec §4.6) rather than erroring — nothing is sent
    /// to the agent in that case.
    ///
    /// `user_requested` distinguishes a direct `break`/`edit` verb
    /// (`true`) from a re-resolution triggered by a module load the user
    /// didn't ask for (`false`); only the latter fires
    /// [`dbg_core::system::SystemObserver::on_breakpoint_matched`], so the
    /// console doesn't echo a notification for a change the user already
    /// sees the result of (spec §2 supplement).
    pub async fn resolve_and_install(
        &self,
        breakpoint_id: BreakpointId,
        process: Koid,
        symbols: &dyn SymbolService,
        user_requested: bool,
    ) -> Result<usize> {
        let (settings, id) = {
            let system = self.system.lock().await;
            let bp = system
                .breakpoint(breakpoint_id)
                .ok_or_else(|| Error::NotFound(format!("breakpoint {breakpoint_id}")))?;
            (bp.settings().clone(), bp.id())
        };

        let mut addresses = HashSet::new();
        for location in &settings.locations {
            for addr in symbols.resolve_location(process.get(), location).await? {
                addresses.insert(addr);
            }
        }

        let locations: Vec<BreakpointLocation> =
            addresses.iter().map(|&addr| BreakpointLocation::new(process, addr)).collect();
        let matched = locations.len();
        {
            let mut system = self.system.lock().await;
            if let Some(bp) = system.breakpoint_mut(id) {
                bp.set_locations(locations);
            }
            if !user_requested {
                system.notify_breakpoint_matched(id, matched);
            }
        }

        if addresses.is_empty() {
            return Ok(0);
        }

        let wire_locations: Vec<WireBreakpointLocation> = addresses
            .iter()
            .map(|&address| WireBreakpointLocation { address, size: settings.byte_size })
            .collect();
        let reply = self
            .transport
            .send(Request::AddOrChangeBreakpoint {
                id: id.get(),
                process,
                kind: to_wire_kind(settings.kind),
                locations: wire_locations,
            })
            .await?;
        unwrap_reply(reply)?;
        Ok(matched)
    }

    pub async fn remove(&self, id: BreakpointId) -> Result<()> {
        let reply = self.transport.send(Request::RemoveBreakpoint { id: id.get() }).await?;
        self.system.lock().await.destroy_breakpoint(id);
        unwrap_reply(reply)
    }

    /// Dispatches a stop's matched addresses against every non-internal
    /// Breakpoint scoped to `process`, applying `hit_mult` and the optional
    /// condition expression, and returns the ids that should actually be
    /// reported to the user (spec §4.6).
    pub async fn dispatch_hit(
        &self,
        process: Koid,
        thread: Koid,
        frame_pc: u64,
        matched_addresses: &[u64],
        symbols: &dyn SymbolService,
    ) -> Result<Vec<BreakpointId>> {
        let candidates: Vec<(BreakpointId, Option<String>)> = {
            let system = self.system.lock().await;
            system
                .breakpoints()
                .iter()
                .filter(|bp| !bp.is_internal())
                .filter(|bp| {
                    bp.locations()
                        .iter()
                        .any(|loc| loc.process == process && matched_addresses.contains(&loc.address))
                })
                .map(|bp| (bp.id(), bp.settings().condition.clone()))
                .collect()
        };

        let mut reported = Vec::new();
        for (id, condition) in candidates {
            if let Some(expr) = condition {
                let result = symbols.evaluate(process.get(), thread.get(), frame_pc, &expr).await?;
                if matches!(result.as_str(), "false" | "0") {
                    continue;
                }
            }
            let mut system = self.system.lock().await;
            if let Some(bp) = system.breakpoint_mut(id) {
                if bp.record_hit() {
                    reported.push(id);
                }
            }
        }
        Ok(reported)
    }
}

#[async_trait]
impl TransientBreakpoints for BreakpointEngine {
    async fn install(&self, process: Koid, addresses: Vec<u64>) -> Result<u64> {
        let settings = BreakpointSettings {
            kind: BreakpointType::Software,
            scope: BreakpointScope::System,
            locations: addresses.iter().map(|&a| InputLocation::Address(a)).collect(),
            stop_mode: StopMode::Thread,
            enabled: true,
            one_shot: true,
            byte_size: None,
            hit_mult: 1,
            condition: None,
        };
        let id = {
            let mut system = self.system.lock().await;
            system.create_breakpoint(settings, true)?
        };
        let locations: Vec<BreakpointLocation> =
            addresses.iter().map(|&addr| BreakpointLocation::new(process, addr)).collect();
        {
            let mut system = self.system.lock().await;
            if let Some(bp) = system.breakpoint_mut(id) {
                bp.set_locations(locations);
            }
        }
        let wire_locations: Vec<WireBreakpointLocation> =
            addresses.iter().map(|&address| WireBreakpointLocation { address, size: None }).collect();
        let reply = self
            .transport
            .send(Request::AddOrChangeBreakpoint {
                id: id.get(),
                process,
                kind: WireBreakpointType::Software,
                locations: wire_locations,
            })
            .await?;
        unwrap_reply(reply)?;
        Ok(id.get() as u64)
    }

    async fn remove(&self, handle: u64) {
        let id = BreakpointId::from(handle as u32);
        if let Err(err) = BreakpointEngine::remove(self, id).await {
            tracing::warn!(%err, "failed to remove transient breakpoint");
        }
    }
}

#[cfg(test)]
#[path = "breakpoint_engine_tests.rs"]
mod tests;
