//! A `SymbolService` that answers every query as "no symbols available"
//! rather than failing outright — the binary's default until a real
//! sym-server connection is wired in (spec §1 lists the symbol database
//! itself as an external collaborator; this is the stand-in that keeps
//! the rest of the client usable without one).

use async_trait::async_trait;
use dbg_core::breakpoint::InputLocation;
use dbg_core::error::{Error, Result};
use dbg_core::symbol_service::{CallSite, InlineFrameSymbol, Prologue, SymbolService};

/// Degrades gracefully rather than erroring wherever an empty answer keeps
/// the caller meaningful (no inline frames, no call sites, no prologue);
/// errors only where a real answer was the entire point of the call
/// (resolving a symbolic location, evaluating an expression).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSymbolService;

#[async_trait]
impl SymbolService for NullSymbolService {
    async fn inline_call_chain(&self, _process: u64, _pc: u64) -> Result<Vec<InlineFrameSymbol>> {
        Ok(Vec::new())
    }

    async fn resolve_location(&self, _process: u64, location: &InputLocation) -> Result<Vec<u64>> {
        match location {
            InputLocation::Address(addr) => Ok(vec![*addr]),
            other => Err(Error::Symbol(format!(
                "no symbol service connected, cannot resolve {other:?}"
            ))),
        }
    }

    async fn source_line_range(&self, _process: u64, pc: u64) -> Result<(u64, u64)> {
        Err(Error::Symbol(format!("no symbol service connected, no line info for pc {pc:#x}")))
    }

    async fn call_sites_on_line(&self, _process: u64, _pc: u64) -> Result<Vec<CallSite>> {
        Ok(Vec::new())
    }

    async fn prologue(&self, _process: u64, _pc: u64) -> Result<Option<Prologue>> {
        Ok(None)
    }

    async fn evaluate(&self, _process: u64, _thread: u64, _frame_pc: u64, expression: &str) -> Result<String> {
        Err(Error::Symbol(format!("no symbol service connected, cannot evaluate `{expression}`")))
    }
}

#[cfg(test)]
#[path = "symbol_service_tests.rs"]
mod tests;
