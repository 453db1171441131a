//! `SymbolService`: resolve input locations, describe functions, evaluate
//! expressions (spec §1/§6, "external collaborator").
//!
//! A pure query service over the DWARF index; this crate never parses
//! symbol data itself. `dbg-engine::stack_builder` is the main consumer
//! (inline-chain queries for stack reconstruction, spec §4.4); `dbg-cli`
//! consumes it for `print`/`sym-info`/`sym-near`.

use crate::breakpoint::InputLocation;
use crate::error::Result;
use async_trait::async_trait;

/// One entry in an inline call chain at a given PC, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFrameSymbol {
    pub function_name: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// A call instruction found on a source line, with its destination when
/// statically known (spec §4.5, "Steps").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub call_address: u64,
    pub range_end: u64,
    pub destination: Option<String>,
}

/// A description of a function's prologue, used by StepInto's
/// skip-the-prologue behavior (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prologue {
    pub begin: u64,
    pub end: u64,
}

#[async_trait]
pub trait SymbolService: Send + Sync {
    /// The inline call chain containing `pc`, outermost-inlined first
    /// through innermost-inlined last. Empty if `pc` is not inside any
    /// inlined function.
    async fn inline_call_chain(&self, process: u64, pc: u64) -> Result<Vec<InlineFrameSymbol>>;

    /// Resolves a symbolic [`InputLocation`] against one process, in
    /// resolution order (spec §4.6): symbolic name → zero or more
    /// addresses; file:line → at most one (exact match preferred, else
    /// nearest later line in the same file); bare line → against the
    /// originating file context; address → as-is.
    async fn resolve_location(&self, process: u64, location: &InputLocation) -> Result<Vec<u64>>;

    /// The source-line address range `[begin, end)` containing `pc`.
    async fn source_line_range(&self, process: u64, pc: u64) -> Result<(u64, u64)>;

    /// All call instructions on the source line containing `pc` (spec
    /// §4.5, "Steps").
    async fn call_sites_on_line(&self, process: u64, pc: u64) -> Result<Vec<CallSite>>;

    /// The prologue range of the function containing `pc`, if known.
    async fn prologue(&self, process: u64, pc: u64) -> Result<Option<Prologue>>;

    /// Evaluates an expression in the context of a stopped thread's frame;
    /// used by conditional breakpoints and `print`. Returns a
    /// human-readable rendering of the result.
    async fn evaluate(&self, process: u64, thread: u64, frame_pc: u64, expression: &str) -> Result<String>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use std::collections::HashMap;

    /// A `SymbolService` backed by maps the test populates directly, for
    /// exercising `dbg-engine` without a real symbol database.
    #[derive(Default)]
    pub struct FakeSymbolService {
        pub inline_chains: HashMap<u64, Vec<InlineFrameSymbol>>,
        pub resolutions: HashMap<String, Vec<u64>>,
        pub line_ranges: HashMap<u64, (u64, u64)>,
        pub call_sites: HashMap<u64, Vec<CallSite>>,
        pub prologues: HashMap<u64, Prologue>,
    }

    #[async_trait]
    impl SymbolService for FakeSymbolService {
        async fn inline_call_chain(&self, _process: u64, pc: u64) -> Result<Vec<InlineFrameSymbol>> {
            Ok(self.inline_chains.get(&pc).cloned().unwrap_or_default())
        }

        async fn resolve_location(&self, _process: u64, location: &InputLocation) -> Result<Vec<u64>> {
            let key = match location {
                InputLocation::Symbol(s) => s.clone(),
                InputLocation::FileLine { file, line } => format!("{file}:{line}"),
                InputLocation::Line(line) => line.to_string(),
                InputLocation::Address(addr) => return Ok(vec![*addr]),
            };
            Ok(self.resolutions.get(&key).cloned().unwrap_or_default())
        }

        async fn source_line_range(&self, _process: u64, pc: u64) -> Result<(u64, u64)> {
            self.line_ranges
                .get(&pc)
                .copied()
                .ok_or_else(|| crate::error::Error::Symbol(format!("no line info for pc {pc:#x}")))
        }

        async fn call_sites_on_line(&self, _process: u64, pc: u64) -> Result<Vec<CallSite>> {
            Ok(self.call_sites.get(&pc).cloned().unwrap_or_default())
        }

        async fn prologue(&self, _process: u64, pc: u64) -> Result<Option<Prologue>> {
            Ok(self.prologues.get(&pc).copied())
        }

        async fn evaluate(&self, _process: u64, _thread: u64, _frame_pc: u64, expression: &str) -> Result<String> {
            Ok(format!("<unevaluated: {expression}>"))
        }
    }
}

#[cfg(test)]
#[path = "symbol_service_tests.rs"]
mod tests;
