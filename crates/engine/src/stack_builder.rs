//! Physical-frame-to-unified-stack expansion (spec §4.4): for each physical
//! frame the agent reports, ask the symbol service for its inline call
//! chain and synthesize one unified [`Frame`] per inline entry, innermost
//! first, followed by the physical frame itself.

use dbg_core::error::Result;
use dbg_core::id::Koid;
use dbg_core::protocol::WireFrame;
use dbg_core::stack::{Frame, FrameSymbol, Stack};
use dbg_core::symbol_service::SymbolService;

/// Builds a unified [`Stack`] from the physical frames the agent reported
/// for one `ThreadStopped`/`SyncFrames` reply.
///
/// The physical frame's own symbol is left unresolved (`FrameSymbol::
/// default()`) when it has an inline chain: attributing it to the
/// enclosing non-inlined function would need a symbol-service query this
/// crate's [`SymbolService`] trait does not expose (it only resolves
/// chains *containing* a pc, not "the non-inlined function that contains
/// this pc" standalone). The inline frames synthesized above it carry all
/// the source-level identity that matters for display.
pub async fn build_unified_stack(
    process: Koid,
    physical_frames: Vec<WireFrame>,
    has_all_frames: bool,
    symbols: &dyn SymbolService,
) -> Result<Stack> {
    let mut frames = Vec::with_capacity(physical_frames.len());
    for (physical_index, wire_frame) in physical_frames.into_iter().enumerate() {
        let chain = symbols.inline_call_chain(process.get(), wire_frame.pc).await?;
        for inline in chain.iter().rev() {
            frames.push(Frame {
                pc: wire_frame.pc,
                sp: wire_frame.sp,
                bp: wire_frame.bp,
                symbol_context: None,
                symbol: FrameSymbol {
                    function_name: Some(inline.function_name.clone()),
                    file: inline.file.clone(),
                    line: inline.line,
                },
                is_inline: true,
                physical_index,
            });
        }
        frames.push(Frame {
            pc: wire_frame.pc,
            sp: wire_frame.sp,
            bp: wire_frame.bp,
            symbol_context: None,
            symbol: FrameSymbol::default(),
            is_inline: false,
            physical_index,
        });
    }
    Ok(Stack::new(frames, has_all_frames))
}

#[cfg(test)]
#[path = "stack_builder_tests.rs"]
mod tests;
