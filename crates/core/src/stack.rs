//! Stack and Frame data types (spec §3, §4.4).
//!
//! This module only holds the data shapes. The physical→unified expansion
//! algorithm that produces a [`Stack`] from raw agent frames lives in
//! `dbg_engine::stack_builder`, which depends on a `SymbolService` this
//! crate has no knowledge of.

/// Which module a frame's PC falls within, and where that module is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolContext {
    pub module_name: String,
    pub load_address: u64,
}

/// Resolved source-level identity of a frame, when symbols are available.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameSymbol {
    pub function_name: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// One entry in the unified stack: either a physical frame as reported by
/// the agent, or an inline frame synthesized at a physical frame's PC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub pc: u64,
    pub sp: u64,
    pub bp: Option<u64>,
    pub symbol_context: Option<SymbolContext>,
    pub symbol: FrameSymbol,
    pub is_inline: bool,
    /// Index of this frame's containing physical frame in the *physical*
    /// sequence (not the unified one). An inline frame and the physical
    /// frame it was expanded from share this value.
    pub physical_index: usize,
}

impl Frame {
    pub fn is_physical(&self) -> bool {
        !self.is_inline
    }
}

/// Ordered sequence of Frames, frame 0 innermost.
///
/// Invariants (spec §3):
/// - Frame 0 is always either the current innermost physical frame or an
///   inline function inlined at that frame's PC.
/// - Inline frames are synthesized between physical frames; never returned
///   by the agent directly.
/// - When `has_all_frames` is false, indexing past the known portion is an
///   error that must cause synchronous frame fetching before proceeding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    frames: Vec<Frame>,
    has_all_frames: bool,
}

impl Stack {
    pub fn new(frames: Vec<Frame>, has_all_frames: bool) -> Self {
        Self { frames, has_all_frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn has_all_frames(&self) -> bool {
        self.has_all_frames
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Index into the unified stack. An empty stack is legal (spec §8
    /// "Boundary behaviors"); indexing it, or indexing past
    /// `len()` when `has_all_frames` is false, is an error that the caller
    /// must resolve by calling `SyncFrames` before retrying.
    pub fn frame(&self, unified_index: usize) -> crate::error::Result<&Frame> {
        match self.frames.get(unified_index) {
            Some(f) => Ok(f),
            None if self.has_all_frames => Err(crate::error::Error::NotFound(format!(
                "frame {unified_index} (stack has {} frames)",
                self.frames.len()
            ))),
            None => Err(crate::error::Error::WrongState(format!(
                "frame {unified_index} requires a full stack sync"
            ))),
        }
    }

    /// Maps a unified-stack index to the index of its containing physical
    /// frame in the physical (agent-reported) sequence. Used by controllers
    /// that must reason about real call-stack depth, e.g. "Finish frame 2".
    pub fn physical_index_of(&self, unified_index: usize) -> crate::error::Result<usize> {
        Ok(self.frame(unified_index)?.physical_index)
    }

    /// Replaces the top of the stack with freshly reported frames (stop
    /// processing step 1, spec §4.3), retaining any previously-known inline
    /// expansion that lies below the replaced portion. Since the agent only
    /// ever reports a fresh top after a stop, and `new_top` already carries
    /// its own `has_all_frames` flag, this simply adopts `new_top` wholesale
    /// when the previous stack had no frames below the top, and otherwise
    /// splices `new_top`'s frames in front of the retained tail.
    pub fn replace_top(&mut self, new_top: Stack) {
        if new_top.has_all_frames || self.frames.is_empty() {
            *self = new_top;
            return;
        }
        // Retain whatever tail frames are strictly deeper than any physical
        // frame the new top re-reports. The new top always starts at
        // physical_index 0, so we drop any old frame whose physical_index
        // is covered by the new top's physical frame count.
        let new_physical_count = new_top
            .frames
            .last()
            .map(|f| f.physical_index + 1)
            .unwrap_or(0);
        let retained_tail: Vec<Frame> = self
            .frames
            .iter()
            .filter(|f| f.physical_index >= new_physical_count)
            .cloned()
            .collect();
        let mut frames = new_top.frames;
        frames.extend(retained_tail);
        self.frames = frames;
        self.has_all_frames = false;
    }

    /// Marks the stack fully synced (all physical frames known). Called
    /// when `SyncFrames` completes.
    pub fn mark_full(&mut self, frames: Vec<Frame>) {
        self.frames = frames;
        self.has_all_frames = true;
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod tests;
