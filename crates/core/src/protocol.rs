//! Agent protocol (spec §6): a duplex channel carrying a tagged union of
//! request types and a separate stream of notifications.
//!
//! This module only defines the wire-independent shapes. `dbg-wire` carries
//! the length-prefixed JSON framing that puts these on an actual byte
//! stream; `dbg-core` needs the shapes itself so that [`crate::transport`]
//! can state its trait signatures without depending on `dbg-wire` (which
//! depends on `dbg-core`, not the other way around).

use crate::id::Koid;
use crate::thread::ExceptionKind;
use serde::{Deserialize, Serialize};

/// Resume style requested for a thread (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResumeMode {
    Continue,
    StepInstruction,
    StepRange { begin_inclusive: u64, end_exclusive: u64 },
}

/// Breakpoint types at the protocol level (spec §6), distinct from
/// [`crate::breakpoint::BreakpointType`] only in that this is the wire
/// representation sent to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireBreakpointType {
    Software,
    HardwareExecute,
    HardwareWrite,
    ReadWrite,
}

/// A concrete address-level breakpoint installation request for one
/// process, sent as part of `AddOrChangeBreakpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBreakpointLocation {
    pub address: u64,
    pub size: Option<u8>,
}

/// Requests the client may send to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Hello,
    Launch { argv: Vec<String>, component_url: Option<String> },
    Attach { koid: Koid },
    Detach { koid: Koid },
    Kill { koid: Koid },
    Pause { koid: Option<Koid>, timeout_ms: Option<u64> },
    Resume { thread: Koid, mode: ResumeMode },
    ReadMemory { process: Koid, address: u64, size: u64 },
    WriteMemory { process: Koid, address: u64, data: Vec<u8> },
    ReadRegisters { thread: Koid },
    WriteRegisters { thread: Koid, values: Vec<(String, u64)> },
    AddOrChangeBreakpoint {
        id: u32,
        process: Koid,
        kind: WireBreakpointType,
        locations: Vec<WireBreakpointLocation>,
    },
    RemoveBreakpoint { id: u32 },
    ThreadStatus { process: Koid },
    Modules { process: Koid },
    AddressSpace { process: Koid },
    JobFilter { job: Koid, pattern: String },
    HandleTable { process: Koid },
}

/// A successful or failed reply to a [`Request`], matched to it by
/// transaction id at the transport layer (see [`crate::transport`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum Reply {
    Ok(ReplyPayload),
    Error { code: i64, message: String },
}

/// Payload shapes for successful replies. Only `Launch`/`Attach` and the
/// read-style requests carry meaningful data back; the rest reply with
/// `Empty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ReplyPayload {
    Empty,
    Attached { koid: Koid, name: String },
    Memory { data: Vec<u8> },
    Registers { values: Vec<(String, u64)> },
    BreakpointResult { matched_addresses: Vec<u64>, failed: Vec<String> },
}

/// Notifications the agent delivers asynchronously (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    ProcessStarting { koid: Koid, name: String },
    ProcessExiting { koid: Koid, exit_code: i64 },
    ThreadStarting { process: Koid, thread: Koid, name: String },
    ThreadExiting { process: Koid, thread: Koid },
    ThreadStopped {
        process: Koid,
        thread: Koid,
        exception: ExceptionKind,
        faulting_address: Option<u64>,
        frames: Vec<WireFrame>,
        has_all_frames: bool,
        matched_breakpoint_ids: Vec<u32>,
    },
    ModuleLoaded { process: Koid, name: String, build_id: String, base: u64 },
    IoOutput { process: Koid, stream: WireIoStream, data: Vec<u8> },
    LimboProcesses { processes: Vec<LimboProcess> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireIoStream {
    Stdout,
    Stderr,
}

/// One physical frame as reported by the agent, before inline expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub pc: u64,
    pub sp: u64,
    pub bp: Option<u64>,
}

/// A process sitting in the post-crash limbo queue, presented to the user
/// on reconnect (spec §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimboProcess {
    pub koid: Koid,
    pub name: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
