//! The envelope `dbg-wire` puts around `dbg_core::protocol`'s abstract
//! request/reply/notification shapes so that many in-flight requests can
//! share one duplex stream (spec §5, "the request queue ... paced by the
//! callback-driven model", "matched to replies by a transaction id").
//!
//! `dbg-core::protocol` deliberately has no id field of its own (it is the
//! wire-independent shape quoted directly in spec §6); the transaction id
//! is a framing concern that belongs here, one layer down.

use dbg_core::protocol::{Notification, Reply, Request};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame")]
pub enum Frame {
    Request { txn: u64, request: Request },
    Reply { txn: u64, reply: Reply },
    Notification { notification: Notification },
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
