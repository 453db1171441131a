#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbg-wire: the concrete transport to the remote debug agent (spec §1/§6,
//! "external collaborator").
//!
//! `dbg_core::protocol` defines the wire-independent request/reply/
//! notification shapes and `dbg_core::transport::AgentTransport` the trait
//! seam; this crate supplies the framing (length-prefixed JSON,
//! [`codec`]), the transaction-id envelope that multiplexes many in-flight
//! requests over one stream ([`frame`]), and the concrete
//! [`transport::FramedTransport`] that implements `AgentTransport` over
//! any duplex byte stream.

pub mod codec;
pub mod frame;
pub mod symbol_service;
pub mod transport;

pub use frame::Frame;
pub use symbol_service::NullSymbolService;
pub use transport::FramedTransport;
