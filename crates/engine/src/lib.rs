#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbg-engine: the algorithms that sit between raw agent notifications and
//! the client's object model ([`dbg_core`]).
//!
//! - [`stack_builder`]: physical-frame + inline-chain → unified [`dbg_core::stack::Stack`]
//!   (spec §4.4).
//! - [`controller`]: the `ThreadController` state-machine hierarchy driving
//!   stepping (spec §4.5).
//! - [`breakpoint_engine`]: symbolic-location resolution, agent sync, and
//!   hit dispatch (spec §4.6).
//! - [`filter_engine`]: autoattach-on-filter-match (spec §4.2/§4.6).
//! - [`stop_dispatch`]: the top-level per-stop orchestration wiring the
//!   above together (spec §4.3).

pub mod breakpoint_engine;
pub mod controller;
pub mod filter_engine;
pub mod stack_builder;
pub mod stop_dispatch;

pub use breakpoint_engine::BreakpointEngine;
pub use filter_engine::FilterEngine;
pub use stop_dispatch::StopDispatch;
