//! Id types.
//!
//! Two different kinds of id show up in this crate and they are kept
//! deliberately distinct:
//!
//! - [`Koid`]: a kernel-assigned id for a process or thread, minted by the
//!   target system and carried verbatim over the wire. Opaque `u64`, never
//!   allocated locally.
//! - Console ids ([`define_console_id!`]): small positive integers assigned
//!   by the client itself (one counter per kind), used so the user can refer
//!   to a Target/JobContext/Breakpoint/Filter/SymbolServer by a short number
//!   instead of a koid or a handle. Never reused while the entity is alive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel-assigned id for a process or thread on the target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Koid(pub u64);

impl Koid {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Koid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Koid {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Monotonic allocator for console ids. One instance per entity kind.
///
/// Ids start at 1 (0 is reserved to mean "no active entity" in
/// `ConsoleContext`'s active-selection slots) and are never reused.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    pub fn alloc(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Define a newtype wrapper around a console-assigned `u32` id.
///
/// ```ignore
/// crate::define_console_id! {
///     /// Doc comment for the id type.
///     pub struct BreakpointId;
/// }
/// ```
#[macro_export]
macro_rules! define_console_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// The sentinel value meaning "no active entity of this kind".
            pub const NONE: Self = Self(0);

            pub const fn get(self) -> u32 {
                self.0
            }

            pub const fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

define_console_id! {
    /// Console-assigned id for a [`crate::target::Target`].
    pub struct TargetId;
}

define_console_id! {
    /// Console-assigned id for a [`crate::thread::Thread`], scoped to its
    /// owning Target.
    pub struct ThreadId;
}

define_console_id! {
    /// Console-assigned id for a [`crate::job_context::JobContext`].
    pub struct JobContextId;
}

define_console_id! {
    /// Console-assigned id for a [`crate::breakpoint::Breakpoint`].
    pub struct BreakpointId;
}

define_console_id! {
    /// Console-assigned id for a [`crate::filter::Filter`].
    pub struct FilterId;
}

define_console_id! {
    /// Console-assigned id for a symbol server connection.
    pub struct SymbolServerId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
