//! Error taxonomy (spec §7).
//!
//! Every error carries a single structured kind plus a human-readable
//! message. Verbs attach active-entity context to the message before
//! surfacing it to the user (`"Process 2: ..."`) rather than threading a
//! separate context field through every variant.

use thiserror::Error;

/// The core's error type. One variant per taxonomy kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// User-provided string did not parse, noun/verb combination invalid,
    /// required argument missing.
    #[error("{0}")]
    Input(String),

    /// Operation requires a connected agent and there is none.
    #[error("not connected: {0}")]
    NoConnection(String),

    /// Operation requires a running Process/Thread that does not exist.
    #[error("not running: {0}")]
    NotRunning(String),

    /// Thread must be stopped (or all threads must be stopped) and is not.
    #[error("wrong state: {0}")]
    WrongState(String),

    /// Id refers to no live entity; location cannot be resolved to any
    /// address.
    #[error("not found: {0}")]
    NotFound(String),

    /// Location or symbol resolves to multiple candidates and the verb
    /// demands unique.
    #[error("ambiguous: {0}")]
    Ambiguous(String),

    /// The agent refused or returned a failure status for a request.
    #[error("agent error ({status}): {message}")]
    Agent { status: i64, message: String },

    /// Transport closed unexpectedly.
    #[error("io error: {0}")]
    Io(String),

    /// Symbol database could not answer or data was malformed.
    #[error("symbol error: {0}")]
    Symbol(String),

    /// Protocol-layer data integrity failure: a reply did not match the
    /// request it was keyed to, or otherwise failed to digest.
    #[error("object digest mismatch: {0}")]
    ObjectDigestMismatch(String),

    /// Protocol-layer data integrity failure: malformed wire data.
    #[error("format error: {0}")]
    FormatError(String),
}

impl Error {
    /// Prefix the error's message with active-entity context, e.g. turning
    /// `NotRunning("no process")` into `NotRunning("Process 2: no process")`.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        let prefix = context.to_string();
        match self {
            Error::Input(m) => Error::Input(format!("{prefix}: {m}")),
            Error::NoConnection(m) => Error::NoConnection(format!("{prefix}: {m}")),
            Error::NotRunning(m) => Error::NotRunning(format!("{prefix}: {m}")),
            Error::WrongState(m) => Error::WrongState(format!("{prefix}: {m}")),
            Error::NotFound(m) => Error::NotFound(format!("{prefix}: {m}")),
            Error::Ambiguous(m) => Error::Ambiguous(format!("{prefix}: {m}")),
            Error::Agent { status, message } => Error::Agent {
                status,
                message: format!("{prefix}: {message}"),
            },
            Error::Io(m) => Error::Io(format!("{prefix}: {m}")),
            Error::Symbol(m) => Error::Symbol(format!("{prefix}: {m}")),
            Error::ObjectDigestMismatch(m) => {
                Error::ObjectDigestMismatch(format!("{prefix}: {m}"))
            }
            Error::FormatError(m) => Error::FormatError(format!("{prefix}: {m}")),
        }
    }

    /// Short machine-readable tag for the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input(_) => "input",
            Error::NoConnection(_) => "no_connection",
            Error::NotRunning(_) => "not_running",
            Error::WrongState(_) => "wrong_state",
            Error::NotFound(_) => "not_found",
            Error::Ambiguous(_) => "ambiguous",
            Error::Agent { .. } => "agent",
            Error::Io(_) => "io",
            Error::Symbol(_) => "symbol",
            Error::ObjectDigestMismatch(_) => "object_digest_mismatch",
            Error::FormatError(_) => "format_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
