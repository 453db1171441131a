//! `AgentTransport`: the seam between the client and the remote debug
//! agent (spec §1/§6, "external collaborator").
//!
//! This crate defines the trait because [`crate::session::Session`] needs
//! to hold one; the concrete duplex-channel implementation (the framed
//! length-prefixed JSON codec) lives in `dbg-wire`, which depends on this
//! crate rather than the other way around.

use crate::error::Result;
use crate::protocol::{Notification, Reply, Request};
use async_trait::async_trait;

/// Request/reply and notification I/O with the remote agent.
///
/// Requests are matched to replies by a transaction id the transport
/// assigns internally (spec §5, "Shared resources" — the transport
/// multiplexes all requests and matches replies by transaction id).
/// Notifications arrive out-of-band through [`Self::next_notification`];
/// the dispatch loop (spec §5) awaits it in a loop, which preserves the
/// transport's delivery order (spec §5, "Notifications ... delivered in
/// the order received").
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Sends a request and awaits its matched reply.
    async fn send(&self, request: Request) -> Result<Reply>;

    /// Awaits the next notification. `Err(Error::Io(_))` means the
    /// channel closed; the caller should treat this the same as a
    /// transport-level disconnect.
    async fn next_notification(&self) -> Result<Notification>;

    /// True once `Hello` has completed successfully and the channel has not
    /// since closed.
    fn is_connected(&self) -> bool;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use crate::protocol::ReplyPayload;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// An `AgentTransport` whose replies and notifications are
    /// pre-scripted, for testing code that drives requests without a real
    /// agent.
    pub struct ScriptedTransport {
        connected: bool,
        replies: Mutex<VecDeque<Reply>>,
        notifications: Mutex<VecDeque<Notification>>,
        sent: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self {
                connected: true,
                replies: Mutex::new(replies.into()),
                notifications: Mutex::new(VecDeque::new()),
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn with_notifications(mut self, notifications: Vec<Notification>) -> Self {
            self.notifications = Mutex::new(notifications.into());
            self
        }

        pub fn push_notification(&self, notification: Notification) {
            self.notifications.lock().push_back(notification);
        }

        pub fn sent_requests(&self) -> Vec<Request> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl AgentTransport for ScriptedTransport {
        async fn send(&self, request: Request) -> Result<Reply> {
            self.sent.lock().push(request);
            Ok(self
                .replies
                .lock()
                .pop_front()
                .unwrap_or(Reply::Ok(ReplyPayload::Empty)))
        }

        async fn next_notification(&self) -> Result<Notification> {
            self.notifications
                .lock()
                .pop_front()
                .ok_or_else(|| crate::error::Error::Io("no more scripted notifications".into()))
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
