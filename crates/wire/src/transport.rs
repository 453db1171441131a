//! The concrete `AgentTransport` implementation: a length-prefixed JSON
//! codec ([`crate::codec`]) multiplexed over one duplex byte stream, using
//! the [`crate::frame::Frame`] envelope to match replies to requests and to
//! separate out notifications.
//!
//! Grounded in the teacher's `oj-wire` framing (4-byte BE length + JSON) and
//! its daemon-side request/response matching; the transaction-id mux itself
//! is this spec's own addition since `oj-wire` is a single-request-in-flight
//! protocol and this one (spec §5) explicitly is not.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dbg_core::error::{Error, Result};
use dbg_core::protocol::{Notification, Reply, Request};
use dbg_core::transport::AgentTransport;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::codec::{read_json, write_json};
use crate::frame::Frame;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// A duplex-stream-backed [`AgentTransport`]. Owns a background task that
/// reads frames off the stream and either completes a pending request's
/// oneshot channel (`Frame::Reply`) or forwards a `Frame::Notification` to
/// the channel [`FramedTransport::next_notification`] drains — this is
/// what lets `send` be `&self` rather than `&mut self` despite only one
/// physical reader existing.
pub struct FramedTransport {
    writer: AsyncMutex<Box<dyn AsyncWrite + Send + Unpin>>,
    pending: PendingMap,
    next_txn: AtomicU64,
    notifications: AsyncMutex<mpsc::UnboundedReceiver<Notification>>,
    connected: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
}

impl FramedTransport {
    /// Splits `stream` into read/write halves, spawns the background reader
    /// task, and returns a transport ready for
    /// [`dbg_core::session::Session::connect`] to send `Hello` over.
    pub fn spawn<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (notif_tx, notif_rx) = mpsc::unbounded_channel();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader_pending = pending.clone();
        let connected = Arc::new(AtomicBool::new(true));
        let reader_connected = connected.clone();

        let reader_task = tokio::spawn(async move {
            let mut read_half = read_half;
            loop {
                let frame: Result<Frame> = read_json(&mut read_half).await;
                match frame {
                    Ok(Frame::Reply { txn, reply }) => {
                        if let Some(sender) = reader_pending.lock().remove(&txn) {
                            let _ = sender.send(reply);
                        }
                    }
                    Ok(Frame::Notification { notification }) => {
                        if notif_tx.send(notification).is_err() {
                            break;
                        }
                    }
                    Ok(Frame::Request { .. }) => {
                        tracing::warn!(
                            "agent transport received a client-shaped Request frame, ignoring"
                        );
                    }
                    Err(err) => {
                        tracing::debug!(%err, "agent transport reader closing");
                        break;
                    }
                }
            }
            reader_connected.store(false, Ordering::Release);
            reader_pending.lock().clear();
        });

        Self {
            writer: AsyncMutex::new(Box::new(write_half)),
            pending,
            next_txn: AtomicU64::new(1),
            notifications: AsyncMutex::new(notif_rx),
            connected,
            reader_task,
        }
    }
}

#[async_trait]
impl AgentTransport for FramedTransport {
    async fn send(&self, request: Request) -> Result<Reply> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(Error::NoConnection("agent transport is closed".into()));
        }
        let txn = self.next_txn.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(txn, tx);

        let frame = Frame::Request { txn, request };
        let write_result = {
            let mut writer = self.writer.lock().await;
            write_json(&mut *writer, &frame).await
        };
        if let Err(err) = write_result {
            self.pending.lock().remove(&txn);
            return Err(err);
        }

        rx.await.map_err(|_| {
            self.connected.store(false, Ordering::Release);
            Error::Io("agent transport closed before replying".into())
        })
    }

    async fn next_notification(&self) -> Result<Notification> {
        let mut rx = self.notifications.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| Error::Io("agent transport notification channel closed".into()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Drop for FramedTransport {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
