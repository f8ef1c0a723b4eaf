//! # Queue Transport
//!
//! Narrow interface over the durable message queue. The real transport is an
//! external collaborator assumed to give at-least-once delivery with
//! per-conversation ordering; the in-memory implementation here backs tests
//! and the demo binary.

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};

use super::message::ActorMessage;
use crate::actor::errors::{ActorError, ActorResult};

/// Message queue seen from the control plane: send to an actor id, receive
/// whatever is addressed to this process
#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn send(&self, message: ActorMessage) -> ActorResult<()>;

    /// Next message, or `None` once the queue is closed and drained
    async fn receive(&self) -> ActorResult<Option<ActorMessage>>;
}

/// Counters kept by the in-memory transport, mostly for test assertions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub sent: u64,
    pub received: u64,
}

/// Unbounded in-process queue over tokio mpsc
pub struct InMemoryQueueTransport {
    tx: mpsc::UnboundedSender<ActorMessage>,
    rx: Mutex<mpsc::UnboundedReceiver<ActorMessage>>,
    stats: RwLock<TransportStats>,
}

impl InMemoryQueueTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            stats: RwLock::new(TransportStats::default()),
        }
    }

    pub fn stats(&self) -> TransportStats {
        *self.stats.read()
    }

    /// Try to receive without waiting; `None` when the queue is momentarily empty
    pub async fn try_receive(&self) -> ActorResult<Option<ActorMessage>> {
        let mut rx = self.rx.lock().await;
        match rx.try_recv() {
            Ok(message) => {
                self.stats.write().received += 1;
                Ok(Some(message))
            }
            Err(mpsc::error::TryRecvError::Empty)
            | Err(mpsc::error::TryRecvError::Disconnected) => Ok(None),
        }
    }
}

impl Default for InMemoryQueueTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueueTransport {
    async fn send(&self, message: ActorMessage) -> ActorResult<()> {
        self.tx
            .send(message)
            .map_err(|e| ActorError::transport(format!("Failed to enqueue message: {e}")))?;
        self.stats.write().sent += 1;
        Ok(())
    }

    async fn receive(&self) -> ActorResult<Option<ActorMessage>> {
        let mut rx = self.rx.lock().await;
        let message = rx.recv().await;
        if message.is_some() {
            self.stats.write().received += 1;
        }
        Ok(message)
    }
}
