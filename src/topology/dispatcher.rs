//! Message dispatch over bounded per-agent queues.
//!
//! Every agent registered with a topology gets a bounded FIFO queue. A send
//! blocks (cooperatively) while the recipient's queue is full, bounded by
//! the configured per-send deadline; an undrained queue surfaces a
//! `message-timeout-to-<id>` failure to the caller. Per-sender FIFO is
//! preserved by the underlying channel; cross-sender ordering is whatever
//! the topology variant guarantees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{DebateError, DebateResult};
use crate::topology::message::DebateMessage;

/// Default capacity of each agent's inbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default per-message send deadline.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Dispatcher tuning knobs.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Bounded capacity of each inbound queue.
    pub queue_capacity: usize,
    /// Deadline for a single enqueue.
    pub send_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// Snapshot of the dispatcher's message counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Messages handed to the dispatcher for delivery.
    pub sent: u64,
    /// Messages that reached a recipient queue.
    pub delivered: u64,
}

/// Owns the inbound queue of every registered agent.
pub struct MessageDispatcher {
    config: DispatcherConfig,
    senders: Mutex<HashMap<String, mpsc::Sender<DebateMessage>>>,
    receivers: Mutex<HashMap<String, mpsc::Receiver<DebateMessage>>>,
    sent: AtomicU64,
    delivered: AtomicU64,
    cancel: CancellationToken,
}

impl MessageDispatcher {
    /// Create a dispatcher with the given config.
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            senders: Mutex::new(HashMap::new()),
            receivers: Mutex::new(HashMap::new()),
            sent: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Register a queue for an agent id. Replaces any existing queue.
    pub fn register(&self, agent_id: &str) {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        self.senders.lock().insert(agent_id.to_string(), tx);
        self.receivers.lock().insert(agent_id.to_string(), rx);
    }

    /// Take ownership of an agent's receive side. Each queue can be taken
    /// once; the consumer drains it for the rest of the debate.
    pub fn take_receiver(&self, agent_id: &str) -> Option<mpsc::Receiver<DebateMessage>> {
        self.receivers.lock().remove(agent_id)
    }

    /// Whether an agent has a registered queue.
    pub fn is_registered(&self, agent_id: &str) -> bool {
        self.senders.lock().contains_key(agent_id)
    }

    /// Deliver one message to one recipient queue, bounded by the per-send
    /// deadline and the caller's cancellation token.
    pub async fn deliver(
        &self,
        to: &str,
        message: DebateMessage,
        token: &CancellationToken,
    ) -> DebateResult<()> {
        self.sent.fetch_add(1, Ordering::Relaxed);

        // Clone the sender out of the lock; the await happens lock-free.
        let sender = self.senders.lock().get(to).cloned();
        let sender = sender.ok_or_else(|| DebateError::RouteFailure {
            reason: format!("no queue for recipient {to}"),
        })?;

        tokio::select! {
            _ = token.cancelled() => Err(DebateError::cancelled(format!("delivery to {to}"))),
            _ = self.cancel.cancelled() => Err(DebateError::cancelled("dispatcher closed".to_string())),
            result = tokio::time::timeout(self.config.send_timeout, sender.send(message)) => {
                match result {
                    Ok(Ok(())) => {
                        self.delivered.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    }
                    Ok(Err(_)) => Err(DebateError::RouteFailure {
                        reason: format!("queue for {to} is closed"),
                    }),
                    Err(_) => Err(DebateError::MessageTimeout { to: to.to_string() }),
                }
            }
        }
    }

    /// Counter snapshot.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            sent: self.sent.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }

    /// Close the dispatcher: cancel in-flight sends and drop every queue.
    pub fn close(&self) {
        self.cancel.cancel();
        self.senders.lock().clear();
        self.receivers.lock().clear();
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("queues", &self.senders.lock().len())
            .field("sent", &self.sent.load(Ordering::Relaxed))
            .field("delivered", &self.delivered.load(Ordering::Relaxed))
            .finish()
    }
}
