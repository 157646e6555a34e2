//! Debate messages.
//!
//! Messages are short-lived: produced by an agent, routed by the topology,
//! and consumed from a recipient queue within the same round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::DebatePhase;

/// Who a message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRecipients {
    /// Everyone the topology allows the sender to reach.
    Broadcast,
    /// An explicit recipient list.
    Agents(Vec<String>),
}

/// A message exchanged between debate agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateMessage {
    /// Unique message id.
    pub id: String,
    /// Sending agent id.
    pub from: String,
    /// Addressing mode.
    pub to: MessageRecipients,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Message body.
    pub payload: Value,
    /// Debate round the message belongs to.
    pub round: u32,
    /// Debate phase the message belongs to.
    pub phase: DebatePhase,
}

impl DebateMessage {
    /// Create a broadcast message.
    pub fn new(from: impl Into<String>, payload: Value, round: u32, phase: DebatePhase) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from: from.into(),
            to: MessageRecipients::Broadcast,
            timestamp: Utc::now(),
            payload,
            round,
            phase,
        }
    }

    /// Builder: address the message to specific agents.
    pub fn to_agents(mut self, ids: Vec<String>) -> Self {
        self.to = MessageRecipients::Agents(ids);
        self
    }
}
