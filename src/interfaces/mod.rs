//! Collaborator contracts consumed by the debate core.
//!
//! The core exposes only in-process interfaces: a completion client wrapping
//! any LLM, a side-effect-free capability discoverer, the plain transport
//! projection agents render into for out-of-process orchestrators, and an
//! optional append-only audit sink. None of these define a wire protocol;
//! implementations live outside this crate.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::Capability;

// ---------------------------------------------------------------------------
// Completion client
// ---------------------------------------------------------------------------

/// A single-operation model client used by the adversarial protocol.
///
/// Implementations may wrap any LLM provider. The protocol treats any error
/// as "use the deterministic fallback" and never retries the call itself.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produce a completion for the given prompt.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

// ---------------------------------------------------------------------------
// Capability discoverer
// ---------------------------------------------------------------------------

/// Discovers runtime capabilities for a provider/model pair.
///
/// Side-effect-free from the core's perspective; discovery failures during
/// agent creation are recorded in agent metadata and are not fatal.
#[async_trait]
pub trait CapabilityDiscoverer: Send + Sync {
    /// Probe the provider/model pair and return the capabilities found.
    async fn discover(&self, provider: &str, model: &str) -> anyhow::Result<Vec<Capability>>;
}

// ---------------------------------------------------------------------------
// Topology-agent projection
// ---------------------------------------------------------------------------

/// Plain transport record an agent renders into for topology construction
/// and for consumption by out-of-scope orchestrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyAgent {
    /// Agent identifier.
    pub id: String,
    /// Primary role name (snake_case).
    pub role: String,
    /// Provider identifier.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Selection score (verifier score on [0, 10]).
    pub score: f64,
    /// Self-reported confidence in [0, 1].
    pub confidence: f64,
    /// Primary specialization domain name.
    pub specialization: String,
    /// Capability type names.
    pub capabilities: Vec<String>,
    /// Opaque pass-through metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Audit sink
// ---------------------------------------------------------------------------

/// A tagged event recorded by the debate core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A prompt was sent to a model client.
    PromptSent {
        agent_id: String,
        phase: String,
        prompt_chars: usize,
        timestamp: DateTime<Utc>,
    },
    /// A model client reply was received (or failed over to fallback).
    ResponseReceived {
        agent_id: String,
        phase: String,
        fallback: bool,
        timestamp: DateTime<Utc>,
    },
    /// A vote was cast or replaced.
    VoteCast {
        agent_id: String,
        choice: String,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },
    /// A gate decision was taken (e.g. adversarial early exit).
    GateDecision {
        gate: String,
        decision: String,
        timestamp: DateTime<Utc>,
    },
    /// A protocol phase began.
    PhaseStarted {
        phase: String,
        round: u32,
        timestamp: DateTime<Utc>,
    },
    /// A protocol phase ended.
    PhaseEnded {
        phase: String,
        round: u32,
        timestamp: DateTime<Utc>,
    },
}

/// Append-only event recorder. The core emits events; storage is the
/// implementation's concern.
pub trait AuditSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: AuditEvent);
}

/// Shared handle to an optional audit sink.
pub type SharedAuditSink = Arc<dyn AuditSink>;

/// In-memory audit sink retaining events in arrival order.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out everything recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Number of events recorded.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

impl fmt::Debug for MemoryAuditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAuditSink")
            .field("events", &self.events.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::PhaseStarted {
            phase: "attack".into(),
            round: 1,
            timestamp: Utc::now(),
        });
        sink.record(AuditEvent::PhaseEnded {
            phase: "attack".into(),
            round: 1,
            timestamp: Utc::now(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], AuditEvent::PhaseStarted { .. }));
        assert!(matches!(events[1], AuditEvent::PhaseEnded { .. }));
    }

    #[test]
    fn test_audit_event_serializes_with_tag() {
        let event = AuditEvent::VoteCast {
            agent_id: "a1".into(),
            choice: "A".into(),
            confidence: 0.9,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "vote_cast");
        assert_eq!(json["choice"], "A");
    }
}
