//! # Consilium
//!
//! A debate runtime for heterogeneous language-model providers: specialized
//! agents propose, critique, attack, defend, and vote on candidate
//! solutions under a chosen communication topology, converging on a
//! weighted-consensus result.
//!
//! The crate is organized around four tightly-coupled subsystems:
//!
//! - **Agents** — capability-scored participants with role affinities,
//!   produced by a template [`factory`](crate::factory) and owned by a
//!   [`pool`](crate::pool) for the debate's lifetime.
//! - **Topologies** — mesh, star, and chain message routing with per-phase
//!   leader selection and parallel-group enumeration.
//! - **Adversarial protocol** — the Red/Blue attack–defend loop with
//!   deterministic fallbacks when model calls fail.
//! - **Voting** — weighted consensus plus majority, plurality, unanimous,
//!   Borda, and Condorcet aggregation.
//!
//! Model clients, capability discoverers, and audit sinks are consumed as
//! in-process interfaces (see [`interfaces`]); this crate defines no wire
//! protocol and keeps no global state — every registry, pool, topology, and
//! voting system is an instance value owned by the caller.

pub mod adversarial;
pub mod agent;
pub mod capability;
pub mod domain;
pub mod error;
pub mod factory;
pub mod interfaces;
pub mod pool;
pub mod topology;
pub mod voting;

pub use adversarial::{AdversarialConfig, AdversarialResult, RedBlueProtocol};
pub use agent::{AgentScore, DebateAgent, Specialization};
pub use capability::{Capability, CapabilitySet, CapabilitySource};
pub use domain::{CapabilityType, DebatePhase, DebateRole, Domain};
pub use error::{DebateError, DebateResult};
pub use factory::{AgentFactory, AgentTemplate, ProviderSpec};
pub use interfaces::{
    AuditEvent, AuditSink, CapabilityDiscoverer, CompletionClient, TopologyAgent,
};
pub use pool::{AgentPool, TeamAssignment, TeamBuilder, TeamConfig};
pub use topology::{DebateMessage, DebateTopology, TopologyKind};
pub use voting::{TieBreakMethod, Vote, VotingConfig, VotingMethod, VotingResult, VotingSystem};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
