//! Debate agent model.
//!
//! Contains the [`DebateAgent`] struct with its specialization, capability
//! set, and role affinities, plus the composite scoring used for team
//! selection.

pub mod core;
pub mod scoring;

pub use self::core::{DebateAgent, RoleAffinity, SharedAgent, Specialization, DEFAULT_EXPERTISE};
pub use self::scoring::AgentScore;
