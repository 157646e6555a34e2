//! Error types for the debate runtime.
//!
//! Every failure returned by the core carries a machine-readable kind string
//! (see [`DebateError::kind`]) plus a short diagnostic. Expected conditions
//! are surfaced as typed errors; the adversarial protocol recovers locally
//! from upstream and parse failures by substituting deterministic fallbacks,
//! so those kinds only appear where local recovery is not an option.

use thiserror::Error;

use crate::adversarial::AdversarialResult;
use crate::domain::DebateRole;

/// Unified error type for the debate core.
#[derive(Debug, Error)]
pub enum DebateError {
    /// A template, agent, or session was absent.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// What kind of entity was looked up ("template", "agent", ...).
        entity: &'static str,
        /// The identifier that missed.
        id: String,
    },

    /// Missing/empty ids, out-of-range confidence, nil inputs.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Votes or rankings below the configured minimum.
    #[error("insufficient input: need at least {needed} {what}, got {got}")]
    InsufficientInput {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    /// No agent fits a required role.
    #[error("no suitable agent for role: {role}")]
    NoSuitableCandidate { role: DebateRole },

    /// Cancellation token tripped.
    #[error("operation cancelled: {context}")]
    Cancelled { context: String },

    /// A deadline expired; message or phase specific.
    #[error("timeout: {context}")]
    Timeout { context: String },

    /// A message could not be enqueued to a recipient within the per-send
    /// deadline.
    #[error("message timeout to {to}")]
    MessageTimeout { to: String },

    /// The adversarial deadline fired mid-loop; carries everything that was
    /// accumulated before the timer expired.
    #[error("adversarial protocol timed out after {rounds} round(s)")]
    AdversarialTimeout {
        rounds: u32,
        partial: Box<AdversarialResult>,
    },

    /// Routing from an unknown sender, or nowhere to send.
    #[error("route failure: {reason}")]
    RouteFailure { reason: String },

    /// A structured model reply was not recoverable. Reserved for places
    /// where a fallback is not an option.
    #[error("parse failure: {context}")]
    ParseFailure { context: String },

    /// A model or capability discoverer returned an error that is not
    /// locally recoverable.
    #[error("upstream failure: {message}")]
    Upstream { message: String },
}

impl DebateError {
    /// Machine-readable kind string for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            DebateError::NotFound { .. } => "not-found",
            DebateError::Validation { .. } => "validation",
            DebateError::InsufficientInput { .. } => "insufficient-input",
            DebateError::NoSuitableCandidate { .. } => "no-suitable-candidate",
            DebateError::Cancelled { .. } => "cancelled",
            DebateError::Timeout { .. }
            | DebateError::MessageTimeout { .. }
            | DebateError::AdversarialTimeout { .. } => "timeout",
            DebateError::RouteFailure { .. } => "route-failure",
            DebateError::ParseFailure { .. } => "parse-failure",
            DebateError::Upstream { .. } => "upstream-failure",
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        DebateError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a cancellation error.
    pub fn cancelled(context: impl Into<String>) -> Self {
        DebateError::Cancelled {
            context: context.into(),
        }
    }
}

/// Convenience result alias used throughout the crate.
pub type DebateResult<T> = Result<T, DebateError>;
