//! Weighted voting and consensus aggregation.
//!
//! The primary method is weighted aggregation — the winning label is the
//! one maximizing the sum of voter weights behind it — with majority,
//! plurality, unanimous, Borda, and Condorcet available as alternatives.

pub mod ranked;
pub mod system;
pub mod vote;

pub use self::system::{VotingConfig, VotingSystem};
pub use self::vote::{
    AgentHistory, TieBreakMethod, Vote, VoteWeight, VotingMethod, VotingResult,
};
