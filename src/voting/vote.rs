//! Vote, weight, and result types.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// How votes are aggregated into a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingMethod {
    /// Confidence-and-bonus weighted sum per choice.
    Weighted,
    /// Raw count; the winner must clear half the votes.
    Majority,
    /// Raw count; the largest share wins outright.
    Plurality,
    /// Every vote must agree.
    Unanimous,
    /// Positional points over per-voter rankings.
    Borda,
    /// Pairwise-preference winner over per-voter rankings.
    Condorcet,
}

impl fmt::Display for VotingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Weighted => "weighted",
            Self::Majority => "majority",
            Self::Plurality => "plurality",
            Self::Unanimous => "unanimous",
            Self::Borda => "borda",
            Self::Condorcet => "condorcet",
        };
        write!(f, "{}", s)
    }
}

/// Deterministic rule applied when several choices score within 1% of the
/// top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakMethod {
    /// The choice of the single most confident vote among the tied.
    HighestConfidence,
    /// The tied choice with the largest raw vote count.
    MostVotes,
    /// The tied choice of the highest-verifier-score voter.
    LeaderVote,
    /// Alphabetically first tied choice (deterministic stand-in).
    Random,
}

impl Default for TieBreakMethod {
    fn default() -> Self {
        Self::HighestConfidence
    }
}

impl fmt::Display for TieBreakMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HighestConfidence => "highest_confidence",
            Self::MostVotes => "most_votes",
            Self::LeaderVote => "leader_vote",
            Self::Random => "random",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

/// One agent's vote for a choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Voting agent id.
    pub agent_id: String,
    /// The chosen label.
    pub choice: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Voter's verifier score in [0, 10]; zero when unscored.
    #[serde(default)]
    pub verifier_score: f64,
    /// Voter's specialization domain name.
    #[serde(default)]
    pub specialization: String,
    /// Voter's role name.
    #[serde(default)]
    pub role: String,
    /// Voter's historical accuracy snapshot in [0, 1].
    #[serde(default)]
    pub historical_accuracy: f64,
    /// Free-form reasoning.
    #[serde(default)]
    pub reasoning: String,
    /// When the vote was cast. The epoch value means "unset"; the voting
    /// system stamps it on submission.
    #[serde(default = "epoch")]
    pub timestamp: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl Vote {
    /// Create a vote with an unset timestamp.
    pub fn new(agent_id: impl Into<String>, choice: impl Into<String>, confidence: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            choice: choice.into(),
            confidence,
            verifier_score: 0.0,
            specialization: String::new(),
            role: String::new(),
            historical_accuracy: 0.0,
            reasoning: String::new(),
            timestamp: epoch(),
        }
    }

    /// Builder: set the verifier score.
    pub fn with_verifier_score(mut self, score: f64) -> Self {
        self.verifier_score = score.clamp(0.0, 10.0);
        self
    }

    /// Builder: set specialization and role.
    pub fn with_profile(mut self, specialization: impl Into<String>, role: impl Into<String>) -> Self {
        self.specialization = specialization.into();
        self.role = role.into();
        self
    }

    /// Builder: set the historical accuracy snapshot.
    pub fn with_historical_accuracy(mut self, accuracy: f64) -> Self {
        self.historical_accuracy = accuracy.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the reasoning text.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

// ---------------------------------------------------------------------------
// VoteWeight
// ---------------------------------------------------------------------------

/// Decomposition of one vote's contribution to its choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteWeight {
    /// Base weight: the vote's confidence.
    pub base: f64,
    /// Verifier score normalized to [0, 1].
    pub score_weight: f64,
    /// Uniqueness bonus from specialization/role/choice diversity.
    pub diversity_bonus: f64,
    /// Bonus from historical accuracy.
    pub historical_bonus: f64,
    /// Final multiplied weight.
    pub total: f64,
}

// ---------------------------------------------------------------------------
// VotingResult
// ---------------------------------------------------------------------------

/// Outcome of one aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingResult {
    /// The winning choice.
    pub winning_choice: String,
    /// The winner's aggregated score.
    pub winning_score: f64,
    /// Number of votes (or rankings) that participated.
    pub total_votes: usize,
    /// Aggregated score per choice.
    pub choice_scores: HashMap<String, f64>,
    /// Raw vote count per choice.
    pub choice_counts: HashMap<String, usize>,
    /// Per-agent weight decomposition (weighted method only).
    #[serde(default)]
    pub vote_weights: HashMap<String, VoteWeight>,
    /// Winning share of the total score, in [0, 1].
    pub consensus: f64,
    /// Whether the top choices were effectively tied.
    pub is_tie: bool,
    /// Choices within the tie margin of the top score.
    #[serde(default)]
    pub tie_choices: Vec<String>,
    /// Whether a tie-break rule decided the winner.
    pub tie_break_used: bool,
    /// The tie-break rule applied, when one was.
    #[serde(default)]
    pub tie_break_method: Option<TieBreakMethod>,
    /// The aggregation method that produced this result.
    pub method: VotingMethod,
    /// When the result was computed.
    pub timestamp: DateTime<Utc>,
    /// Opaque pass-through annotations (e.g. fallback markers).
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl VotingResult {
    /// Skeleton result for a method; callers fill the aggregates in.
    pub fn empty(method: VotingMethod) -> Self {
        Self {
            winning_choice: String::new(),
            winning_score: 0.0,
            total_votes: 0,
            choice_scores: HashMap::new(),
            choice_counts: HashMap::new(),
            vote_weights: HashMap::new(),
            consensus: 0.0,
            is_tie: false,
            tie_choices: Vec::new(),
            tie_break_used: false,
            tie_break_method: None,
            method,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentHistory
// ---------------------------------------------------------------------------

/// Rolling per-agent voting record. Survives `reset` calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentHistory {
    /// Votes recorded.
    pub total_votes: u64,
    /// Votes judged correct afterwards.
    pub correct_votes: u64,
    /// correct / total.
    pub accuracy: f64,
    /// Running mean confidence.
    pub avg_confidence: f64,
    /// Timestamp of the last recorded vote.
    pub last_vote: Option<DateTime<Utc>>,
}

impl AgentHistory {
    /// Fold one judged vote into the record.
    pub fn record(&mut self, was_correct: bool, confidence: f64) {
        self.total_votes += 1;
        if was_correct {
            self.correct_votes += 1;
        }
        self.accuracy = self.correct_votes as f64 / self.total_votes as f64;
        let n = self.total_votes as f64;
        self.avg_confidence = (self.avg_confidence * (n - 1.0) + confidence) / n;
        self.last_vote = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_builders() {
        let vote = Vote::new("a1", "A", 0.9)
            .with_verifier_score(8.0)
            .with_profile("security", "red_team")
            .with_historical_accuracy(0.75)
            .with_reasoning("strong evidence");

        assert_eq!(vote.agent_id, "a1");
        assert_eq!(vote.verifier_score, 8.0);
        assert_eq!(vote.specialization, "security");
        assert_eq!(vote.historical_accuracy, 0.75);
        assert_eq!(vote.timestamp, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_history_running_averages() {
        let mut history = AgentHistory::default();
        history.record(true, 0.8);
        history.record(false, 0.6);
        history.record(true, 1.0);

        assert_eq!(history.total_votes, 3);
        assert_eq!(history.correct_votes, 2);
        assert!((history.accuracy - 2.0 / 3.0).abs() < 1e-9);
        assert!((history.avg_confidence - 0.8).abs() < 1e-9);
        assert!(history.last_vote.is_some());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(VotingMethod::Weighted.to_string(), "weighted");
        assert_eq!(VotingMethod::Condorcet.to_string(), "condorcet");
        assert_eq!(TieBreakMethod::LeaderVote.to_string(), "leader_vote");
    }
}
