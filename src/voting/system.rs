//! The voting system.
//!
//! Holds the current ballot (one vote per agent, newest wins) and the
//! per-agent history that survives resets. The weighted method implements
//! the consensus formula: the winning label maximizes the sum of the vote
//! weights behind it, where each weight is confidence scaled by verifier
//! score, diversity, and historical-accuracy bonuses. Tie detection treats
//! any choice within 1% of the top score as tied and applies a
//! deterministic tie-break rule.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{DebateError, DebateResult};
use crate::interfaces::{AuditEvent, SharedAuditSink};
use crate::voting::ranked;
use crate::voting::vote::{
    AgentHistory, TieBreakMethod, Vote, VoteWeight, VotingMethod, VotingResult,
};

/// Default minimum valid votes for a weighted count.
pub const DEFAULT_MINIMUM_VOTES: usize = 3;
/// Default confidence floor; quieter votes are filtered out.
pub const DEFAULT_MINIMUM_CONFIDENCE: f64 = 0.3;
/// Default weight of the diversity bonus.
pub const DEFAULT_DIVERSITY_WEIGHT: f64 = 0.1;
/// Choices scoring within this fraction of the top are considered tied.
const TIE_MARGIN: f64 = 0.01;
/// Amplitude of the confidence jitter.
const JITTER_AMPLITUDE: f64 = 0.05;

/// Voting system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Minimum valid votes a weighted count needs.
    pub minimum_votes: usize,
    /// Votes below this confidence are filtered out.
    pub minimum_confidence: f64,
    /// Whether the diversity bonus applies.
    pub enable_diversity_bonus: bool,
    /// Weight of the diversity bonus in the total.
    pub diversity_weight: f64,
    /// Whether near-ties are resolved by the tie-break rule.
    pub enable_tie_break: bool,
    /// The tie-break rule to apply.
    pub tie_break_method: TieBreakMethod,
    /// Whether historical accuracy contributes to weights.
    pub enable_historical_weight: bool,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            minimum_votes: DEFAULT_MINIMUM_VOTES,
            minimum_confidence: DEFAULT_MINIMUM_CONFIDENCE,
            enable_diversity_bonus: true,
            diversity_weight: DEFAULT_DIVERSITY_WEIGHT,
            enable_tie_break: true,
            tie_break_method: TieBreakMethod::default(),
            enable_historical_weight: true,
        }
    }
}

/// Collects votes and aggregates them into consensus results.
pub struct VotingSystem {
    config: VotingConfig,
    /// Current ballot: agent id → latest vote. `calculate` reads a snapshot.
    votes: RwLock<HashMap<String, Vote>>,
    /// Rolling accuracy per agent; survives `reset`.
    history: DashMap<String, AgentHistory>,
    audit: Option<SharedAuditSink>,
}

impl VotingSystem {
    /// Create a system with default configuration.
    pub fn new() -> Self {
        Self::with_config(VotingConfig::default())
    }

    /// Create a system with explicit configuration.
    pub fn with_config(config: VotingConfig) -> Self {
        Self {
            config,
            votes: RwLock::new(HashMap::new()),
            history: DashMap::new(),
            audit: None,
        }
    }

    /// Builder: attach an audit sink.
    pub fn with_audit_sink(mut self, sink: SharedAuditSink) -> Self {
        self.audit = Some(sink);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &VotingConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Ballot management
    // -----------------------------------------------------------------------

    /// Record a vote, replacing any earlier vote from the same agent.
    pub fn add_vote(&self, mut vote: Vote) -> DebateResult<()> {
        if vote.agent_id.is_empty() {
            return Err(DebateError::validation("vote agent id is empty"));
        }
        if vote.choice.is_empty() {
            return Err(DebateError::validation("vote choice is empty"));
        }
        if !(0.0..=1.0).contains(&vote.confidence) {
            return Err(DebateError::validation(format!(
                "confidence {} outside [0, 1]",
                vote.confidence
            )));
        }
        if vote.timestamp == DateTime::<Utc>::UNIX_EPOCH {
            vote.timestamp = Utc::now();
        }

        if let Some(sink) = &self.audit {
            sink.record(AuditEvent::VoteCast {
                agent_id: vote.agent_id.clone(),
                choice: vote.choice.clone(),
                confidence: vote.confidence,
                timestamp: vote.timestamp,
            });
        }
        self.votes.write().insert(vote.agent_id.clone(), vote);
        Ok(())
    }

    /// Current number of votes on the ballot.
    pub fn vote_count(&self) -> usize {
        self.votes.read().len()
    }

    /// Copy of the current ballot.
    pub fn votes(&self) -> Vec<Vote> {
        self.votes.read().values().cloned().collect()
    }

    /// Clear the ballot. History is retained.
    pub fn reset(&self) {
        self.votes.write().clear();
    }

    /// Apply a small, seeded, deterministic jitter to every confidence to
    /// break groupthink. Jittered confidences stay in [0, 1].
    pub fn apply_confidence_jitter(&self, seed: u64) {
        let mut votes = self.votes.write();
        for vote in votes.values_mut() {
            let offset = jitter_offset(seed, &vote.agent_id);
            vote.confidence = (vote.confidence + offset).clamp(0.0, 1.0);
        }
    }

    // -----------------------------------------------------------------------
    // Weighted aggregation (primary)
    // -----------------------------------------------------------------------

    /// Weighted count with the configured defaults.
    pub fn calculate(&self) -> DebateResult<VotingResult> {
        self.calculate_weighted()
    }

    /// Weighted count: winner is the choice maximizing the sum of vote
    /// weights behind it.
    pub fn calculate_weighted(&self) -> DebateResult<VotingResult> {
        let snapshot = self.votes();
        let valid: Vec<&Vote> = snapshot
            .iter()
            .filter(|v| v.confidence >= self.config.minimum_confidence)
            .collect();

        if valid.len() < self.config.minimum_votes {
            return Err(DebateError::InsufficientInput {
                what: "votes",
                needed: self.config.minimum_votes,
                got: valid.len(),
            });
        }

        let mut vote_weights: HashMap<String, VoteWeight> = HashMap::new();
        let mut choice_scores: HashMap<String, f64> = HashMap::new();
        let mut choice_counts: HashMap<String, usize> = HashMap::new();

        for vote in &valid {
            let weight = self.weigh(vote, &valid);
            *choice_scores.entry(vote.choice.clone()).or_insert(0.0) += weight.total;
            *choice_counts.entry(vote.choice.clone()).or_insert(0) += 1;
            vote_weights.insert(vote.agent_id.clone(), weight);
        }

        let (mut winner, mut winner_score) = top_choice(&choice_scores);

        // Tie detection within the 1% margin.
        let mut tie_choices: Vec<String> = choice_scores
            .iter()
            .filter(|(_, score)| winner_score - **score <= TIE_MARGIN * winner_score)
            .map(|(choice, _)| choice.clone())
            .collect();
        tie_choices.sort();
        let is_tie = tie_choices.len() > 1;

        let mut tie_break_used = false;
        if is_tie && self.config.enable_tie_break {
            let broken = self.break_tie(&tie_choices, &valid, &choice_counts);
            if let Some(choice) = broken {
                winner_score = choice_scores.get(&choice).copied().unwrap_or(winner_score);
                winner = choice;
                tie_break_used = true;
            }
        }

        let total_score: f64 = choice_scores.values().sum();
        let consensus = if total_score > 0.0 {
            winner_score / total_score
        } else {
            0.0
        };

        let mut result = VotingResult::empty(VotingMethod::Weighted);
        result.winning_choice = winner;
        result.winning_score = winner_score;
        result.total_votes = valid.len();
        result.choice_scores = choice_scores;
        result.choice_counts = choice_counts;
        result.vote_weights = vote_weights;
        result.consensus = consensus;
        result.is_tie = is_tie;
        result.tie_choices = if is_tie { tie_choices } else { Vec::new() };
        result.tie_break_used = tie_break_used;
        result.tie_break_method = tie_break_used.then_some(self.config.tie_break_method);

        log::debug!(
            "weighted count: {} wins with {:.3} ({} votes, consensus {:.3})",
            result.winning_choice,
            result.winning_score,
            result.total_votes,
            result.consensus
        );
        Ok(result)
    }

    /// Decompose one vote's weight against its peers.
    fn weigh(&self, vote: &Vote, valid: &[&Vote]) -> VoteWeight {
        let base = vote.confidence;
        let score_weight = vote.verifier_score / 10.0;

        let diversity_bonus = if self.config.enable_diversity_bonus {
            diversity_bonus(vote, valid)
        } else {
            0.0
        };

        let historical_bonus = if self.config.enable_historical_weight {
            let accuracy = self
                .history
                .get(&vote.agent_id)
                .map(|h| h.accuracy)
                .unwrap_or(vote.historical_accuracy);
            accuracy * 0.2
        } else {
            0.0
        };

        let total = base
            * (1.0 + 0.2 * score_weight)
            * (1.0 + self.config.diversity_weight * diversity_bonus)
            * (1.0 + historical_bonus);

        VoteWeight {
            base,
            score_weight,
            diversity_bonus,
            historical_bonus,
            total,
        }
    }

    /// Resolve a near-tie with the configured deterministic rule.
    fn break_tie(
        &self,
        tied: &[String],
        valid: &[&Vote],
        counts: &HashMap<String, usize>,
    ) -> Option<String> {
        let in_tie = |choice: &String| tied.contains(choice);

        match self.config.tie_break_method {
            TieBreakMethod::HighestConfidence => valid
                .iter()
                .filter(|v| in_tie(&v.choice))
                .max_by(|a, b| {
                    a.confidence
                        .partial_cmp(&b.confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.choice.cmp(&a.choice))
                        .then_with(|| b.agent_id.cmp(&a.agent_id))
                })
                .map(|v| v.choice.clone()),
            TieBreakMethod::MostVotes => tied
                .iter()
                .max_by(|a, b| {
                    counts
                        .get(*a)
                        .copied()
                        .unwrap_or(0)
                        .cmp(&counts.get(*b).copied().unwrap_or(0))
                        .then_with(|| b.cmp(a))
                })
                .cloned(),
            TieBreakMethod::LeaderVote => valid
                .iter()
                .filter(|v| in_tie(&v.choice))
                .max_by(|a, b| {
                    a.verifier_score
                        .partial_cmp(&b.verifier_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.agent_id.cmp(&a.agent_id))
                })
                .map(|v| v.choice.clone()),
            TieBreakMethod::Random => tied.iter().min().cloned(),
        }
    }

    // -----------------------------------------------------------------------
    // Alternative methods
    // -----------------------------------------------------------------------

    /// Raw-count majority: the winner must clear half the votes, otherwise
    /// the result is flagged as a tie.
    pub fn calculate_majority(&self) -> DebateResult<VotingResult> {
        let (counts, total) = self.raw_counts()?;
        let (winner, winner_count) = top_count(&counts);

        let mut result = VotingResult::empty(VotingMethod::Majority);
        result.winning_choice = winner;
        result.winning_score = winner_count as f64;
        result.total_votes = total;
        result.consensus = winner_count as f64 / total as f64;
        result.is_tie = winner_count * 2 <= total;
        result.choice_scores = counts.iter().map(|(c, n)| (c.clone(), *n as f64)).collect();
        result.choice_counts = counts;
        Ok(result)
    }

    /// Raw-count plurality: the largest share wins; equal top counts are
    /// resolved with the configured tie-break rule.
    pub fn calculate_plurality(&self) -> DebateResult<VotingResult> {
        let (counts, total) = self.raw_counts()?;
        let (mut winner, winner_count) = top_count(&counts);

        let mut tie_choices: Vec<String> = counts
            .iter()
            .filter(|(_, n)| **n == winner_count)
            .map(|(c, _)| c.clone())
            .collect();
        tie_choices.sort();
        let is_tie = tie_choices.len() > 1;

        let mut tie_break_used = false;
        if is_tie && self.config.enable_tie_break {
            let snapshot = self.votes();
            let valid: Vec<&Vote> = snapshot.iter().collect();
            if let Some(choice) = self.break_tie(&tie_choices, &valid, &counts) {
                winner = choice;
                tie_break_used = true;
            }
        }

        let mut result = VotingResult::empty(VotingMethod::Plurality);
        result.winning_choice = winner;
        result.winning_score = winner_count as f64;
        result.total_votes = total;
        result.consensus = winner_count as f64 / total as f64;
        result.is_tie = is_tie;
        result.tie_choices = if is_tie { tie_choices } else { Vec::new() };
        result.tie_break_used = tie_break_used;
        result.tie_break_method = tie_break_used.then_some(self.config.tie_break_method);
        result.choice_scores = counts.iter().map(|(c, n)| (c.clone(), *n as f64)).collect();
        result.choice_counts = counts;
        Ok(result)
    }

    /// Unanimous: succeeds only when every vote names the same choice.
    pub fn calculate_unanimous(&self) -> DebateResult<VotingResult> {
        let (counts, total) = self.raw_counts()?;
        let (winner, winner_count) = top_count(&counts);
        let unanimous = counts.len() == 1;

        let mut result = VotingResult::empty(VotingMethod::Unanimous);
        result.winning_choice = winner;
        result.winning_score = winner_count as f64;
        result.total_votes = total;
        result.consensus = winner_count as f64 / total as f64;
        result.is_tie = !unanimous;
        result.choice_scores = counts.iter().map(|(c, n)| (c.clone(), *n as f64)).collect();
        result.choice_counts = counts;
        Ok(result)
    }

    /// Borda count over explicit per-voter rankings.
    pub fn calculate_borda(&self, rankings: &[Vec<String>]) -> DebateResult<VotingResult> {
        ranked::calculate_borda(rankings)
    }

    /// Condorcet winner over explicit per-voter rankings, with Borda
    /// fallback on cycles.
    pub fn calculate_condorcet(&self, rankings: &[Vec<String>]) -> DebateResult<VotingResult> {
        ranked::calculate_condorcet(rankings)
    }

    /// Pick an aggregation method for a debate of the given size.
    pub fn select_method(&self, agent_count: usize) -> VotingMethod {
        if agent_count < 3 {
            VotingMethod::Unanimous
        } else if agent_count <= 5 {
            VotingMethod::Weighted
        } else {
            VotingMethod::Borda
        }
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Fold a judged vote into the agent's rolling record.
    pub fn update_history(&self, agent_id: &str, was_correct: bool, confidence: f64) {
        self.history
            .entry(agent_id.to_string())
            .or_default()
            .record(was_correct, confidence);
    }

    /// Copy of an agent's history, when any.
    pub fn history(&self, agent_id: &str) -> Option<AgentHistory> {
        self.history.get(agent_id).map(|h| h.value().clone())
    }

    fn raw_counts(&self) -> DebateResult<(HashMap<String, usize>, usize)> {
        let snapshot = self.votes.read();
        if snapshot.is_empty() {
            return Err(DebateError::InsufficientInput {
                what: "votes",
                needed: 1,
                got: 0,
            });
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        for vote in snapshot.values() {
            *counts.entry(vote.choice.clone()).or_insert(0) += 1;
        }
        Ok((counts, snapshot.len()))
    }
}

impl Default for VotingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VotingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingSystem")
            .field("votes", &self.votes.read().len())
            .field("tracked_agents", &self.history.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Weight helpers
// ---------------------------------------------------------------------------

/// Uniqueness of one vote against its peers:
/// 0.4·(1 − specShare) + 0.4·(1 − roleShare) + 0.2·(0.1 if minority).
fn diversity_bonus(vote: &Vote, valid: &[&Vote]) -> f64 {
    let peers: Vec<&&Vote> = valid.iter().filter(|v| v.agent_id != vote.agent_id).collect();
    if peers.is_empty() {
        return 0.0;
    }
    let n = peers.len() as f64;

    let spec_share = peers
        .iter()
        .filter(|v| v.specialization == vote.specialization)
        .count() as f64
        / n;
    let role_share = peers.iter().filter(|v| v.role == vote.role).count() as f64 / n;
    let same_choice = peers.iter().filter(|v| v.choice == vote.choice).count() as f64;
    let minority = if same_choice < n / 2.0 { 0.1 } else { 0.0 };

    0.4 * (1.0 - spec_share) + 0.4 * (1.0 - role_share) + 0.2 * minority
}

/// Argmax by score with alphabetical tie resolution.
fn top_choice(scores: &HashMap<String, f64>) -> (String, f64) {
    let mut best: Option<(&String, f64)> = None;
    for (choice, score) in scores {
        let better = match best {
            None => true,
            Some((c, s)) => *score > s || (*score == s && choice < c),
        };
        if better {
            best = Some((choice, *score));
        }
    }
    let (choice, score) = best.expect("non-empty scores");
    (choice.clone(), score)
}

/// Argmax by count with alphabetical tie resolution.
fn top_count(counts: &HashMap<String, usize>) -> (String, usize) {
    let mut best: Option<(&String, usize)> = None;
    for (choice, count) in counts {
        let better = match best {
            None => true,
            Some((c, n)) => *count > n || (*count == n && choice < c),
        };
        if better {
            best = Some((choice, *count));
        }
    }
    let (choice, count) = best.expect("non-empty counts");
    (choice.clone(), count)
}

/// FNV-1a over the seed and agent id, mapped into ±amplitude.
fn jitter_offset(seed: u64, agent_id: &str) -> f64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in seed.to_le_bytes().iter().chain(agent_id.as_bytes()) {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    let unit = (hash >> 11) as f64 / (1u64 << 53) as f64; // [0, 1)
    (unit * 2.0 - 1.0) * JITTER_AMPLITUDE
}
