//! Ranked-ballot aggregation: Borda count and Condorcet.
//!
//! Both operate on per-voter rankings (best first). A candidate missing
//! from a ranking is considered worse than every ranked candidate on that
//! ballot. When no Condorcet winner exists the count falls back to Borda
//! and annotates the result metadata.

use std::collections::{BTreeSet, HashMap};

use serde_json::json;

use crate::error::{DebateError, DebateResult};
use crate::voting::vote::{VotingMethod, VotingResult};

/// Compute a Borda count over the rankings.
///
/// A ballot awards `n - 1 - index` points to the candidate at `index`,
/// clamped at zero, where `n` is the number of distinct candidates across
/// all ballots. Tied top scores resolve to the alphabetically first
/// candidate, deterministically.
pub fn calculate_borda(rankings: &[Vec<String>]) -> DebateResult<VotingResult> {
    let candidates = candidate_set(rankings)?;
    let n = candidates.len();

    let mut points: HashMap<String, f64> = candidates.iter().map(|c| (c.clone(), 0.0)).collect();
    let mut first_place: HashMap<String, usize> = HashMap::new();

    for ranking in rankings {
        for (index, candidate) in ranking.iter().enumerate() {
            let award = n.saturating_sub(1).saturating_sub(index) as f64;
            *points.entry(candidate.clone()).or_insert(0.0) += award;
        }
        if let Some(top) = ranking.first() {
            *first_place.entry(top.clone()).or_insert(0) += 1;
        }
    }

    let (winner, winner_points) = top_choice(&points);
    let tied: Vec<String> = points
        .iter()
        .filter(|(_, p)| (winner_points - **p).abs() < f64::EPSILON)
        .map(|(c, _)| c.clone())
        .collect();
    let is_tie = tied.len() > 1;

    let total_points: f64 = points.values().sum();
    let mut result = VotingResult::empty(VotingMethod::Borda);
    result.winning_choice = winner;
    result.winning_score = winner_points;
    result.total_votes = rankings.len();
    result.choice_scores = points;
    result.choice_counts = first_place;
    result.consensus = if total_points > 0.0 {
        winner_points / total_points
    } else {
        0.0
    };
    result.is_tie = is_tie;
    if is_tie {
        let mut tied = tied;
        tied.sort();
        result.tie_choices = tied;
        result.tie_break_used = true;
    }
    Ok(result)
}

/// Find the Condorcet winner — the candidate beating every other candidate
/// head-to-head — or fall back to Borda when the pairwise relation cycles.
pub fn calculate_condorcet(rankings: &[Vec<String>]) -> DebateResult<VotingResult> {
    let candidates = candidate_set(rankings)?;
    let names: Vec<String> = candidates.iter().cloned().collect();

    // wins[a][b] = voters preferring a over b.
    let mut wins: HashMap<(usize, usize), usize> = HashMap::new();
    for ranking in rankings {
        let position = |candidate: &str| ranking.iter().position(|c| c == candidate);
        for (i, a) in names.iter().enumerate() {
            for (j, b) in names.iter().enumerate() {
                if i == j {
                    continue;
                }
                let prefers_a = match (position(a), position(b)) {
                    (Some(pa), Some(pb)) => pa < pb,
                    // Ranked beats unranked; two unranked express nothing.
                    (Some(_), None) => true,
                    _ => false,
                };
                if prefers_a {
                    *wins.entry((i, j)).or_insert(0) += 1;
                }
            }
        }
    }

    let beats = |i: usize, j: usize| {
        wins.get(&(i, j)).copied().unwrap_or(0) > wins.get(&(j, i)).copied().unwrap_or(0)
    };

    let condorcet_winner = (0..names.len())
        .find(|&i| (0..names.len()).all(|j| i == j || beats(i, j)));

    match condorcet_winner {
        Some(index) => {
            // Copeland scores for reporting: head-to-head wins per candidate.
            let mut scores: HashMap<String, f64> = HashMap::new();
            for (i, name) in names.iter().enumerate() {
                let won = (0..names.len()).filter(|&j| i != j && beats(i, j)).count();
                scores.insert(name.clone(), won as f64);
            }

            let opponents = (names.len() - 1).max(1) as f64;
            let winner = names[index].clone();
            let winner_score = scores[&winner];

            let mut result = VotingResult::empty(VotingMethod::Condorcet);
            result.winning_choice = winner;
            result.winning_score = winner_score;
            result.total_votes = rankings.len();
            result.choice_scores = scores;
            result.consensus = winner_score / opponents;
            Ok(result)
        }
        None => {
            log::debug!("no condorcet winner among {} candidates, falling back to borda", names.len());
            let mut result = calculate_borda(rankings)?;
            result.method = VotingMethod::Condorcet;
            result.metadata.insert("fallback_used".into(), json!(true));
            result
                .metadata
                .insert("fallback_reason".into(), json!("condorcet_cycle"));
            Ok(result)
        }
    }
}

/// Distinct candidates across all ballots, ordered for determinism.
fn candidate_set(rankings: &[Vec<String>]) -> DebateResult<BTreeSet<String>> {
    if rankings.is_empty() {
        return Err(DebateError::InsufficientInput {
            what: "rankings",
            needed: 1,
            got: 0,
        });
    }
    let set: BTreeSet<String> = rankings.iter().flatten().cloned().collect();
    if set.is_empty() {
        return Err(DebateError::validation("rankings contain no candidates"));
    }
    Ok(set)
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
