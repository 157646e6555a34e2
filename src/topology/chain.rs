//! Chain topology: sequential hand-off.
//!
//! Agents are ordered by the fixed role precedence, ties broken by verifier
//! score descending (then id, so ordering is total). Channels run one way
//! down the chain with a weaker loop-back from the tail to the head. A
//! message routes only to the next agent, and a cursor advances one step per
//! processed message.

use serde::{Deserialize, Serialize};

use crate::domain::{chain_precedence_index, DebateRole};
use crate::error::{DebateError, DebateResult};
use crate::interfaces::TopologyAgent;
use crate::topology::Channel;

/// Weight of the tail → head loop-back channel.
pub const LOOPBACK_WEIGHT: f64 = 0.5;

/// Chain ordering and cursor state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainState {
    /// Agent ids in chain order.
    pub order: Vec<String>,
    /// Index of the agent whose turn it is.
    pub position: usize,
}

impl ChainState {
    /// Order the agents and build the channel table.
    pub fn new(agents: &[TopologyAgent]) -> (Self, Vec<Channel>) {
        let order = order_by_precedence(agents);
        let channels = build_channels(&order);
        (Self { order, position: 0 }, channels)
    }

    /// The next agent in the chain, wrapping at the tail.
    pub fn route(&self, from: &str) -> DebateResult<Vec<String>> {
        let index = self
            .order
            .iter()
            .position(|id| id == from)
            .ok_or_else(|| DebateError::RouteFailure {
                reason: format!("agent not found: {from}"),
            })?;
        let next = (index + 1) % self.order.len();
        Ok(vec![self.order[next].clone()])
    }

    /// Advance the cursor one step.
    pub fn advance(&mut self) {
        self.position = (self.position + 1) % self.order.len();
    }

    /// Replace the ordering. The new order must be a permutation of the
    /// current membership; the cursor resets to the head.
    pub fn reorder(&mut self, ids: Vec<String>) -> DebateResult<Vec<Channel>> {
        let mut current = self.order.clone();
        let mut proposed = ids.clone();
        current.sort();
        proposed.sort();
        if current != proposed {
            return Err(DebateError::validation(
                "reorder must be a permutation of the current chain",
            ));
        }

        self.order = ids;
        self.position = 0;
        Ok(build_channels(&self.order))
    }
}

/// Sort by role precedence, then verifier score descending, then id.
/// Agents whose role does not parse sort after every listed role.
fn order_by_precedence(agents: &[TopologyAgent]) -> Vec<String> {
    let mut ordered: Vec<&TopologyAgent> = agents.iter().collect();
    ordered.sort_by(|a, b| {
        let pa = role_rank(&a.role);
        let pb = role_rank(&b.role);
        pa.cmp(&pb)
            .then_with(|| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered.into_iter().map(|a| a.id.clone()).collect()
}

fn role_rank(role: &str) -> usize {
    DebateRole::parse(role)
        .map(chain_precedence_index)
        .unwrap_or(usize::MAX)
}

/// Unidirectional links down the chain plus the weak loop-back.
fn build_channels(order: &[String]) -> Vec<Channel> {
    let mut channels = Vec::new();
    for pair in order.windows(2) {
        channels.push(Channel {
            from: pair[0].clone(),
            to: pair[1].clone(),
            bidirectional: false,
            weight: 1.0,
        });
    }
    if order.len() > 1 {
        channels.push(Channel {
            from: order[order.len() - 1].clone(),
            to: order[0].clone(),
            bidirectional: false,
            weight: LOOPBACK_WEIGHT,
        });
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::projection;

    #[test]
    fn test_order_follows_role_precedence() {
        // Deliberately shuffled input, equal scores.
        let agents = vec![
            projection("mod", "moderator", 7.0),
            projection("rev", "reviewer", 7.0),
            projection("prop", "proposer", 7.0),
            projection("opt", "optimizer", 7.0),
            projection("crit", "critic", 7.0),
        ];
        let (state, _) = ChainState::new(&agents);
        assert_eq!(state.order, vec!["prop", "crit", "rev", "opt", "mod"]);
    }

    #[test]
    fn test_order_ties_break_by_score_desc() {
        let agents = vec![
            projection("low", "proposer", 5.0),
            projection("high", "proposer", 9.0),
        ];
        let (state, _) = ChainState::new(&agents);
        assert_eq!(state.order, vec!["high", "low"]);
    }

    #[test]
    fn test_unknown_roles_append_after_listed() {
        let agents = vec![
            projection("odd", "oracle", 9.9),
            projection("prop", "proposer", 1.0),
        ];
        let (state, _) = ChainState::new(&agents);
        assert_eq!(state.order, vec!["prop", "odd"]);
    }

    #[test]
    fn test_route_is_next_with_wraparound() {
        let agents = vec![
            projection("prop", "proposer", 7.0),
            projection("crit", "critic", 7.0),
            projection("mod", "moderator", 7.0),
        ];
        let (state, _) = ChainState::new(&agents);

        assert_eq!(state.route("prop").unwrap(), vec!["crit"]);
        assert_eq!(state.route("crit").unwrap(), vec!["mod"]);
        assert_eq!(state.route("mod").unwrap(), vec!["prop"]);
        assert_eq!(state.route("ghost").unwrap_err().kind(), "route-failure");
    }

    #[test]
    fn test_channels_are_unidirectional_with_weak_loopback() {
        let agents = vec![
            projection("prop", "proposer", 7.0),
            projection("crit", "critic", 7.0),
            projection("mod", "moderator", 7.0),
        ];
        let (_, channels) = ChainState::new(&agents);

        assert_eq!(channels.len(), 3);
        assert!(channels.iter().all(|c| !c.bidirectional));
        let loopback = channels.last().unwrap();
        assert_eq!(loopback.from, "mod");
        assert_eq!(loopback.to, "prop");
        assert_eq!(loopback.weight, LOOPBACK_WEIGHT);
        assert!(channels[..2].iter().all(|c| c.weight == 1.0));
    }

    #[test]
    fn test_advance_wraps() {
        let agents = vec![
            projection("a", "proposer", 7.0),
            projection("b", "critic", 7.0),
        ];
        let (mut state, _) = ChainState::new(&agents);
        assert_eq!(state.position, 0);
        state.advance();
        assert_eq!(state.position, 1);
        state.advance();
        assert_eq!(state.position, 0);
    }

    #[test]
    fn test_reorder_validates_membership() {
        let agents = vec![
            projection("a", "proposer", 7.0),
            projection("b", "critic", 7.0),
        ];
        let (mut state, _) = ChainState::new(&agents);

        let err = state
            .reorder(vec!["a".into(), "ghost".into()])
            .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let channels = state.reorder(vec!["b".into(), "a".into()]).unwrap();
        assert_eq!(state.order, vec!["b", "a"]);
        assert_eq!(state.position, 0);
        assert_eq!(channels[0].from, "b");
    }
}
