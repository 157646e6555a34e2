//! Star topology: hub and spokes.
//!
//! A hub is elected at initialization — the agent with the highest topology
//! score, ties to the lexicographically smallest id — and every other agent
//! gets a bidirectional channel to it. The hub fans out to all spokes; a
//! spoke can only reach the hub.

use serde::{Deserialize, Serialize};

use crate::error::{DebateError, DebateResult};
use crate::interfaces::TopologyAgent;
use crate::topology::Channel;

/// Star hub state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarState {
    /// Elected hub agent id.
    pub hub_id: String,
    /// Spoke agent ids.
    pub spoke_ids: Vec<String>,
}

impl StarState {
    /// Elect the hub and build the channel table.
    pub fn new(agents: &[TopologyAgent]) -> (Self, Vec<Channel>) {
        let hub_id = elect_hub(agents);
        let spoke_ids: Vec<String> = agents
            .iter()
            .filter(|a| a.id != hub_id)
            .map(|a| a.id.clone())
            .collect();

        let channels = spoke_ids
            .iter()
            .map(|spoke| Channel {
                from: hub_id.clone(),
                to: spoke.clone(),
                bidirectional: true,
                weight: 1.0,
            })
            .collect();

        (Self { hub_id, spoke_ids }, channels)
    }

    /// Hub → all spokes; spoke → hub only.
    pub fn route(&self, from: &str) -> DebateResult<Vec<String>> {
        if from == self.hub_id {
            Ok(self.spoke_ids.clone())
        } else if self.spoke_ids.iter().any(|s| s == from) {
            Ok(vec![self.hub_id.clone()])
        } else {
            Err(DebateError::RouteFailure {
                reason: format!("agent not found: {from}"),
            })
        }
    }
}

/// Highest score wins; ties go to the smallest id.
fn elect_hub(agents: &[TopologyAgent]) -> String {
    let mut best = &agents[0];
    for agent in &agents[1..] {
        let better = agent.score > best.score
            || (agent.score == best.score && agent.id < best.id);
        if better {
            best = agent;
        }
    }
    best.id.clone()
}
