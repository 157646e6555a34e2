//! Mesh topology: full fan-out.
//!
//! Every pair of agents is connected by a bidirectional weight-1 channel. A
//! message routes to everyone except its sender, and all agents may act in
//! parallel.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DebateError, DebateResult};
use crate::interfaces::TopologyAgent;
use crate::topology::Channel;

/// Mesh adjacency state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshState {
    /// Agent id → ids of every peer.
    pub adjacency: HashMap<String, Vec<String>>,
}

impl MeshState {
    /// Build the mesh state and its channel table.
    pub fn new(agents: &[TopologyAgent]) -> (Self, Vec<Channel>) {
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        let mut channels = Vec::new();

        for (i, a) in agents.iter().enumerate() {
            let peers: Vec<String> = agents
                .iter()
                .filter(|b| b.id != a.id)
                .map(|b| b.id.clone())
                .collect();
            adjacency.insert(a.id.clone(), peers);

            for b in agents.iter().skip(i + 1) {
                channels.push(Channel {
                    from: a.id.clone(),
                    to: b.id.clone(),
                    bidirectional: true,
                    weight: 1.0,
                });
            }
        }

        (Self { adjacency }, channels)
    }

    /// All agents except the sender.
    pub fn route(&self, from: &str) -> DebateResult<Vec<String>> {
        self.adjacency
            .get(from)
            .cloned()
            .ok_or_else(|| DebateError::RouteFailure {
                reason: format!("agent not found: {from}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::projection;

    #[test]
    fn test_mesh_connects_every_pair() {
        let agents = vec![
            projection("a1", "proposer", 8.0),
            projection("a2", "critic", 7.0),
            projection("a3", "reviewer", 6.0),
        ];
        let (state, channels) = MeshState::new(&agents);

        // n*(n-1)/2 bidirectional channels.
        assert_eq!(channels.len(), 3);
        assert!(channels.iter().all(|c| c.bidirectional && c.weight == 1.0));

        for agent in &agents {
            let mut routed = state.route(&agent.id).unwrap();
            routed.push(agent.id.clone());
            routed.sort();
            let mut all: Vec<String> = agents.iter().map(|a| a.id.clone()).collect();
            all.sort();
            assert_eq!(routed, all);
        }
    }

    #[test]
    fn test_mesh_route_unknown_sender() {
        let agents = vec![projection("a1", "proposer", 8.0)];
        let (state, _) = MeshState::new(&agents);
        let err = state.route("ghost").unwrap_err();
        assert_eq!(err.kind(), "route-failure");
    }
}
