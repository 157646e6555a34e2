//! Communication topologies for debate rounds.
//!
//! A topology governs which agents may exchange messages and in what order.
//! The three variants — mesh (full fan-out), star (hub and spokes), chain
//! (sequential hand-off) — share one interface: routing, dispatch over
//! bounded queues, per-phase leader selection, and parallel-group
//! enumeration. Per-variant state lives in distinct records behind a tagged
//! variant; topology state only changes during initialization or an explicit
//! chain reorder, so routing always reads a stable snapshot.
//!
//! Topologies hold agent projections indexed by id, never live agents; the
//! pool stays the owner of agent state.

pub mod chain;
pub mod dispatcher;
pub mod mesh;
pub mod message;
pub mod star;

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::{DebatePhase, DebateRole};
use crate::error::{DebateError, DebateResult};
use crate::interfaces::TopologyAgent;

pub use self::chain::ChainState;
pub use self::dispatcher::{DispatchStats, DispatcherConfig, MessageDispatcher};
pub use self::mesh::MeshState;
pub use self::message::{DebateMessage, MessageRecipients};
pub use self::star::StarState;

// ---------------------------------------------------------------------------
// Kind and channels
// ---------------------------------------------------------------------------

/// Which communication shape a topology uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// Every agent talks to every agent.
    Mesh,
    /// All traffic passes through an elected hub.
    Star,
    /// Agents hand off sequentially.
    Chain,
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TopologyKind::Mesh => "mesh",
            TopologyKind::Star => "star",
            TopologyKind::Chain => "chain",
        };
        write!(f, "{}", s)
    }
}

/// One communication channel between two agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Source agent id.
    pub from: String,
    /// Destination agent id.
    pub to: String,
    /// Whether traffic flows both ways.
    pub bidirectional: bool,
    /// Relative channel weight.
    pub weight: f64,
}

/// Per-variant topology state.
#[derive(Debug, Clone)]
enum TopologyState {
    Mesh(MeshState),
    Star(StarState),
    Chain(ChainState),
}

// ---------------------------------------------------------------------------
// DebateTopology
// ---------------------------------------------------------------------------

/// An initialized communication topology over a set of agents.
pub struct DebateTopology {
    kind: TopologyKind,
    /// Agents in topology order (star: hub first, chain: chain order).
    agents: Vec<TopologyAgent>,
    channels: RwLock<Vec<Channel>>,
    state: RwLock<TopologyState>,
    dispatcher: MessageDispatcher,
}

impl DebateTopology {
    /// Initialize a topology of the given kind over the agents.
    pub fn new(kind: TopologyKind, agents: Vec<TopologyAgent>) -> DebateResult<Self> {
        Self::with_config(kind, agents, DispatcherConfig::default())
    }

    /// Initialize with explicit dispatcher tuning.
    pub fn with_config(
        kind: TopologyKind,
        agents: Vec<TopologyAgent>,
        config: DispatcherConfig,
    ) -> DebateResult<Self> {
        if agents.is_empty() {
            return Err(DebateError::validation("topology needs at least one agent"));
        }
        let mut seen = HashSet::new();
        for agent in &agents {
            if agent.id.is_empty() {
                return Err(DebateError::validation("agent id is empty"));
            }
            if !seen.insert(agent.id.clone()) {
                return Err(DebateError::validation(format!(
                    "duplicate agent id: {}",
                    agent.id
                )));
            }
        }

        let (state, channels, agents) = match kind {
            TopologyKind::Mesh => {
                let (state, channels) = MeshState::new(&agents);
                (TopologyState::Mesh(state), channels, agents)
            }
            TopologyKind::Star => {
                let (state, channels) = StarState::new(&agents);
                let ordered = order_hub_first(agents, &state.hub_id);
                (TopologyState::Star(state), channels, ordered)
            }
            TopologyKind::Chain => {
                let (state, channels) = ChainState::new(&agents);
                let ordered = order_by_ids(agents, &state.order);
                (TopologyState::Chain(state), channels, ordered)
            }
        };

        let dispatcher = MessageDispatcher::new(config);
        for agent in &agents {
            dispatcher.register(&agent.id);
        }

        log::debug!("initialized {} topology with {} agent(s)", kind, agents.len());
        Ok(Self {
            kind,
            agents,
            channels: RwLock::new(channels),
            state: RwLock::new(state),
            dispatcher,
        })
    }

    /// The topology's kind.
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Agents in topology order, as registered at initialization.
    pub fn agents(&self) -> &[TopologyAgent] {
        &self.agents
    }

    /// Number of agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Snapshot of the channel table.
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.read().clone()
    }

    /// The star hub id, when this is a star topology.
    pub fn hub_id(&self) -> Option<String> {
        match &*self.state.read() {
            TopologyState::Star(star) => Some(star.hub_id.clone()),
            _ => None,
        }
    }

    /// The chain order, when this is a chain topology.
    pub fn chain_order(&self) -> Option<Vec<String>> {
        match &*self.state.read() {
            TopologyState::Chain(chain) => Some(chain.order.clone()),
            _ => None,
        }
    }

    /// The chain cursor position, when this is a chain topology.
    pub fn chain_position(&self) -> Option<usize> {
        match &*self.state.read() {
            TopologyState::Chain(chain) => Some(chain.position),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Routing and dispatch
    // -----------------------------------------------------------------------

    /// Compute the recipients the topology allows for this message.
    ///
    /// Explicit addressing narrows the allowed set; it never widens it. A
    /// message left with nobody to receive it is a route failure.
    pub fn route(&self, message: &DebateMessage) -> DebateResult<Vec<String>> {
        let allowed = match &*self.state.read() {
            TopologyState::Mesh(mesh) => mesh.route(&message.from)?,
            TopologyState::Star(star) => star.route(&message.from)?,
            TopologyState::Chain(chain) => chain.route(&message.from)?,
        };

        let recipients = match &message.to {
            MessageRecipients::Broadcast => allowed,
            MessageRecipients::Agents(ids) => {
                let requested: HashSet<&String> = ids.iter().collect();
                allowed
                    .into_iter()
                    .filter(|id| requested.contains(id))
                    .collect()
            }
        };

        if recipients.is_empty() {
            return Err(DebateError::RouteFailure {
                reason: format!("nowhere to send from {}", message.from),
            });
        }
        Ok(recipients)
    }

    /// Route and deliver a message, returning the recipients reached.
    ///
    /// Chain topologies advance their cursor exactly once per message
    /// processed to completion.
    pub async fn send(
        &self,
        message: DebateMessage,
        token: &CancellationToken,
    ) -> DebateResult<Vec<String>> {
        if token.is_cancelled() {
            return Err(DebateError::cancelled("send"));
        }

        let recipients = self.route(&message)?;
        let deliveries = futures::future::join_all(
            recipients
                .iter()
                .map(|recipient| self.dispatcher.deliver(recipient, message.clone(), token)),
        )
        .await;
        for delivery in deliveries {
            delivery?;
        }

        if let TopologyState::Chain(chain) = &mut *self.state.write() {
            chain.advance();
        }
        Ok(recipients)
    }

    /// Deliver to everyone the topology allows, ignoring explicit addressing.
    pub async fn broadcast(
        &self,
        mut message: DebateMessage,
        token: &CancellationToken,
    ) -> DebateResult<Vec<String>> {
        message.to = MessageRecipients::Broadcast;
        self.send(message, token).await
    }

    /// Take ownership of an agent's inbound queue.
    pub fn take_receiver(
        &self,
        agent_id: &str,
    ) -> Option<tokio::sync::mpsc::Receiver<DebateMessage>> {
        self.dispatcher.take_receiver(agent_id)
    }

    /// Message counter snapshot.
    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Close the topology: cancel in-flight sends and drop all queues.
    pub fn close(&self) {
        self.dispatcher.close();
    }

    // -----------------------------------------------------------------------
    // Leaders and parallelism
    // -----------------------------------------------------------------------

    /// Select the leader for a phase: the first agent in topology order
    /// whose primary role is preferred for the phase, falling back to the
    /// first agent.
    pub fn select_leader(&self, phase: DebatePhase) -> TopologyAgent {
        let preferred = phase.preferred_roles();
        self.agents
            .iter()
            .find(|agent| {
                DebateRole::parse(&agent.role)
                    .map(|role| preferred.contains(&role))
                    .unwrap_or(false)
            })
            .unwrap_or(&self.agents[0])
            .clone()
    }

    /// Groups of agent ids that may act concurrently in a phase, in
    /// execution order.
    pub fn parallel_groups(&self, _phase: DebatePhase) -> Vec<Vec<String>> {
        match &*self.state.read() {
            TopologyState::Mesh(_) => {
                vec![self.agents.iter().map(|a| a.id.clone()).collect()]
            }
            TopologyState::Star(star) => {
                vec![star.spoke_ids.clone(), vec![star.hub_id.clone()]]
            }
            TopologyState::Chain(chain) => {
                chain.order.iter().map(|id| vec![id.clone()]).collect()
            }
        }
    }

    /// Atomically replace the chain ordering. Fails for mesh and star.
    pub fn reorder_chain(&self, ids: Vec<String>) -> DebateResult<()> {
        let mut state = self.state.write();
        match &mut *state {
            TopologyState::Chain(chain) => {
                let channels = chain.reorder(ids)?;
                *self.channels.write() = channels;
                Ok(())
            }
            _ => Err(DebateError::validation(format!(
                "reorder applies to chain topology, not {}",
                self.kind
            ))),
        }
    }
}

impl fmt::Debug for DebateTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebateTopology")
            .field("kind", &self.kind)
            .field("agents", &self.agents.len())
            .field("channels", &self.channels.read().len())
            .finish()
    }
}

/// Reorder so the hub leads, preserving relative spoke order.
fn order_hub_first(mut agents: Vec<TopologyAgent>, hub_id: &str) -> Vec<TopologyAgent> {
    if let Some(pos) = agents.iter().position(|a| a.id == hub_id) {
        let hub = agents.remove(pos);
        agents.insert(0, hub);
    }
    agents
}

/// Reorder agents to match an id sequence.
fn order_by_ids(agents: Vec<TopologyAgent>, order: &[String]) -> Vec<TopologyAgent> {
    let mut by_id: HashMap<String, TopologyAgent> =
        agents.into_iter().map(|a| (a.id.clone(), a)).collect();
    order.iter().filter_map(|id| by_id.remove(id)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Test helper: a minimal agent projection.
    pub(crate) fn projection(id: &str, role: &str, score: f64) -> TopologyAgent {
        TopologyAgent {
            id: id.to_string(),
            role: role.to_string(),
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            score,
            confidence: 0.8,
            specialization: "general".to_string(),
            capabilities: vec![],
            metadata: HashMap::new(),
        }
    }

    fn msg(from: &str) -> DebateMessage {
        DebateMessage::new(from, json!("body"), 1, DebatePhase::Proposal)
    }

    #[test]
    fn test_mesh_route_covers_everyone_but_sender() {
        let topology = DebateTopology::new(
            TopologyKind::Mesh,
            vec![
                projection("a1", "proposer", 8.0),
                projection("a2", "critic", 7.0),
                projection("a3", "reviewer", 6.0),
            ],
        )
        .unwrap();

        let mut routed = topology.route(&msg("a2")).unwrap();
        routed.push("a2".to_string());
        routed.sort();
        assert_eq!(routed, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn test_star_spoke_routes_only_to_hub() {
        let topology = DebateTopology::new(
            TopologyKind::Star,
            vec![
                projection("s1", "proposer", 5.0),
                projection("hub", "moderator", 9.0),
                projection("s2", "critic", 6.0),
            ],
        )
        .unwrap();

        assert_eq!(topology.hub_id().unwrap(), "hub");
        assert_eq!(topology.agents()[0].id, "hub");
        assert_eq!(topology.route(&msg("s1")).unwrap(), vec!["hub"]);

        let mut from_hub = topology.route(&msg("hub")).unwrap();
        from_hub.sort();
        assert_eq!(from_hub, vec!["s1", "s2"]);
    }

    #[test]
    fn test_chain_scenario_roles_and_routing() {
        // Equal scores; ordering must follow role precedence alone.
        let topology = DebateTopology::new(
            TopologyKind::Chain,
            vec![
                projection("rev", "reviewer", 7.0),
                projection("mod", "moderator", 7.0),
                projection("prop", "proposer", 7.0),
                projection("crit", "critic", 7.0),
                projection("opt", "optimizer", 7.0),
            ],
        )
        .unwrap();

        assert_eq!(
            topology.chain_order().unwrap(),
            vec!["prop", "crit", "rev", "opt", "mod"]
        );
        assert_eq!(topology.route(&msg("prop")).unwrap(), vec!["crit"]);

        let leader = topology.select_leader(DebatePhase::Critique);
        assert_eq!(leader.id, "crit");
    }

    #[test]
    fn test_leader_prefers_phase_roles_and_falls_back() {
        let topology = DebateTopology::new(
            TopologyKind::Mesh,
            vec![
                projection("a1", "reviewer", 8.0),
                projection("a2", "optimizer", 7.0),
            ],
        )
        .unwrap();

        assert_eq!(topology.select_leader(DebatePhase::Review).id, "a1");
        assert_eq!(topology.select_leader(DebatePhase::Optimization).id, "a2");
        // Nobody holds a proposal role: fall back to the first agent.
        assert_eq!(topology.select_leader(DebatePhase::Proposal).id, "a1");
    }

    #[test]
    fn test_parallel_groups_shapes() {
        let agents = vec![
            projection("a1", "proposer", 9.0),
            projection("a2", "critic", 7.0),
            projection("a3", "reviewer", 6.0),
        ];

        let mesh = DebateTopology::new(TopologyKind::Mesh, agents.clone()).unwrap();
        assert_eq!(mesh.parallel_groups(DebatePhase::Proposal).len(), 1);
        assert_eq!(mesh.parallel_groups(DebatePhase::Proposal)[0].len(), 3);

        let star = DebateTopology::new(TopologyKind::Star, agents.clone()).unwrap();
        let groups = star.parallel_groups(DebatePhase::Proposal);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2); // spokes act concurrently
        assert_eq!(groups[1], vec!["a1".to_string()]); // hub is sequential

        let chain = DebateTopology::new(TopologyKind::Chain, agents).unwrap();
        let groups = chain.parallel_groups(DebatePhase::Proposal);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn test_explicit_addressing_narrows_not_widens() {
        let topology = DebateTopology::new(
            TopologyKind::Star,
            vec![
                projection("hub", "moderator", 9.0),
                projection("s1", "proposer", 5.0),
                projection("s2", "critic", 5.0),
            ],
        )
        .unwrap();

        // Hub may address a subset of spokes.
        let narrowed = topology
            .route(&msg("hub").to_agents(vec!["s2".into()]))
            .unwrap();
        assert_eq!(narrowed, vec!["s2"]);

        // A spoke cannot force a message to another spoke.
        let err = topology
            .route(&msg("s1").to_agents(vec!["s2".into()]))
            .unwrap_err();
        assert_eq!(err.kind(), "route-failure");
    }

    #[tokio::test]
    async fn test_send_delivers_and_advances_chain_cursor() {
        let topology = DebateTopology::new(
            TopologyKind::Chain,
            vec![
                projection("prop", "proposer", 7.0),
                projection("crit", "critic", 7.0),
            ],
        )
        .unwrap();
        let token = CancellationToken::new();

        assert_eq!(topology.chain_position().unwrap(), 0);
        let recipients = topology.send(msg("prop"), &token).await.unwrap();
        assert_eq!(recipients, vec!["crit"]);
        assert_eq!(topology.chain_position().unwrap(), 1);

        let mut rx = topology.take_receiver("crit").unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.from, "prop");

        let stats = topology.stats();
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.delivered, 1);
    }

    #[tokio::test]
    async fn test_broadcast_on_mesh_reaches_all_peers() {
        let topology = DebateTopology::new(
            TopologyKind::Mesh,
            vec![
                projection("a1", "proposer", 8.0),
                projection("a2", "critic", 7.0),
                projection("a3", "reviewer", 6.0),
            ],
        )
        .unwrap();
        let token = CancellationToken::new();

        let reached = topology.broadcast(msg("a1"), &token).await.unwrap();
        assert_eq!(reached.len(), 2);
        assert_eq!(topology.stats().delivered, 2);
    }

    #[test]
    fn test_reorder_chain_rebuilds_channels() {
        let topology = DebateTopology::new(
            TopologyKind::Chain,
            vec![
                projection("prop", "proposer", 7.0),
                projection("crit", "critic", 7.0),
            ],
        )
        .unwrap();

        topology
            .reorder_chain(vec!["crit".into(), "prop".into()])
            .unwrap();
        assert_eq!(topology.chain_order().unwrap(), vec!["crit", "prop"]);
        assert_eq!(topology.route(&msg("crit")).unwrap(), vec!["prop"]);
        assert_eq!(topology.channels()[0].from, "crit");
    }

    #[test]
    fn test_reorder_rejected_for_mesh() {
        let topology =
            DebateTopology::new(TopologyKind::Mesh, vec![projection("a1", "proposer", 8.0)])
                .unwrap();
        let err = topology.reorder_chain(vec!["a1".into()]).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_duplicate_and_empty_agent_validation() {
        let err = DebateTopology::new(TopologyKind::Mesh, vec![]).unwrap_err();
        assert_eq!(err.kind(), "validation");

        let err = DebateTopology::new(
            TopologyKind::Mesh,
            vec![projection("a1", "proposer", 8.0), projection("a1", "critic", 7.0)],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn test_cancelled_token_rejects_send() {
        let topology = DebateTopology::new(
            TopologyKind::Mesh,
            vec![projection("a1", "proposer", 8.0), projection("a2", "critic", 7.0)],
        )
        .unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = topology.send(msg("a1"), &token).await.unwrap_err();
        assert_eq!(err.kind(), "cancelled");
    }
}
