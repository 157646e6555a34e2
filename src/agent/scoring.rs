//! Composite scoring for agent selection.
//!
//! Selection weighs three signals: the external verifier score (normalized
//! to [0, 1]), the aggregate capability proficiency for the preferred
//! domain, and the agent's affinity for the requested role:
//!
//! `composite = 0.4 * (verifier / 10) + 0.35 * domain_score + 0.25 * affinity`

use serde::{Deserialize, Serialize};

use crate::agent::core::DebateAgent;
use crate::domain::{DebateRole, Domain};

/// Weight of the normalized verifier score in the composite.
pub const VERIFIER_WEIGHT: f64 = 0.4;
/// Weight of the domain capability score in the composite.
pub const DOMAIN_WEIGHT: f64 = 0.35;
/// Weight of the role affinity in the composite.
pub const AFFINITY_WEIGHT: f64 = 0.25;

/// Ephemeral selection score for one agent against a role/domain pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentScore {
    /// The scored agent's id.
    pub agent_id: String,
    /// Verifier score on [0, 10].
    pub verifier_score: f64,
    /// Mean proficiency over the preferred domain's capabilities.
    pub domain_score: f64,
    /// Affinity for the requested role.
    pub role_affinity: f64,
    /// Weighted composite used for ranking.
    pub composite: f64,
}

impl DebateAgent {
    /// Score this agent for a role with a preferred domain.
    pub fn score_for(&self, role: DebateRole, preferred_domain: Domain) -> AgentScore {
        let domain_score = self.capabilities.domain_score(preferred_domain);
        let role_affinity = self.affinity_for_role(role);
        let composite = VERIFIER_WEIGHT * (self.verifier_score / 10.0)
            + DOMAIN_WEIGHT * domain_score
            + AFFINITY_WEIGHT * role_affinity;

        AgentScore {
            agent_id: self.id.clone(),
            verifier_score: self.verifier_score,
            domain_score,
            role_affinity,
            composite,
        }
    }
}
