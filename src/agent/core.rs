//! Core debate agent.
//!
//! A [`DebateAgent`] is a specialized participant bound to one
//! provider/model pair. It carries a capability set, a specialization, and a
//! role-affinity list sorted descending; the first affinity entry is the
//! agent's primary role. Mutation goes through `&mut self` methods so a
//! [`SharedAgent`] handle serializes writers while readers clone snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::capability::{Capability, CapabilitySet, CapabilitySource};
use crate::domain::{DebateRole, Domain, DEFAULT_ROLE_AFFINITY};
use crate::error::{DebateError, DebateResult};
use crate::interfaces::{CapabilityDiscoverer, TopologyAgent};

/// Expertise level assigned to bare agents created without a template.
pub const DEFAULT_EXPERTISE: f64 = 0.8;

/// Proficiency of the general-assistance baseline every agent receives.
const BASELINE_PROFICIENCY: f64 = 0.5;

// ---------------------------------------------------------------------------
// Specialization
// ---------------------------------------------------------------------------

/// An agent's subject-matter specialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialization {
    /// Primary domain.
    pub primary: Domain,
    /// Secondary domains, in priority order.
    #[serde(default)]
    pub secondary: Vec<Domain>,
    /// Expertise level in [0, 1].
    pub expertise: f64,
    /// Short focus statement.
    pub focus: String,
    /// Longer description of the specialization.
    pub description: String,
}

impl Specialization {
    /// Create a specialization for a single domain.
    pub fn for_domain(domain: Domain, expertise: f64) -> Self {
        Self {
            primary: domain,
            secondary: Vec::new(),
            expertise: expertise.clamp(0.0, 1.0),
            focus: format!("{} analysis", domain),
            description: format!("Specialist in the {} domain", domain),
        }
    }
}

// ---------------------------------------------------------------------------
// RoleAffinity
// ---------------------------------------------------------------------------

/// How well an agent's domain and expertise match a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAffinity {
    /// The role scored.
    pub role: DebateRole,
    /// Affinity in [0, 1].
    pub affinity: f64,
    /// Why the affinity has this value.
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// DebateAgent
// ---------------------------------------------------------------------------

/// A specialized debate participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateAgent {
    /// Unique agent identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Agent record version.
    pub version: String,
    /// Provider identifier (e.g. "openai", "ollama").
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// External quality score for the provider/model pair, in [0, 10].
    pub verifier_score: f64,
    /// Subject-matter specialization.
    pub specialization: Specialization,
    /// Capability set.
    pub capabilities: CapabilitySet,
    /// Role affinities, sorted by affinity descending.
    pub role_affinities: Vec<RoleAffinity>,
    /// The highest-affinity role.
    pub primary_role: DebateRole,
    /// System prompt the agent debates with.
    pub system_prompt: String,
    /// Opaque pass-through metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub last_active: DateTime<Utc>,
}

/// Shared handle to an agent. Writers take the lock for the duration of a
/// mutation; readers clone a snapshot so affinity/primary-role updates are
/// observed atomically.
pub type SharedAgent = Arc<RwLock<DebateAgent>>;

impl DebateAgent {
    /// Create an agent specialized in `domain`.
    ///
    /// Populates default capabilities from the domain's capability list at
    /// proficiency = expertise, adds the general-assistance baseline at 0.5,
    /// and computes role affinities from the domain's base table.
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        domain: Domain,
    ) -> Self {
        let specialization = Specialization::for_domain(domain, DEFAULT_EXPERTISE);
        let now = Utc::now();
        let mut agent = Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            version: "1.0.0".to_string(),
            provider: provider.into(),
            model: model.into(),
            verifier_score: 0.0,
            specialization,
            capabilities: CapabilitySet::new(),
            role_affinities: Vec::new(),
            primary_role: DebateRole::Proposer,
            system_prompt: String::new(),
            metadata: HashMap::new(),
            created_at: now,
            last_active: now,
        };

        for cap_type in domain.capability_types() {
            agent.capabilities.upsert(Capability::new(
                *cap_type,
                agent.specialization.expertise,
                CapabilitySource::Default,
            ));
        }
        agent.capabilities.upsert(Capability::new(
            crate::domain::CapabilityType::GeneralAssistance,
            BASELINE_PROFICIENCY,
            CapabilitySource::Default,
        ));

        agent.recompute_role_affinities();
        agent
    }

    /// Builder: set the verifier score (clamped to [0, 10]).
    pub fn with_verifier_score(mut self, score: f64) -> Self {
        self.verifier_score = score.clamp(0.0, 10.0);
        self
    }

    /// Recompute role affinities from the primary domain's base table and the
    /// current expertise level, then reassign the primary role.
    ///
    /// The affinity list and primary role are updated together; callers
    /// holding a [`SharedAgent`] observe both or neither.
    pub fn recompute_role_affinities(&mut self) {
        let domain = self.specialization.primary;
        let expertise = self.specialization.expertise;

        let mut affinities: Vec<RoleAffinity> = domain
            .base_affinities()
            .iter()
            .map(|(role, base)| RoleAffinity {
                role: *role,
                affinity: (base * expertise).clamp(0.0, 1.0),
                rationale: format!(
                    "{} base {:.2} scaled by expertise {:.2}",
                    domain, base, expertise
                ),
            })
            .collect();

        affinities.sort_by(|a, b| {
            b.affinity
                .partial_cmp(&a.affinity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if let Some(first) = affinities.first() {
            self.primary_role = first.role;
        }
        self.role_affinities = affinities;
    }

    /// Affinity for a role; 0.3 for roles the agent has no entry for.
    pub fn affinity_for_role(&self, role: DebateRole) -> f64 {
        self.role_affinities
            .iter()
            .find(|a| a.role == role)
            .map(|a| a.affinity)
            .unwrap_or(DEFAULT_ROLE_AFFINITY)
    }

    /// Roles whose affinity strictly exceeds the threshold, best first.
    pub fn roles_above_threshold(&self, threshold: f64) -> Vec<DebateRole> {
        self.role_affinities
            .iter()
            .filter(|a| a.affinity > threshold)
            .map(|a| a.role)
            .collect()
    }

    /// Add or replace a capability and refresh the activity timestamp.
    pub fn add_capability(&mut self, capability: Capability) {
        self.capabilities.upsert(capability);
        self.touch();
    }

    /// Invoke the discoverer and merge returned capabilities with
    /// source = runtime, verified = true, then recompute role affinities.
    pub async fn discover_capabilities(
        &mut self,
        discoverer: &dyn CapabilityDiscoverer,
    ) -> DebateResult<usize> {
        let found = discoverer
            .discover(&self.provider, &self.model)
            .await
            .map_err(|e| DebateError::Upstream {
                message: format!("capability discovery: {e}"),
            })?;

        let count = found.len();
        for cap in found {
            self.capabilities.upsert(Capability {
                source: CapabilitySource::Runtime,
                verified: true,
                ..cap
            });
        }
        self.recompute_role_affinities();
        self.touch();
        log::debug!("agent {} merged {} discovered capabilities", self.id, count);
        Ok(count)
    }

    /// Set the verifier score, clamped to [0, 10].
    pub fn set_verifier_score(&mut self, score: f64) {
        self.verifier_score = score.clamp(0.0, 10.0);
        self.touch();
    }

    /// Replace the system prompt.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
        self.touch();
    }

    /// Refresh the last-active timestamp.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Render into the plain transport record used by topologies and
    /// out-of-scope orchestrators.
    pub fn to_topology_agent(&self) -> TopologyAgent {
        TopologyAgent {
            id: self.id.clone(),
            role: self.primary_role.to_string(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            score: self.verifier_score,
            confidence: self.specialization.expertise,
            specialization: self.specialization.primary.to_string(),
            capabilities: self.capabilities.type_names(),
            metadata: self.metadata.clone(),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_shared(self) -> SharedAgent {
        Arc::new(RwLock::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CapabilityType;

    #[test]
    fn test_new_agent_has_domain_capabilities_and_baseline() {
        let agent = DebateAgent::new("Coder", "openai", "gpt-4o", Domain::Code);

        for cap_type in Domain::Code.capability_types() {
            let cap = agent.capabilities.get(*cap_type).unwrap();
            assert_eq!(cap.proficiency, DEFAULT_EXPERTISE);
            assert_eq!(cap.source, CapabilitySource::Default);
        }
        let baseline = agent.capabilities.get(CapabilityType::GeneralAssistance).unwrap();
        assert_eq!(baseline.proficiency, 0.5);
    }

    #[test]
    fn test_affinities_sorted_and_primary_role_is_first() {
        let agent = DebateAgent::new("Coder", "openai", "gpt-4o", Domain::Code);

        assert!(!agent.role_affinities.is_empty());
        for pair in agent.role_affinities.windows(2) {
            assert!(pair[0].affinity >= pair[1].affinity);
        }
        assert_eq!(agent.primary_role, agent.role_affinities[0].role);
        // Code's top base affinity is proposer.
        assert_eq!(agent.primary_role, DebateRole::Proposer);
    }

    #[test]
    fn test_affinity_values_scale_with_expertise() {
        let agent = DebateAgent::new("Sec", "ollama", "llama3", Domain::Security);
        let red = agent.affinity_for_role(DebateRole::RedTeam);
        assert!((red - 0.95 * DEFAULT_EXPERTISE).abs() < 1e-9);
    }

    #[test]
    fn test_affinity_defaults_for_unknown_role() {
        let agent = DebateAgent::new("Opt", "openai", "gpt-4o", Domain::Optimization);
        assert_eq!(agent.affinity_for_role(DebateRole::Teacher), 0.3);
    }

    #[test]
    fn test_roles_above_threshold() {
        let agent = DebateAgent::new("Sec", "openai", "gpt-4o", Domain::Security);
        let roles = agent.roles_above_threshold(0.7);
        assert!(roles.contains(&DebateRole::RedTeam));
        assert!(!roles.contains(&DebateRole::Validator)); // 0.65 * 0.8 = 0.52
        // Returned best-first.
        assert_eq!(roles[0], agent.primary_role);
    }

    #[test]
    fn test_proficiencies_in_range() {
        let agent = DebateAgent::new("Gen", "hf", "mistral", Domain::General);
        for cap in agent.capabilities.iter() {
            assert!((0.0..=1.0).contains(&cap.proficiency));
        }
    }

    #[test]
    fn test_verifier_score_clamped() {
        let mut agent = DebateAgent::new("A", "p", "m", Domain::Code).with_verifier_score(12.0);
        assert_eq!(agent.verifier_score, 10.0);
        agent.set_verifier_score(-1.0);
        assert_eq!(agent.verifier_score, 0.0);
    }

    #[test]
    fn test_topology_projection() {
        let agent =
            DebateAgent::new("Arch", "openai", "gpt-4o", Domain::Architecture).with_verifier_score(8.5);
        let proj = agent.to_topology_agent();

        assert_eq!(proj.id, agent.id);
        assert_eq!(proj.role, "architect");
        assert_eq!(proj.score, 8.5);
        assert_eq!(proj.specialization, "architecture");
        assert!(proj.capabilities.contains(&"system_design".to_string()));
    }

    #[tokio::test]
    async fn test_discover_capabilities_merges_as_runtime_verified() {
        struct FixedDiscoverer;

        #[async_trait::async_trait]
        impl CapabilityDiscoverer for FixedDiscoverer {
            async fn discover(&self, _provider: &str, _model: &str) -> anyhow::Result<Vec<Capability>> {
                Ok(vec![Capability::new(
                    CapabilityType::LogicalReasoning,
                    0.92,
                    CapabilitySource::Template,
                )])
            }
        }

        let mut agent = DebateAgent::new("R", "openai", "gpt-4o", Domain::Code);
        let merged = agent.discover_capabilities(&FixedDiscoverer).await.unwrap();
        assert_eq!(merged, 1);

        let cap = agent.capabilities.get(CapabilityType::LogicalReasoning).unwrap();
        assert_eq!(cap.source, CapabilitySource::Runtime);
        assert!(cap.verified);
        assert!((cap.proficiency - 0.92).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_discover_capabilities_surfaces_upstream_error() {
        struct FailingDiscoverer;

        #[async_trait::async_trait]
        impl CapabilityDiscoverer for FailingDiscoverer {
            async fn discover(&self, _provider: &str, _model: &str) -> anyhow::Result<Vec<Capability>> {
                anyhow::bail!("probe refused")
            }
        }

        let mut agent = DebateAgent::new("R", "openai", "gpt-4o", Domain::Code);
        let err = agent.discover_capabilities(&FailingDiscoverer).await.unwrap_err();
        assert_eq!(err.kind(), "upstream-failure");
    }
}
