//! Agent factory.
//!
//! Holds the template registry (readers-writer locked, registration order
//! preserved) and an optional capability discoverer. Produces single agents
//! from templates, domains, or roles, and role-balanced debate teams from a
//! provider list.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::agent::core::{DebateAgent, RoleAffinity, Specialization};
use crate::capability::{Capability, CapabilitySource};
use crate::domain::{DebateRole, Domain};
use crate::error::{DebateError, DebateResult};
use crate::factory::templates::{builtin_templates, AgentTemplate};
use crate::interfaces::CapabilityDiscoverer;

/// Proficiency factor applied to a template's optional capabilities.
const OPTIONAL_CAPABILITY_FACTOR: f64 = 0.7;

/// Fixed role order used when assembling a debate team.
pub const DEBATE_TEAM_ROLE_ORDER: &[DebateRole] = &[
    DebateRole::Proposer,
    DebateRole::Critic,
    DebateRole::Reviewer,
    DebateRole::Optimizer,
    DebateRole::Moderator,
    DebateRole::Architect,
    DebateRole::RedTeam,
    DebateRole::BlueTeam,
    DebateRole::Validator,
];

/// A provider/model pair with its externally computed verifier score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Provider identifier.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Verifier score in [0, 10].
    pub verifier_score: f64,
}

impl ProviderSpec {
    /// Create a provider spec.
    pub fn new(provider: impl Into<String>, model: impl Into<String>, verifier_score: f64) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            verifier_score: verifier_score.clamp(0.0, 10.0),
        }
    }
}

/// Produces debate agents from registered templates.
pub struct AgentFactory {
    /// Registered templates in registration order.
    templates: RwLock<Vec<AgentTemplate>>,
    /// Optional runtime capability discoverer.
    discoverer: Option<Arc<dyn CapabilityDiscoverer>>,
}

impl AgentFactory {
    /// Create a factory pre-loaded with the built-in templates.
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(builtin_templates()),
            discoverer: None,
        }
    }

    /// Builder: attach a capability discoverer.
    pub fn with_discoverer(mut self, discoverer: Arc<dyn CapabilityDiscoverer>) -> Self {
        self.discoverer = Some(discoverer);
        self
    }

    /// Register an additional template. Replaces any template with the same
    /// id, keeping its registry position.
    pub fn register_template(&self, template: AgentTemplate) {
        let mut templates = self.templates.write();
        if let Some(existing) = templates.iter_mut().find(|t| t.id == template.id) {
            *existing = template;
        } else {
            templates.push(template);
        }
    }

    /// Look up a template by id.
    pub fn template(&self, id: &str) -> Option<AgentTemplate> {
        self.templates.read().iter().find(|t| t.id == id).cloned()
    }

    /// Number of registered templates.
    pub fn template_count(&self) -> usize {
        self.templates.read().len()
    }

    // -----------------------------------------------------------------------
    // Creation operations
    // -----------------------------------------------------------------------

    /// Create an agent from the template with the given id.
    pub fn create_from_template(
        &self,
        template_id: &str,
        provider: &str,
        model: &str,
    ) -> DebateResult<DebateAgent> {
        let template = self.template(template_id).ok_or_else(|| DebateError::NotFound {
            entity: "template",
            id: template_id.to_string(),
        })?;
        Ok(self.materialize(&template, provider, model))
    }

    /// Create an agent for a domain: the first registered template whose
    /// domain matches, or a bare "`<domain>` Specialist" when none does.
    pub fn create_for_domain(&self, domain: Domain, provider: &str, model: &str) -> DebateAgent {
        let template = self
            .templates
            .read()
            .iter()
            .find(|t| t.domain == domain)
            .cloned();

        match template {
            Some(template) => self.materialize(&template, provider, model),
            None => DebateAgent::new(format!("{} Specialist", domain), provider, model, domain),
        }
    }

    /// Create an agent for a role: the first registered template listing the
    /// role as preferred, or a bare agent with its primary role overridden.
    pub fn create_for_role(&self, role: DebateRole, provider: &str, model: &str) -> DebateAgent {
        let template = self
            .templates
            .read()
            .iter()
            .find(|t| t.preferred_roles.contains(&role))
            .cloned();

        match template {
            Some(template) => {
                let mut agent = self.materialize(&template, provider, model);
                assign_role(&mut agent, role);
                agent
            }
            None => {
                let mut agent = DebateAgent::new(
                    format!("{} Agent", role),
                    provider,
                    model,
                    Domain::General,
                );
                assign_role(&mut agent, role);
                agent
            }
        }
    }

    /// Create from a template and run capability discovery when a discoverer
    /// is attached. Discovery failure is recorded in the agent's metadata
    /// under `discovery_error` and is not fatal.
    pub async fn create_with_discovery(
        &self,
        template_id: &str,
        provider: &str,
        model: &str,
    ) -> DebateResult<DebateAgent> {
        let mut agent = self.create_from_template(template_id, provider, model)?;

        if let Some(discoverer) = &self.discoverer {
            if let Err(err) = agent.discover_capabilities(discoverer.as_ref()).await {
                log::warn!("capability discovery failed for agent {}: {err}", agent.id);
                agent
                    .metadata
                    .insert("discovery_error".to_string(), json!(err.to_string()));
            }
        }
        Ok(agent)
    }

    /// Create a full debate team from the given providers.
    ///
    /// Providers are sorted by verifier score descending and cycled across
    /// the fixed role order, each role drawing its domain-appropriate
    /// template. Fails with a validation error when the list is empty.
    pub fn create_debate_team(&self, providers: &[ProviderSpec]) -> DebateResult<Vec<DebateAgent>> {
        if providers.is_empty() {
            return Err(DebateError::validation("provider list is empty"));
        }

        let mut ranked: Vec<&ProviderSpec> = providers.iter().collect();
        ranked.sort_by(|a, b| {
            b.verifier_score
                .partial_cmp(&a.verifier_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut team = Vec::with_capacity(DEBATE_TEAM_ROLE_ORDER.len());
        for (i, role) in DEBATE_TEAM_ROLE_ORDER.iter().enumerate() {
            let spec = ranked[i % ranked.len()];
            let domain = team_role_domain(*role);
            let mut agent = self.create_for_domain(domain, &spec.provider, &spec.model);
            agent.set_verifier_score(spec.verifier_score);
            assign_role(&mut agent, *role);
            agent
                .metadata
                .insert("team_role".to_string(), json!(role.to_string()));
            team.push(agent);
        }

        log::info!(
            "created debate team of {} agents from {} provider(s)",
            team.len(),
            providers.len()
        );
        Ok(team)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Materialize a template into a concrete agent.
    fn materialize(&self, template: &AgentTemplate, provider: &str, model: &str) -> DebateAgent {
        let mut agent = DebateAgent::new(template.name.clone(), provider, model, template.domain);

        agent.specialization = Specialization {
            primary: template.domain,
            secondary: template.secondary_domains.clone(),
            expertise: template.expertise,
            focus: template.focus.clone(),
            description: template.description.clone(),
        };

        for cap_type in &template.required_capabilities {
            agent.capabilities.upsert(Capability::new(
                *cap_type,
                template.expertise,
                CapabilitySource::Template,
            ));
        }
        for cap_type in &template.optional_capabilities {
            agent.capabilities.upsert(Capability::new(
                *cap_type,
                OPTIONAL_CAPABILITY_FACTOR * template.expertise,
                CapabilitySource::Template,
            ));
        }

        agent.system_prompt = template.render_system_prompt(&agent.name, provider, model);
        agent
            .metadata
            .insert("template_id".to_string(), json!(template.id));
        agent.recompute_role_affinities();
        agent
    }
}

impl Default for AgentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFactory")
            .field("templates", &self.templates.read().len())
            .field("has_discoverer", &self.discoverer.is_some())
            .finish()
    }
}

/// Domain whose template backs each debate-team role.
fn team_role_domain(role: DebateRole) -> Domain {
    match role {
        DebateRole::Proposer | DebateRole::Reviewer | DebateRole::Test => Domain::Code,
        DebateRole::Critic | DebateRole::Teacher => Domain::Reasoning,
        DebateRole::Optimizer => Domain::Optimization,
        DebateRole::Moderator => Domain::General,
        DebateRole::Architect => Domain::Architecture,
        DebateRole::RedTeam | DebateRole::BlueTeam | DebateRole::Security => Domain::Security,
        DebateRole::Validator => Domain::Debug,
    }
}

/// Force an agent's primary role, keeping the affinity list sorted so the
/// primary-role invariant (primary == first affinity entry) holds.
fn assign_role(agent: &mut DebateAgent, role: DebateRole) {
    let expertise = agent.specialization.expertise;
    let top = agent
        .role_affinities
        .first()
        .map(|a| a.affinity)
        .unwrap_or(0.0);
    let affinity = expertise.max(top).clamp(0.0, 1.0);

    agent.role_affinities.retain(|a| a.role != role);
    agent.role_affinities.insert(
        0,
        RoleAffinity {
            role,
            affinity,
            rationale: "requested role assignment".to_string(),
        },
    );
    agent.primary_role = role;
}
