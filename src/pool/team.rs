//! Team assembly from a pool.
//!
//! The team builder is a synchronous pure function of the pool snapshot and
//! a [`TeamConfig`]: for each required role, in order, it takes the top
//! candidates by composite score and assigns up to the configured minimum,
//! marking the first as primary. With role sharing disabled an agent can
//! hold at most one seat.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::agent::core::DebateAgent;
use crate::agent::scoring::AgentScore;
use crate::domain::{DebateRole, Domain};
use crate::error::{DebateError, DebateResult};
use crate::pool::pool::AgentPool;

/// Extra candidates fetched beyond the per-role minimum, so skips caused by
/// no-sharing still leave enough to choose from.
const CANDIDATE_HEADROOM: usize = 2;

/// Requested shape of a debate team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Roles the team must fill, in assignment order.
    pub required_roles: Vec<DebateRole>,
    /// Preferred capability domain per role.
    #[serde(default)]
    pub preferred_domains: HashMap<DebateRole, Domain>,
    /// Minimum number of agents per role.
    pub min_agents_per_role: usize,
    /// Whether one agent may hold seats for several roles.
    pub allow_role_sharing: bool,
}

impl TeamConfig {
    /// Config with one agent per role and no sharing.
    pub fn new(required_roles: Vec<DebateRole>) -> Self {
        Self {
            required_roles,
            preferred_domains: HashMap::new(),
            min_agents_per_role: 1,
            allow_role_sharing: false,
        }
    }

    /// Builder: set a preferred domain for a role.
    pub fn with_preferred_domain(mut self, role: DebateRole, domain: Domain) -> Self {
        self.preferred_domains.insert(role, domain);
        self
    }

    /// Builder: set the per-role minimum.
    pub fn with_min_agents_per_role(mut self, min: usize) -> Self {
        self.min_agents_per_role = min.max(1);
        self
    }

    /// Builder: allow agents to hold multiple seats.
    pub fn with_role_sharing(mut self) -> Self {
        self.allow_role_sharing = true;
        self
    }
}

/// One seat in an assembled team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAssignment {
    /// Copy of the assigned agent.
    pub agent: DebateAgent,
    /// The role the seat fills.
    pub role: DebateRole,
    /// The selection score that won the seat.
    pub score: AgentScore,
    /// Whether this is the role's primary seat.
    pub is_primary: bool,
}

/// Assembles teams from an [`AgentPool`].
#[derive(Debug, Default)]
pub struct TeamBuilder;

impl TeamBuilder {
    /// Create a team builder.
    pub fn new() -> Self {
        Self
    }

    /// Build a team satisfying the config from the pool's current agents.
    ///
    /// Fails with a `no-suitable-candidate` error naming the first role for
    /// which no assignable candidate remains.
    pub fn build(&self, pool: &AgentPool, config: &TeamConfig) -> DebateResult<Vec<TeamAssignment>> {
        if config.required_roles.is_empty() {
            return Err(DebateError::validation("required role list is empty"));
        }

        let mut assignments = Vec::new();
        let mut taken: HashSet<String> = HashSet::new();

        for role in &config.required_roles {
            let domain = config
                .preferred_domains
                .get(role)
                .copied()
                .unwrap_or(Domain::General);

            let candidates = pool.select_top_n_for_role(
                *role,
                domain,
                config.min_agents_per_role + CANDIDATE_HEADROOM,
            );

            let mut seated = 0usize;
            for (agent, score) in candidates {
                if seated >= config.min_agents_per_role {
                    break;
                }
                if !config.allow_role_sharing && taken.contains(&agent.id) {
                    continue;
                }

                taken.insert(agent.id.clone());
                assignments.push(TeamAssignment {
                    agent,
                    role: *role,
                    score,
                    is_primary: seated == 0,
                });
                seated += 1;
            }

            if seated == 0 {
                return Err(DebateError::NoSuitableCandidate { role: *role });
            }
            log::debug!("seated {seated} agent(s) for role {role}");
        }

        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::core::DebateAgent;

    fn seeded_pool() -> AgentPool {
        let pool = AgentPool::new();
        for (name, domain, score) in [
            ("Coder", Domain::Code, 9.0),
            ("Auditor", Domain::Security, 8.5),
            ("Architect", Domain::Architecture, 8.0),
            ("Detective", Domain::Debug, 7.5),
            ("Tuner", Domain::Optimization, 7.0),
            ("Strategist", Domain::Reasoning, 8.8),
        ] {
            pool.add(
                DebateAgent::new(name, "openai", "gpt-4o", domain).with_verifier_score(score),
            )
            .unwrap();
        }
        pool
    }

    #[test]
    fn test_build_fills_every_required_role() {
        let pool = seeded_pool();
        let config = TeamConfig::new(vec![
            DebateRole::Proposer,
            DebateRole::RedTeam,
            DebateRole::Moderator,
        ])
        .with_preferred_domain(DebateRole::Proposer, Domain::Code)
        .with_preferred_domain(DebateRole::RedTeam, Domain::Security)
        .with_preferred_domain(DebateRole::Moderator, Domain::Reasoning);

        let team = TeamBuilder::new().build(&pool, &config).unwrap();
        assert_eq!(team.len(), 3);

        for role in &config.required_roles {
            let seats: Vec<_> = team.iter().filter(|a| a.role == *role).collect();
            assert_eq!(seats.len(), 1);
            assert!(seats[0].is_primary);
        }
    }

    #[test]
    fn test_no_sharing_yields_unique_agents() {
        let pool = seeded_pool();
        let config = TeamConfig::new(vec![
            DebateRole::Proposer,
            DebateRole::Reviewer,
            DebateRole::Critic,
            DebateRole::Validator,
        ]);

        let team = TeamBuilder::new().build(&pool, &config).unwrap();
        let mut seen = HashSet::new();
        for seat in &team {
            assert!(seen.insert(seat.agent.id.clone()), "agent seated twice");
        }
    }

    #[test]
    fn test_sharing_allows_reuse() {
        let pool = AgentPool::new();
        pool.add(
            DebateAgent::new("Solo", "openai", "gpt-4o", Domain::Code).with_verifier_score(9.0),
        )
        .unwrap();

        let config = TeamConfig::new(vec![DebateRole::Proposer, DebateRole::Reviewer])
            .with_role_sharing();
        let team = TeamBuilder::new().build(&pool, &config).unwrap();

        assert_eq!(team.len(), 2);
        assert_eq!(team[0].agent.id, team[1].agent.id);
    }

    #[test]
    fn test_exhausted_pool_fails_with_role() {
        let pool = AgentPool::new();
        pool.add(
            DebateAgent::new("Solo", "openai", "gpt-4o", Domain::Code).with_verifier_score(9.0),
        )
        .unwrap();

        let config = TeamConfig::new(vec![DebateRole::Proposer, DebateRole::Reviewer]);
        let err = TeamBuilder::new().build(&pool, &config).unwrap_err();

        assert_eq!(err.kind(), "no-suitable-candidate");
        assert!(err.to_string().contains("reviewer"));
    }

    #[test]
    fn test_min_agents_per_role_seats_multiple() {
        let pool = AgentPool::new();
        for i in 0..4 {
            pool.add(
                DebateAgent::new(format!("C{i}"), "openai", "gpt-4o", Domain::Code)
                    .with_verifier_score(9.0 - i as f64),
            )
            .unwrap();
        }

        let config = TeamConfig::new(vec![DebateRole::Proposer])
            .with_preferred_domain(DebateRole::Proposer, Domain::Code)
            .with_min_agents_per_role(3);
        let team = TeamBuilder::new().build(&pool, &config).unwrap();

        assert_eq!(team.len(), 3);
        assert!(team[0].is_primary);
        assert!(!team[1].is_primary);
        assert!(!team[2].is_primary);
        // Seats are filled best-first.
        assert!(team[0].score.composite >= team[1].score.composite);
    }

    #[test]
    fn test_empty_role_list_rejected() {
        let pool = seeded_pool();
        let err = TeamBuilder::new()
            .build(&pool, &TeamConfig::new(vec![]))
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}
