//! Agent pool.
//!
//! Owns the live agents for a debate's lifetime, indexed by primary role and
//! primary domain. The secondary indices are kept in sync on every add,
//! remove, and in-place update. Readers get value copies, so nothing handed
//! out can mutate the pool's internal state; mutation happens through the
//! pool's own methods under its writer lock.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::agent::core::DebateAgent;
use crate::agent::scoring::AgentScore;
use crate::domain::{DebateRole, Domain};
use crate::error::{DebateError, DebateResult};
use crate::interfaces::TopologyAgent;

#[derive(Default)]
struct PoolInner {
    agents: HashMap<String, DebateAgent>,
    by_role: HashMap<DebateRole, Vec<String>>,
    by_domain: HashMap<Domain, Vec<String>>,
}

impl PoolInner {
    fn index(&mut self, agent: &DebateAgent) {
        self.by_role
            .entry(agent.primary_role)
            .or_default()
            .push(agent.id.clone());
        self.by_domain
            .entry(agent.specialization.primary)
            .or_default()
            .push(agent.id.clone());
    }

    fn unindex(&mut self, agent: &DebateAgent) {
        if let Some(ids) = self.by_role.get_mut(&agent.primary_role) {
            ids.retain(|id| *id != agent.id);
            if ids.is_empty() {
                self.by_role.remove(&agent.primary_role);
            }
        }
        if let Some(ids) = self.by_domain.get_mut(&agent.specialization.primary) {
            ids.retain(|id| *id != agent.id);
            if ids.is_empty() {
                self.by_domain.remove(&agent.specialization.primary);
            }
        }
    }
}

/// Thread-safe pool of live debate agents.
#[derive(Default)]
pub struct AgentPool {
    inner: RwLock<PoolInner>,
}

impl AgentPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent, replacing any prior entry with the same id.
    pub fn add(&self, agent: DebateAgent) -> DebateResult<()> {
        if agent.id.is_empty() {
            return Err(DebateError::validation("agent id is empty"));
        }

        let mut inner = self.inner.write();
        if let Some(previous) = inner.agents.remove(&agent.id) {
            inner.unindex(&previous);
        }
        inner.index(&agent);
        inner.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    /// Copy out an agent by id.
    pub fn get(&self, id: &str) -> Option<DebateAgent> {
        self.inner.read().agents.get(id).cloned()
    }

    /// Remove an agent, returning it when present.
    pub fn remove(&self, id: &str) -> Option<DebateAgent> {
        let mut inner = self.inner.write();
        let agent = inner.agents.remove(id)?;
        inner.unindex(&agent);
        Some(agent)
    }

    /// Apply a mutation to an agent in place, under the pool's writer lock.
    ///
    /// The secondary indices are re-synced afterwards, so mutations that
    /// change the primary role or domain stay coherent.
    pub fn update<F>(&self, id: &str, mutate: F) -> DebateResult<()>
    where
        F: FnOnce(&mut DebateAgent),
    {
        let mut inner = self.inner.write();
        let mut agent = inner.agents.remove(id).ok_or_else(|| DebateError::NotFound {
            entity: "agent",
            id: id.to_string(),
        })?;
        inner.unindex(&agent);
        mutate(&mut agent);
        inner.index(&agent);
        inner.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    /// Copy out all agents whose primary role matches.
    pub fn get_by_role(&self, role: DebateRole) -> Vec<DebateAgent> {
        let inner = self.inner.read();
        inner
            .by_role
            .get(&role)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.agents.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copy out all agents whose primary domain matches.
    pub fn get_by_domain(&self, domain: Domain) -> Vec<DebateAgent> {
        let inner = self.inner.read();
        inner
            .by_domain
            .get(&domain)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.agents.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copy out every agent in the pool.
    pub fn get_all(&self) -> Vec<DebateAgent> {
        self.inner.read().agents.values().cloned().collect()
    }

    /// Number of agents in the pool.
    pub fn size(&self) -> usize {
        self.inner.read().agents.len()
    }

    /// Whether the pool holds no agents.
    pub fn is_empty(&self) -> bool {
        self.inner.read().agents.is_empty()
    }

    /// Render every agent into its transport projection.
    pub fn to_topology_agents(&self) -> Vec<TopologyAgent> {
        self.inner
            .read()
            .agents
            .values()
            .map(|a| a.to_topology_agent())
            .collect()
    }

    /// The single best agent for a role by composite score.
    pub fn select_best_for_role(
        &self,
        role: DebateRole,
        preferred_domain: Domain,
    ) -> Option<(DebateAgent, AgentScore)> {
        self.select_top_n_for_role(role, preferred_domain, 1)
            .into_iter()
            .next()
    }

    /// The top `n` agents for a role by composite score, best first.
    ///
    /// Ties in composite resolve by agent id so selection is deterministic.
    pub fn select_top_n_for_role(
        &self,
        role: DebateRole,
        preferred_domain: Domain,
        n: usize,
    ) -> Vec<(DebateAgent, AgentScore)> {
        let mut scored: Vec<(DebateAgent, AgentScore)> = self
            .inner
            .read()
            .agents
            .values()
            .map(|a| (a.clone(), a.score_for(role, preferred_domain)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.composite
                .partial_cmp(&a.1.composite)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        scored.truncate(n);
        scored
    }
}

impl std::fmt::Debug for AgentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("AgentPool")
            .field("agents", &inner.agents.len())
            .field("roles", &inner.by_role.len())
            .field("domains", &inner.by_domain.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str, domain: Domain, score: f64) -> DebateAgent {
        DebateAgent::new(name, "openai", "gpt-4o", domain).with_verifier_score(score)
    }

    #[test]
    fn test_add_get_remove() {
        let pool = AgentPool::new();
        let a = agent("A", Domain::Code, 8.0);
        let id = a.id.clone();

        pool.add(a).unwrap();
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.get(&id).unwrap().name, "A");

        let removed = pool.remove(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(pool.is_empty());
        assert!(pool.get(&id).is_none());
    }

    #[test]
    fn test_add_rejects_empty_id() {
        let pool = AgentPool::new();
        let mut a = agent("A", Domain::Code, 8.0);
        a.id.clear();
        assert_eq!(pool.add(a).unwrap_err().kind(), "validation");
    }

    #[test]
    fn test_index_coherence_after_add_remove() {
        let pool = AgentPool::new();
        let a = agent("A", Domain::Code, 8.0);
        let b = agent("B", Domain::Security, 7.0);
        let a_id = a.id.clone();

        pool.add(a).unwrap();
        pool.add(b).unwrap();

        for agent in pool.get_all() {
            let by_role = pool.get_by_role(agent.primary_role);
            assert_eq!(by_role.iter().filter(|x| x.id == agent.id).count(), 1);
            let by_domain = pool.get_by_domain(agent.specialization.primary);
            assert_eq!(by_domain.iter().filter(|x| x.id == agent.id).count(), 1);
        }

        pool.remove(&a_id);
        assert!(pool.get_by_role(DebateRole::Proposer).is_empty());
        assert!(pool.get_by_domain(Domain::Code).is_empty());
    }

    #[test]
    fn test_re_add_same_id_does_not_duplicate_indices() {
        let pool = AgentPool::new();
        let a = agent("A", Domain::Code, 8.0);
        let id = a.id.clone();

        pool.add(a.clone()).unwrap();
        pool.add(a).unwrap();

        assert_eq!(pool.size(), 1);
        assert_eq!(
            pool.get_by_role(DebateRole::Proposer)
                .iter()
                .filter(|x| x.id == id)
                .count(),
            1
        );
    }

    #[test]
    fn test_update_resyncs_indices_on_domain_change() {
        let pool = AgentPool::new();
        let a = agent("A", Domain::Code, 8.0);
        let id = a.id.clone();
        pool.add(a).unwrap();

        pool.update(&id, |agent| {
            agent.specialization = crate::agent::Specialization::for_domain(Domain::Security, 0.9);
            agent.recompute_role_affinities();
        })
        .unwrap();

        assert!(pool.get_by_domain(Domain::Code).is_empty());
        assert_eq!(pool.get_by_domain(Domain::Security).len(), 1);
        assert_eq!(pool.get_by_role(DebateRole::RedTeam).len(), 1);
    }

    #[test]
    fn test_update_missing_agent() {
        let pool = AgentPool::new();
        let err = pool.update("nope", |_| {}).unwrap_err();
        assert_eq!(err.kind(), "not-found");
    }

    #[test]
    fn test_readers_get_copies() {
        let pool = AgentPool::new();
        let a = agent("A", Domain::Code, 8.0);
        let id = a.id.clone();
        pool.add(a).unwrap();

        let mut copy = pool.get(&id).unwrap();
        copy.name = "mutated".into();
        assert_eq!(pool.get(&id).unwrap().name, "A");
    }

    #[test]
    fn test_select_best_for_role_is_argmax_composite() {
        let pool = AgentPool::new();
        let strong = agent("Strong", Domain::Security, 9.5);
        let weak = agent("Weak", Domain::Security, 3.0);
        let strong_id = strong.id.clone();
        pool.add(strong).unwrap();
        pool.add(weak).unwrap();
        pool.add(agent("Other", Domain::Code, 9.0)).unwrap();

        let (best, score) = pool
            .select_best_for_role(DebateRole::RedTeam, Domain::Security)
            .unwrap();
        assert_eq!(best.id, strong_id);
        assert!(score.composite > 0.0);
    }

    #[test]
    fn test_select_top_n_sorted_descending() {
        let pool = AgentPool::new();
        for (name, score) in [("A", 9.0), ("B", 5.0), ("C", 7.0)] {
            pool.add(agent(name, Domain::Code, score)).unwrap();
        }

        let top = pool.select_top_n_for_role(DebateRole::Proposer, Domain::Code, 2);
        assert_eq!(top.len(), 2);
        assert!(top[0].1.composite >= top[1].1.composite);
        assert_eq!(top[0].0.name, "A");
        assert_eq!(top[1].0.name, "C");
    }

    #[test]
    fn test_to_topology_agents_projects_everyone() {
        let pool = AgentPool::new();
        pool.add(agent("A", Domain::Code, 8.0)).unwrap();
        pool.add(agent("B", Domain::Debug, 6.0)).unwrap();

        let projected = pool.to_topology_agents();
        assert_eq!(projected.len(), 2);
        assert!(projected.iter().all(|p| !p.capabilities.is_empty()));
    }
}
