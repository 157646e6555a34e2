//! Capability model for debate agents.
//!
//! A [`Capability`] records how proficient an agent is at one
//! [`CapabilityType`] and where that knowledge came from. A [`CapabilitySet`]
//! holds at most one capability per type and can aggregate a per-domain
//! score, which feeds composite agent scoring.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CapabilityType, Domain};

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Where a capability entry originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySource {
    /// Declared by an agent template.
    Template,
    /// Baseline added to every agent at creation.
    Default,
    /// Discovered at runtime by a capability discoverer.
    Runtime,
}

/// A single proficiency entry for one capability type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    /// The capability type this entry describes.
    #[serde(rename = "type")]
    pub capability_type: CapabilityType,
    /// Proficiency in [0, 1].
    pub proficiency: f64,
    /// Whether the proficiency has been externally verified.
    pub verified: bool,
    /// Where the entry came from.
    pub source: CapabilitySource,
}

impl Capability {
    /// Create a capability, clamping proficiency to [0, 1].
    pub fn new(capability_type: CapabilityType, proficiency: f64, source: CapabilitySource) -> Self {
        Self {
            capability_type,
            proficiency: proficiency.clamp(0.0, 1.0),
            verified: false,
            source,
        }
    }

    /// Builder: mark the capability as verified.
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    /// The domain this capability contributes to.
    pub fn domain(&self) -> Domain {
        self.capability_type.domain()
    }
}

// ---------------------------------------------------------------------------
// CapabilitySet
// ---------------------------------------------------------------------------

/// Mapping from capability type to capability, at most one entry per type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilitySet {
    entries: HashMap<CapabilityType, Capability>,
}

impl CapabilitySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the capability's type.
    pub fn upsert(&mut self, capability: Capability) {
        self.entries.insert(capability.capability_type, capability);
    }

    /// Look up the entry for a capability type.
    pub fn get(&self, capability_type: CapabilityType) -> Option<&Capability> {
        self.entries.get(&capability_type)
    }

    /// Whether the set contains an entry for the given type.
    pub fn contains(&self, capability_type: CapabilityType) -> bool {
        self.entries.contains_key(&capability_type)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.values()
    }

    /// Aggregate proficiency for a domain: the arithmetic mean of the
    /// proficiencies of member capabilities belonging to that domain, or 0.0
    /// when none are present.
    pub fn domain_score(&self, domain: Domain) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for cap in self.entries.values() {
            if cap.domain() == domain {
                sum += cap.proficiency;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Names of all member capability types, sorted for stable output.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().map(|t| t.to_string()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_clamps_proficiency() {
        let cap = Capability::new(CapabilityType::CodeAnalysis, 1.7, CapabilitySource::Template);
        assert_eq!(cap.proficiency, 1.0);
        let cap = Capability::new(CapabilityType::CodeAnalysis, -0.3, CapabilitySource::Runtime);
        assert_eq!(cap.proficiency, 0.0);
    }

    #[test]
    fn test_upsert_replaces_same_type() {
        let mut set = CapabilitySet::new();
        set.upsert(Capability::new(
            CapabilityType::CodeAnalysis,
            0.5,
            CapabilitySource::Default,
        ));
        set.upsert(
            Capability::new(CapabilityType::CodeAnalysis, 0.9, CapabilitySource::Runtime).verified(),
        );

        assert_eq!(set.len(), 1);
        let cap = set.get(CapabilityType::CodeAnalysis).unwrap();
        assert_eq!(cap.proficiency, 0.9);
        assert!(cap.verified);
        assert_eq!(cap.source, CapabilitySource::Runtime);
    }

    #[test]
    fn test_domain_score_is_mean_of_member_proficiencies() {
        let mut set = CapabilitySet::new();
        set.upsert(Capability::new(
            CapabilityType::CodeAnalysis,
            0.8,
            CapabilitySource::Template,
        ));
        set.upsert(Capability::new(
            CapabilityType::CodeGeneration,
            0.6,
            CapabilitySource::Template,
        ));
        set.upsert(Capability::new(
            CapabilityType::GeneralAssistance,
            0.5,
            CapabilitySource::Default,
        ));

        assert!((set.domain_score(Domain::Code) - 0.7).abs() < 1e-9);
        assert!((set.domain_score(Domain::General) - 0.5).abs() < 1e-9);
        assert_eq!(set.domain_score(Domain::Security), 0.0);
    }

    #[test]
    fn test_type_names_sorted() {
        let mut set = CapabilitySet::new();
        set.upsert(Capability::new(
            CapabilityType::SystemDesign,
            0.7,
            CapabilitySource::Template,
        ));
        set.upsert(Capability::new(
            CapabilityType::ApiDesign,
            0.7,
            CapabilitySource::Template,
        ));
        assert_eq!(set.type_names(), vec!["api_design", "system_design"]);
    }
}
