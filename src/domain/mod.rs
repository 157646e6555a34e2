//! Domain and capability taxonomy for debate agents.
//!
//! Closed enumerations for subject-matter domains, the capability types each
//! domain implies, the debate roles agents can occupy, and the phases a
//! debate moves through. The static tables here — domain → capability types,
//! domain → base role affinities, chain role precedence, phase → preferred
//! leader roles — are the ground truth the agent, factory, topology, and
//! team-builder layers all derive from.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// Subject-matter area an agent is specialized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Software implementation and review.
    Code,
    /// Vulnerability analysis and hardening.
    Security,
    /// System and API design.
    Architecture,
    /// Fault isolation and diagnosis.
    Debug,
    /// Performance and resource tuning.
    Optimization,
    /// Logical and strategic reasoning.
    Reasoning,
    /// No specific domain.
    General,
}

impl Domain {
    /// All domains, in declaration order.
    pub fn all() -> &'static [Domain] {
        &[
            Domain::Code,
            Domain::Security,
            Domain::Architecture,
            Domain::Debug,
            Domain::Optimization,
            Domain::Reasoning,
            Domain::General,
        ]
    }

    /// The fixed set of capability types expected of this domain.
    pub fn capability_types(&self) -> &'static [CapabilityType] {
        match self {
            Domain::Code => &[
                CapabilityType::CodeAnalysis,
                CapabilityType::CodeGeneration,
                CapabilityType::Refactoring,
            ],
            Domain::Security => &[
                CapabilityType::VulnerabilityDetection,
                CapabilityType::ThreatModeling,
                CapabilityType::SecurityAudit,
            ],
            Domain::Architecture => &[
                CapabilityType::SystemDesign,
                CapabilityType::ApiDesign,
                CapabilityType::ScalabilityPlanning,
            ],
            Domain::Debug => &[
                CapabilityType::ErrorDiagnosis,
                CapabilityType::RootCauseAnalysis,
                CapabilityType::LogAnalysis,
            ],
            Domain::Optimization => &[
                CapabilityType::PerformanceAnalysis,
                CapabilityType::MemoryOptimization,
                CapabilityType::ConcurrencyTuning,
            ],
            Domain::Reasoning => &[
                CapabilityType::LogicalReasoning,
                CapabilityType::MathematicalReasoning,
                CapabilityType::StrategicPlanning,
            ],
            Domain::General => &[CapabilityType::GeneralAssistance],
        }
    }

    /// Base role-affinity table for this domain.
    ///
    /// An agent's affinity for a role is the base value here multiplied by
    /// its expertise level; roles absent from the table default to
    /// [`DEFAULT_ROLE_AFFINITY`].
    pub fn base_affinities(&self) -> &'static [(DebateRole, f64)] {
        match self {
            Domain::Code => &[
                (DebateRole::Proposer, 0.9),
                (DebateRole::Reviewer, 0.85),
                (DebateRole::Critic, 0.7),
                (DebateRole::Optimizer, 0.65),
                (DebateRole::Validator, 0.6),
                (DebateRole::Test, 0.6),
            ],
            Domain::Security => &[
                (DebateRole::RedTeam, 0.95),
                (DebateRole::Security, 0.95),
                (DebateRole::BlueTeam, 0.9),
                (DebateRole::Critic, 0.8),
                (DebateRole::Reviewer, 0.7),
                (DebateRole::Validator, 0.65),
            ],
            Domain::Architecture => &[
                (DebateRole::Architect, 0.95),
                (DebateRole::Proposer, 0.8),
                (DebateRole::Reviewer, 0.7),
                (DebateRole::Moderator, 0.6),
                (DebateRole::Critic, 0.6),
            ],
            Domain::Debug => &[
                (DebateRole::Critic, 0.85),
                (DebateRole::Reviewer, 0.8),
                (DebateRole::Validator, 0.75),
                (DebateRole::Test, 0.7),
                (DebateRole::Optimizer, 0.6),
            ],
            Domain::Optimization => &[
                (DebateRole::Optimizer, 0.95),
                (DebateRole::Reviewer, 0.7),
                (DebateRole::Critic, 0.65),
                (DebateRole::Validator, 0.6),
            ],
            Domain::Reasoning => &[
                (DebateRole::Moderator, 0.85),
                (DebateRole::Validator, 0.8),
                (DebateRole::Critic, 0.75),
                (DebateRole::Teacher, 0.7),
                (DebateRole::Proposer, 0.65),
            ],
            Domain::General => &[
                (DebateRole::Moderator, 0.7),
                (DebateRole::Proposer, 0.6),
                (DebateRole::Reviewer, 0.6),
                (DebateRole::Teacher, 0.55),
                (DebateRole::Validator, 0.5),
            ],
        }
    }

    /// Base affinity of this domain for a single role.
    pub fn base_affinity(&self, role: DebateRole) -> f64 {
        self.base_affinities()
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, a)| *a)
            .unwrap_or(DEFAULT_ROLE_AFFINITY)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Domain::Code => "code",
            Domain::Security => "security",
            Domain::Architecture => "architecture",
            Domain::Debug => "debug",
            Domain::Optimization => "optimization",
            Domain::Reasoning => "reasoning",
            Domain::General => "general",
        };
        write!(f, "{}", s)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Domain::General
    }
}

/// Affinity assigned to roles a domain's table does not mention.
pub const DEFAULT_ROLE_AFFINITY: f64 = 0.3;

// ---------------------------------------------------------------------------
// CapabilityType
// ---------------------------------------------------------------------------

/// Closed set of capability types spanning all domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityType {
    // Code
    CodeAnalysis,
    CodeGeneration,
    Refactoring,
    // Security
    VulnerabilityDetection,
    ThreatModeling,
    SecurityAudit,
    // Architecture
    SystemDesign,
    ApiDesign,
    ScalabilityPlanning,
    // Debug
    ErrorDiagnosis,
    RootCauseAnalysis,
    LogAnalysis,
    // Optimization
    PerformanceAnalysis,
    MemoryOptimization,
    ConcurrencyTuning,
    // Reasoning
    LogicalReasoning,
    MathematicalReasoning,
    StrategicPlanning,
    // General
    GeneralAssistance,
}

impl CapabilityType {
    /// The domain this capability type belongs to.
    pub fn domain(&self) -> Domain {
        match self {
            CapabilityType::CodeAnalysis
            | CapabilityType::CodeGeneration
            | CapabilityType::Refactoring => Domain::Code,
            CapabilityType::VulnerabilityDetection
            | CapabilityType::ThreatModeling
            | CapabilityType::SecurityAudit => Domain::Security,
            CapabilityType::SystemDesign
            | CapabilityType::ApiDesign
            | CapabilityType::ScalabilityPlanning => Domain::Architecture,
            CapabilityType::ErrorDiagnosis
            | CapabilityType::RootCauseAnalysis
            | CapabilityType::LogAnalysis => Domain::Debug,
            CapabilityType::PerformanceAnalysis
            | CapabilityType::MemoryOptimization
            | CapabilityType::ConcurrencyTuning => Domain::Optimization,
            CapabilityType::LogicalReasoning
            | CapabilityType::MathematicalReasoning
            | CapabilityType::StrategicPlanning => Domain::Reasoning,
            CapabilityType::GeneralAssistance => Domain::General,
        }
    }
}

impl fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CapabilityType::CodeAnalysis => "code_analysis",
            CapabilityType::CodeGeneration => "code_generation",
            CapabilityType::Refactoring => "refactoring",
            CapabilityType::VulnerabilityDetection => "vulnerability_detection",
            CapabilityType::ThreatModeling => "threat_modeling",
            CapabilityType::SecurityAudit => "security_audit",
            CapabilityType::SystemDesign => "system_design",
            CapabilityType::ApiDesign => "api_design",
            CapabilityType::ScalabilityPlanning => "scalability_planning",
            CapabilityType::ErrorDiagnosis => "error_diagnosis",
            CapabilityType::RootCauseAnalysis => "root_cause_analysis",
            CapabilityType::LogAnalysis => "log_analysis",
            CapabilityType::PerformanceAnalysis => "performance_analysis",
            CapabilityType::MemoryOptimization => "memory_optimization",
            CapabilityType::ConcurrencyTuning => "concurrency_tuning",
            CapabilityType::LogicalReasoning => "logical_reasoning",
            CapabilityType::MathematicalReasoning => "mathematical_reasoning",
            CapabilityType::StrategicPlanning => "strategic_planning",
            CapabilityType::GeneralAssistance => "general_assistance",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// DebateRole
// ---------------------------------------------------------------------------

/// The functional position an agent plays in a debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateRole {
    /// Drafts candidate solutions.
    Proposer,
    /// Challenges assumptions and identifies flaws.
    Critic,
    /// Reviews candidates for quality and completeness.
    Reviewer,
    /// Improves accepted candidates.
    Optimizer,
    /// Steers rounds and arbitrates convergence.
    Moderator,
    /// Owns structural and design concerns.
    Architect,
    /// Attacks candidate artifacts.
    RedTeam,
    /// Defends and patches attacked artifacts.
    BlueTeam,
    /// Confirms correctness of the final result.
    Validator,
    /// Exercises candidates with tests.
    Test,
    /// Audits for security posture.
    Security,
    /// Explains and documents outcomes.
    Teacher,
}

impl DebateRole {
    /// All roles, in declaration order.
    pub fn all() -> &'static [DebateRole] {
        &[
            DebateRole::Proposer,
            DebateRole::Critic,
            DebateRole::Reviewer,
            DebateRole::Optimizer,
            DebateRole::Moderator,
            DebateRole::Architect,
            DebateRole::RedTeam,
            DebateRole::BlueTeam,
            DebateRole::Validator,
            DebateRole::Test,
            DebateRole::Security,
            DebateRole::Teacher,
        ]
    }

    /// Parse a role from its snake_case name.
    pub fn parse(s: &str) -> Option<DebateRole> {
        let role = match s {
            "proposer" => DebateRole::Proposer,
            "critic" => DebateRole::Critic,
            "reviewer" => DebateRole::Reviewer,
            "optimizer" => DebateRole::Optimizer,
            "moderator" => DebateRole::Moderator,
            "architect" => DebateRole::Architect,
            "red_team" => DebateRole::RedTeam,
            "blue_team" => DebateRole::BlueTeam,
            "validator" => DebateRole::Validator,
            "test" => DebateRole::Test,
            "security" => DebateRole::Security,
            "teacher" => DebateRole::Teacher,
            _ => return None,
        };
        Some(role)
    }
}

impl fmt::Display for DebateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DebateRole::Proposer => "proposer",
            DebateRole::Critic => "critic",
            DebateRole::Reviewer => "reviewer",
            DebateRole::Optimizer => "optimizer",
            DebateRole::Moderator => "moderator",
            DebateRole::Architect => "architect",
            DebateRole::RedTeam => "red_team",
            DebateRole::BlueTeam => "blue_team",
            DebateRole::Validator => "validator",
            DebateRole::Test => "test",
            DebateRole::Security => "security",
            DebateRole::Teacher => "teacher",
        };
        write!(f, "{}", s)
    }
}

/// Role precedence used to order agents in a chain topology.
///
/// Ties between agents sharing a role are broken by verifier score
/// descending; agents whose role cannot be resolved are appended after all
/// listed roles.
pub const CHAIN_ROLE_PRECEDENCE: &[DebateRole] = &[
    DebateRole::Proposer,
    DebateRole::Architect,
    DebateRole::Critic,
    DebateRole::RedTeam,
    DebateRole::Reviewer,
    DebateRole::BlueTeam,
    DebateRole::Optimizer,
    DebateRole::Test,
    DebateRole::Security,
    DebateRole::Validator,
    DebateRole::Teacher,
    DebateRole::Moderator,
];

/// Position of a role in the chain precedence, or `usize::MAX` when absent.
pub fn chain_precedence_index(role: DebateRole) -> usize {
    CHAIN_ROLE_PRECEDENCE
        .iter()
        .position(|r| *r == role)
        .unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// DebatePhase
// ---------------------------------------------------------------------------

/// A stage of the debate protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    /// Candidate solutions are drafted.
    Proposal,
    /// Candidates are attacked and challenged.
    Critique,
    /// Candidates are reviewed in depth.
    Review,
    /// Surviving candidates are improved.
    Optimization,
    /// The debate converges on a consensus result.
    Convergence,
}

impl DebatePhase {
    /// Roles preferred when selecting a leader for this phase.
    pub fn preferred_roles(&self) -> &'static [DebateRole] {
        match self {
            DebatePhase::Proposal => &[DebateRole::Proposer, DebateRole::Architect],
            DebatePhase::Critique => &[DebateRole::Critic, DebateRole::RedTeam],
            DebatePhase::Review => &[DebateRole::Reviewer],
            DebatePhase::Optimization => &[DebateRole::Optimizer],
            DebatePhase::Convergence => &[DebateRole::Moderator, DebateRole::Validator],
        }
    }
}

impl fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DebatePhase::Proposal => "proposal",
            DebatePhase::Critique => "critique",
            DebatePhase::Review => "review",
            DebatePhase::Optimization => "optimization",
            DebatePhase::Convergence => "convergence",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Derived lookup tables
// ---------------------------------------------------------------------------

/// Reverse index: capability type → owning domain, built once.
static CAPABILITY_DOMAINS: Lazy<HashMap<CapabilityType, Domain>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for domain in Domain::all() {
        for cap in domain.capability_types() {
            map.insert(*cap, *domain);
        }
    }
    map
});

/// Look up the domain owning a capability type via the prebuilt index.
pub fn domain_of_capability(cap: CapabilityType) -> Domain {
    CAPABILITY_DOMAINS.get(&cap).copied().unwrap_or(Domain::General)
}
