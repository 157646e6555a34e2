//! Pre-built agent templates for common debate domains.
//!
//! Templates are frozen recipes encoding what capabilities, roles, and
//! prompting produce good debate participants for a domain. The factory
//! registers the built-ins at construction; callers can register more.
//!
//! System-prompt templates use `{Domain}`, `{Name}`, `{Description}`,
//! `{Provider}`, `{Model}`, and `{Focus}` placeholders, substituted when an
//! agent is materialized.

use serde::{Deserialize, Serialize};

use crate::domain::{CapabilityType, DebateRole, Domain};

/// Frozen recipe an agent can be materialized from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTemplate {
    /// Registry identifier (kebab-case).
    pub id: String,
    /// Display name for agents created from this template.
    pub name: String,
    /// Domain the template specializes in.
    pub domain: Domain,
    /// Secondary domains granted to created agents.
    #[serde(default)]
    pub secondary_domains: Vec<Domain>,
    /// Expertise level in [0, 1].
    pub expertise: f64,
    /// Short focus statement.
    pub focus: String,
    /// Longer description.
    pub description: String,
    /// Capabilities added at proficiency = expertise.
    pub required_capabilities: Vec<CapabilityType>,
    /// Capabilities added at proficiency = 0.7 × expertise.
    #[serde(default)]
    pub optional_capabilities: Vec<CapabilityType>,
    /// Roles the template is intended for, best first.
    pub preferred_roles: Vec<DebateRole>,
    /// System-prompt template with substitution placeholders.
    pub system_prompt_template: String,
    /// Searchable tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AgentTemplate {
    /// Materialize the system prompt for a concrete agent.
    pub fn render_system_prompt(&self, name: &str, provider: &str, model: &str) -> String {
        self.system_prompt_template
            .replace("{Domain}", &self.domain.to_string())
            .replace("{Name}", name)
            .replace("{Description}", &self.description)
            .replace("{Provider}", provider)
            .replace("{Model}", model)
            .replace("{Focus}", &self.focus)
    }
}

/// Template for code-domain specialists.
pub fn code_specialist() -> AgentTemplate {
    AgentTemplate {
        id: "code-specialist".into(),
        name: "Code Specialist".into(),
        domain: Domain::Code,
        secondary_domains: vec![Domain::Debug],
        expertise: 0.9,
        focus: "implementation quality and correctness".into(),
        description: "Writes and reviews production code with attention to correctness, clarity, and test coverage".into(),
        required_capabilities: vec![
            CapabilityType::CodeAnalysis,
            CapabilityType::CodeGeneration,
            CapabilityType::Refactoring,
        ],
        optional_capabilities: vec![CapabilityType::ErrorDiagnosis],
        preferred_roles: vec![DebateRole::Proposer, DebateRole::Reviewer],
        system_prompt_template: "You are {Name}, a {Domain} specialist running on {Provider}/{Model}. \
            {Description}. Your focus: {Focus}. Propose concrete, complete solutions and review \
            competing candidates line by line."
            .into(),
        tags: vec!["code".into(), "implementation".into(), "review".into()],
    }
}

/// Template for security auditors covering both sides of the Red/Blue loop.
pub fn security_auditor() -> AgentTemplate {
    AgentTemplate {
        id: "security-auditor".into(),
        name: "Security Auditor".into(),
        domain: Domain::Security,
        secondary_domains: vec![Domain::Code],
        expertise: 0.9,
        focus: "vulnerability discovery and mitigation".into(),
        description: "Attacks candidate artifacts for exploitable weaknesses and hardens them against the findings".into(),
        required_capabilities: vec![
            CapabilityType::VulnerabilityDetection,
            CapabilityType::ThreatModeling,
            CapabilityType::SecurityAudit,
        ],
        optional_capabilities: vec![CapabilityType::CodeAnalysis],
        preferred_roles: vec![DebateRole::RedTeam, DebateRole::BlueTeam, DebateRole::Critic],
        system_prompt_template: "You are {Name}, a {Domain} specialist running on {Provider}/{Model}. \
            {Description}. Your focus: {Focus}. Enumerate injection, overflow, race, and auth \
            weaknesses with concrete exploits, then verify every claimed fix."
            .into(),
        tags: vec!["security".into(), "red_team".into(), "audit".into()],
    }
}

/// Template for system architects.
pub fn system_architect() -> AgentTemplate {
    AgentTemplate {
        id: "system-architect".into(),
        name: "System Architect".into(),
        domain: Domain::Architecture,
        secondary_domains: vec![Domain::Code, Domain::Optimization],
        expertise: 0.85,
        focus: "structural soundness and scalability".into(),
        description: "Shapes system boundaries, interfaces, and data flows before implementation details are argued".into(),
        required_capabilities: vec![
            CapabilityType::SystemDesign,
            CapabilityType::ApiDesign,
            CapabilityType::ScalabilityPlanning,
        ],
        optional_capabilities: vec![CapabilityType::CodeAnalysis],
        preferred_roles: vec![DebateRole::Architect, DebateRole::Proposer],
        system_prompt_template: "You are {Name}, a {Domain} specialist running on {Provider}/{Model}. \
            {Description}. Your focus: {Focus}. Argue from interfaces and failure domains, not \
            implementation preference."
            .into(),
        tags: vec!["architecture".into(), "design".into()],
    }
}

/// Template for debugging specialists.
pub fn debug_detective() -> AgentTemplate {
    AgentTemplate {
        id: "debug-detective".into(),
        name: "Debug Detective".into(),
        domain: Domain::Debug,
        secondary_domains: vec![Domain::Code],
        expertise: 0.85,
        focus: "fault isolation and root-cause analysis".into(),
        description: "Diagnoses failures systematically, separating symptoms from causes before judging candidates".into(),
        required_capabilities: vec![
            CapabilityType::ErrorDiagnosis,
            CapabilityType::RootCauseAnalysis,
            CapabilityType::LogAnalysis,
        ],
        optional_capabilities: vec![CapabilityType::CodeAnalysis],
        preferred_roles: vec![DebateRole::Critic, DebateRole::Validator],
        system_prompt_template: "You are {Name}, a {Domain} specialist running on {Provider}/{Model}. \
            {Description}. Your focus: {Focus}. Challenge every candidate with the failure modes it \
            has not accounted for."
            .into(),
        tags: vec!["debug".into(), "diagnosis".into()],
    }
}

/// Template for performance optimizers.
pub fn performance_optimizer() -> AgentTemplate {
    AgentTemplate {
        id: "performance-optimizer".into(),
        name: "Performance Optimizer".into(),
        domain: Domain::Optimization,
        secondary_domains: vec![Domain::Code],
        expertise: 0.85,
        focus: "latency, throughput, and resource budgets".into(),
        description: "Improves accepted candidates against measurable performance and resource targets".into(),
        required_capabilities: vec![
            CapabilityType::PerformanceAnalysis,
            CapabilityType::MemoryOptimization,
            CapabilityType::ConcurrencyTuning,
        ],
        optional_capabilities: vec![CapabilityType::Refactoring],
        preferred_roles: vec![DebateRole::Optimizer, DebateRole::Reviewer],
        system_prompt_template: "You are {Name}, a {Domain} specialist running on {Provider}/{Model}. \
            {Description}. Your focus: {Focus}. Quantify every improvement you claim."
            .into(),
        tags: vec!["optimization".into(), "performance".into()],
    }
}

/// Template for reasoning strategists who moderate and validate.
pub fn reasoning_strategist() -> AgentTemplate {
    AgentTemplate {
        id: "reasoning-strategist".into(),
        name: "Reasoning Strategist".into(),
        domain: Domain::Reasoning,
        secondary_domains: vec![Domain::General],
        expertise: 0.85,
        focus: "argument structure and convergence".into(),
        description: "Keeps the debate logically coherent, weighs competing arguments, and steers convergence".into(),
        required_capabilities: vec![
            CapabilityType::LogicalReasoning,
            CapabilityType::StrategicPlanning,
        ],
        optional_capabilities: vec![CapabilityType::MathematicalReasoning],
        preferred_roles: vec![DebateRole::Moderator, DebateRole::Validator, DebateRole::Teacher],
        system_prompt_template: "You are {Name}, a {Domain} specialist running on {Provider}/{Model}. \
            {Description}. Your focus: {Focus}. Separate sound arguments from confident ones."
            .into(),
        tags: vec!["reasoning".into(), "moderation".into()],
    }
}

/// Template for general-purpose participants.
pub fn generalist() -> AgentTemplate {
    AgentTemplate {
        id: "generalist".into(),
        name: "Generalist".into(),
        domain: Domain::General,
        secondary_domains: Vec::new(),
        expertise: 0.7,
        focus: "broad coverage of gaps the specialists leave".into(),
        description: "A capable all-rounder filling roles no specialist claims".into(),
        required_capabilities: vec![CapabilityType::GeneralAssistance],
        optional_capabilities: vec![CapabilityType::LogicalReasoning],
        preferred_roles: vec![DebateRole::Moderator, DebateRole::Proposer],
        system_prompt_template: "You are {Name}, a {Domain} participant running on {Provider}/{Model}. \
            {Description}. Your focus: {Focus}."
            .into(),
        tags: vec!["general".into()],
    }
}

/// All built-in templates, one per domain.
pub fn builtin_templates() -> Vec<AgentTemplate> {
    vec![
        code_specialist(),
        security_auditor(),
        system_architect(),
        debug_detective(),
        performance_optimizer(),
        reasoning_strategist(),
        generalist(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_cover_every_domain() {
        let templates = builtin_templates();
        for domain in Domain::all() {
            assert!(
                templates.iter().any(|t| t.domain == *domain),
                "no builtin template for {}",
                domain
            );
        }
    }

    #[test]
    fn test_builtin_ids_unique() {
        let templates = builtin_templates();
        for (i, a) in templates.iter().enumerate() {
            for b in templates.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_render_system_prompt_substitutes_all_placeholders() {
        let template = security_auditor();
        let prompt = template.render_system_prompt("Nightwatch", "ollama", "llama3:70b");

        assert!(prompt.contains("Nightwatch"));
        assert!(prompt.contains("security"));
        assert!(prompt.contains("ollama/llama3:70b"));
        assert!(prompt.contains(&template.focus));
        assert!(!prompt.contains('{'), "unsubstituted placeholder in: {prompt}");
    }

    #[test]
    fn test_expertise_in_range() {
        for template in builtin_templates() {
            assert!((0.0..=1.0).contains(&template.expertise), "{}", template.id);
            assert!(!template.preferred_roles.is_empty(), "{}", template.id);
            assert!(!template.required_capabilities.is_empty(), "{}", template.id);
        }
    }
}
