//! Attack and defense report types.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vulnerability taxonomy
// ---------------------------------------------------------------------------

/// Category of a reported vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityCategory {
    Injection,
    Overflow,
    RaceCondition,
    LogicError,
    Auth,
    Xss,
    Other,
}

impl VulnerabilityCategory {
    /// Parse a category name, case-insensitively. Unrecognized input maps
    /// to [`VulnerabilityCategory::Other`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "injection" => Self::Injection,
            "overflow" => Self::Overflow,
            "race_condition" | "race condition" => Self::RaceCondition,
            "logic_error" | "logic error" => Self::LogicError,
            "auth" | "authentication" | "authorization" => Self::Auth,
            "xss" => Self::Xss,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for VulnerabilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Injection => "injection",
            Self::Overflow => "overflow",
            Self::RaceCondition => "race_condition",
            Self::LogicError => "logic_error",
            Self::Auth => "auth",
            Self::Xss => "xss",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Severity of a vulnerability. Replies that carry an unrecognized severity
/// keep it as [`Severity::Unknown`], which still contributes to risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    /// Parse a severity name, case-insensitively.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }

    /// Risk weight contributed by this severity.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Critical => 1.0,
            Self::High => 0.7,
            Self::Medium => 0.4,
            Self::Low => 0.2,
            Self::Unknown => 0.3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// One vulnerability found by the red side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub category: VulnerabilityCategory,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub exploit: String,
}

/// An input the artifact likely mishandles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCase {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected: String,
}

/// A load pattern the artifact should survive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressScenario {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub load: String,
    #[serde(default)]
    pub expected: String,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What the red side found in one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackReport {
    pub vulnerabilities: Vec<Vulnerability>,
    pub edge_cases: Vec<EdgeCase>,
    pub stress_scenarios: Vec<StressScenario>,
    /// Aggregate risk in [0, 1].
    pub overall_risk: f64,
    /// Round this report belongs to (1-based).
    pub round: u32,
}

impl AttackReport {
    /// Mean of the per-severity weights over all vulnerabilities, clamped
    /// to [0, 1]. Zero findings carry zero risk.
    pub fn computed_risk(&self) -> f64 {
        if self.vulnerabilities.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.vulnerabilities.iter().map(|v| v.severity.weight()).sum();
        (sum / self.vulnerabilities.len() as f64).clamp(0.0, 1.0)
    }
}

/// What the blue side did about the findings in one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefenseReport {
    /// Ids of the vulnerabilities the defense claims to have patched.
    pub patched_vulnerabilities: Vec<String>,
    /// Vulnerability id → description of the fix.
    pub patches: HashMap<String, String>,
    /// Risks the defense could not eliminate.
    pub remaining_risks: Vec<String>,
    /// Defense self-confidence in [0, 1].
    pub confidence: f64,
    /// The patched artifact; empty when the defense produced none.
    pub patched_artifact: String,
    /// Round this report belongs to (1-based).
    pub round: u32,
}

/// Outcome of a full adversarial run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdversarialResult {
    /// Rounds actually executed.
    pub rounds: u32,
    /// The artifact after the last applied defense.
    pub final_artifact: String,
    pub attack_reports: Vec<AttackReport>,
    pub defense_reports: Vec<DefenseReport>,
    /// True when no risks remain open.
    pub all_resolved: bool,
    /// Open risks at the end of the run.
    pub remaining_risks: Vec<String>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vuln(id: &str, severity: Severity) -> Vulnerability {
        Vulnerability {
            id: id.into(),
            category: VulnerabilityCategory::Other,
            severity,
            description: String::new(),
            evidence: String::new(),
            exploit: String::new(),
        }
    }

    #[test]
    fn test_severity_parse_and_weights() {
        assert_eq!(Severity::parse("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse(" low "), Severity::Low);
        assert_eq!(Severity::parse("whatever"), Severity::Unknown);

        assert_eq!(Severity::Critical.weight(), 1.0);
        assert_eq!(Severity::High.weight(), 0.7);
        assert_eq!(Severity::Medium.weight(), 0.4);
        assert_eq!(Severity::Low.weight(), 0.2);
        assert_eq!(Severity::Unknown.weight(), 0.3);
    }

    #[test]
    fn test_category_parse_aliases() {
        assert_eq!(
            VulnerabilityCategory::parse("race condition"),
            VulnerabilityCategory::RaceCondition
        );
        assert_eq!(VulnerabilityCategory::parse("authorization"), VulnerabilityCategory::Auth);
        assert_eq!(VulnerabilityCategory::parse("???"), VulnerabilityCategory::Other);
    }

    #[test]
    fn test_computed_risk_is_mean_of_weights() {
        let report = AttackReport {
            vulnerabilities: vec![vuln("v1", Severity::Critical), vuln("v2", Severity::Low)],
            edge_cases: vec![],
            stress_scenarios: vec![],
            overall_risk: 0.0,
            round: 1,
        };
        assert!((report.computed_risk() - 0.6).abs() < 1e-9);

        let empty = AttackReport {
            vulnerabilities: vec![],
            edge_cases: vec![],
            stress_scenarios: vec![],
            overall_risk: 0.0,
            round: 1,
        };
        assert_eq!(empty.computed_risk(), 0.0);
    }
}
