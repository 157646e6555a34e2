//! Deterministic fallbacks for the Red/Blue loop.
//!
//! When the model client errors or its reply cannot be parsed, the protocol
//! substitutes reports computed from the artifact text alone. The attack
//! side scans for risk heuristics with word-boundary matching, so an
//! identifier like `error_rate` does not by itself classify as an
//! error-handling marker. The defense side acknowledges every finding with
//! a category-generic fix but cannot synthesize patches, so the artifact is
//! left unchanged.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::adversarial::report::{
    AttackReport, DefenseReport, EdgeCase, Severity, StressScenario, Vulnerability,
    VulnerabilityCategory,
};

/// Confidence a fallback defense reports.
pub const FALLBACK_DEFENSE_CONFIDENCE: f64 = 0.4;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("fallback heuristic regex")
}

static DYNAMIC_QUERY: Lazy<Regex> = Lazy::new(|| regex(r"(?i)\b(sprintf|format|query)\w*\b"));
static QUERY_GUARD: Lazy<Regex> =
    Lazy::new(|| regex(r"(?i)\b(prepare|parameterize|parameterized|placeholder)\w*\b"));

static INPUT_GUARD: Lazy<Regex> =
    Lazy::new(|| regex(r"(?i)\b(validat\w*|sanitiz\w*|escap\w*|clean\w*)\b"));

static CONCURRENCY: Lazy<Regex> = Lazy::new(|| regex(r"(?i)\b(goroutine|go\s+func|thread\w*|async|await|spawn)\b"));
static CONCURRENCY_GUARD: Lazy<Regex> =
    Lazy::new(|| regex(r"(?i)\b(mutex|lock\w*|sync\w*|atomic\w*|channel\w*)\b"));

static ERROR_MARKER: Lazy<Regex> = Lazy::new(|| regex(r"(?i)\b(err|error)\b"));
static DISCARDED_RESULT: Lazy<Regex> = Lazy::new(|| regex(r"(^|[\s(])_\s*[=,]"));

static RAW_MEMORY: Lazy<Regex> =
    Lazy::new(|| regex(r"(?i)\b(unsafe|pointer\w*|buffer\w*|alloc\w*)\b"));

/// Scan the artifact and emit a synthetic attack report.
pub fn fallback_attack(artifact: &str, language: &str, round: u32) -> AttackReport {
    let mut vulnerabilities = Vec::new();

    if DYNAMIC_QUERY.is_match(artifact) && !QUERY_GUARD.is_match(artifact) {
        vulnerabilities.push(Vulnerability {
            id: format!("fb-{round}-injection"),
            category: VulnerabilityCategory::Injection,
            severity: Severity::Critical,
            description: "dynamic string construction reaches a query or format sink without parameterization".into(),
            evidence: "matched sprintf/format/query with no prepare/parameterize/placeholder".into(),
            exploit: "craft input containing delimiter characters to alter the constructed statement".into(),
        });
    }

    if !INPUT_GUARD.is_match(artifact) {
        vulnerabilities.push(Vulnerability {
            id: format!("fb-{round}-validation"),
            category: VulnerabilityCategory::LogicError,
            severity: Severity::Medium,
            description: "no input validation or sanitization found anywhere in the artifact".into(),
            evidence: "no validate/sanitize/escape/clean tokens present".into(),
            exploit: "feed malformed input straight into the main path".into(),
        });
    }

    if CONCURRENCY.is_match(artifact) && !CONCURRENCY_GUARD.is_match(artifact) {
        vulnerabilities.push(Vulnerability {
            id: format!("fb-{round}-race"),
            category: VulnerabilityCategory::RaceCondition,
            severity: Severity::High,
            description: "concurrent execution without any visible synchronization primitive".into(),
            evidence: "matched goroutine/thread/async with no mutex/lock/sync/atomic/channel".into(),
            exploit: "run overlapping operations against shared state until it corrupts".into(),
        });
    }

    if ERROR_MARKER.is_match(artifact) && DISCARDED_RESULT.is_match(artifact) {
        vulnerabilities.push(Vulnerability {
            id: format!("fb-{round}-error-discard"),
            category: VulnerabilityCategory::LogicError,
            severity: Severity::Medium,
            description: "error results are discarded into a blank identifier".into(),
            evidence: "error-handling markers appear next to `_ =` / `_,` discards".into(),
            exploit: "trigger the failing path and observe the silent continuation".into(),
        });
    }

    if RAW_MEMORY.is_match(artifact) {
        vulnerabilities.push(Vulnerability {
            id: format!("fb-{round}-memory"),
            category: VulnerabilityCategory::Overflow,
            severity: Severity::High,
            description: "raw memory handling without visible bounds discipline".into(),
            evidence: "matched unsafe/pointer/buffer/alloc tokens".into(),
            exploit: "oversized input to push a write past its allocation".into(),
        });
    }

    let report = AttackReport {
        overall_risk: 0.0,
        vulnerabilities,
        edge_cases: vec![language_edge_case(language, round)],
        stress_scenarios: vec![StressScenario {
            id: format!("fb-{round}-stress"),
            description: "sustained high-concurrency load against the primary entry point".into(),
            load: "100 concurrent callers for 60 seconds".into(),
            expected: "no deadlock, no corrupted state, bounded latency".into(),
        }],
        round,
    };

    AttackReport {
        overall_risk: report.computed_risk(),
        ..report
    }
}

/// The language-specific null-ish edge case.
fn language_edge_case(language: &str, round: u32) -> EdgeCase {
    let lang = language.to_lowercase();
    let (input, description) = if lang.contains("go") {
        ("nil", "nil pointer dereference on an uninitialized receiver")
    } else if lang.contains("python") {
        ("None", "None propagated into an attribute access")
    } else if lang.contains("javascript") || lang.contains("typescript") || lang == "js" {
        ("undefined", "undefined flowing into a property lookup")
    } else {
        ("", "completely empty input")
    };

    EdgeCase {
        id: format!("fb-{round}-edge"),
        description: description.into(),
        input: input.into(),
        expected: "a typed error, not a crash".into(),
    }
}

/// Acknowledge every finding with a generic fix; the artifact is unchanged.
pub fn fallback_defense(attack: &AttackReport, round: u32) -> DefenseReport {
    let mut patched = Vec::with_capacity(attack.vulnerabilities.len());
    let mut patches = HashMap::new();

    for vuln in &attack.vulnerabilities {
        patched.push(vuln.id.clone());
        patches.insert(vuln.id.clone(), generic_fix(vuln.category).to_string());
    }

    DefenseReport {
        patched_vulnerabilities: patched,
        patches,
        remaining_risks: attack.edge_cases.iter().map(|e| e.description.clone()).collect(),
        confidence: FALLBACK_DEFENSE_CONFIDENCE,
        // A fallback cannot synthesize patches.
        patched_artifact: String::new(),
        round,
    }
}

fn generic_fix(category: VulnerabilityCategory) -> &'static str {
    match category {
        VulnerabilityCategory::Injection => {
            "route all dynamic values through parameterized statements"
        }
        VulnerabilityCategory::Overflow => "bound every write and validate allocation sizes",
        VulnerabilityCategory::RaceCondition => {
            "guard shared state with a mutex or hand it off over a channel"
        }
        VulnerabilityCategory::LogicError => "validate inputs and handle every error path",
        VulnerabilityCategory::Auth => "enforce authentication and authorization at each entry point",
        VulnerabilityCategory::Xss => "escape untrusted output before rendering",
        VulnerabilityCategory::Other => "review and harden the flagged code path",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_heuristic_requires_missing_guard() {
        let risky = r#"query := fmt.Sprintf("SELECT * FROM t WHERE id=%s", id)"#;
        let report = fallback_attack(risky, "go", 1);
        assert!(report
            .vulnerabilities
            .iter()
            .any(|v| v.category == VulnerabilityCategory::Injection
                && v.severity == Severity::Critical));

        let guarded = "stmt := prepare(query); stmt.exec(id) // validate input";
        let report = fallback_attack(guarded, "go", 1);
        assert!(!report
            .vulnerabilities
            .iter()
            .any(|v| v.category == VulnerabilityCategory::Injection));
    }

    #[test]
    fn test_missing_validation_is_medium_logic_error() {
        let report = fallback_attack("fn main() { run() }", "rust", 1);
        let vuln = report
            .vulnerabilities
            .iter()
            .find(|v| v.id.ends_with("validation"))
            .unwrap();
        assert_eq!(vuln.category, VulnerabilityCategory::LogicError);
        assert_eq!(vuln.severity, Severity::Medium);
    }

    #[test]
    fn test_race_heuristic() {
        let racy = "go func() { counter++ }()";
        let report = fallback_attack(racy, "go", 1);
        assert!(report
            .vulnerabilities
            .iter()
            .any(|v| v.category == VulnerabilityCategory::RaceCondition));

        let locked = "go func() { mu.Lock(); counter++; mu.Unlock() }() // sanitize";
        let report = fallback_attack(locked, "go", 1);
        assert!(!report
            .vulnerabilities
            .iter()
            .any(|v| v.category == VulnerabilityCategory::RaceCondition));
    }

    #[test]
    fn test_error_marker_needs_word_boundary_and_discard() {
        // An identifier merely containing "error" plus no discard: no finding.
        let benign = "let error_rate_limit = sanitize(compute());";
        let report = fallback_attack(benign, "rust", 1);
        assert!(!report.vulnerabilities.iter().any(|v| v.id.ends_with("error-discard")));

        let sloppy = "_ = err // validate elsewhere";
        let report = fallback_attack(sloppy, "go", 1);
        assert!(report.vulnerabilities.iter().any(|v| v.id.ends_with("error-discard")));
    }

    #[test]
    fn test_raw_memory_is_high_overflow() {
        let report = fallback_attack("let p = unsafe { buffer.as_mut_ptr() }; // validate", "rust", 1);
        let vuln = report
            .vulnerabilities
            .iter()
            .find(|v| v.category == VulnerabilityCategory::Overflow)
            .unwrap();
        assert_eq!(vuln.severity, Severity::High);
    }

    #[test]
    fn test_language_edge_cases() {
        assert_eq!(fallback_attack("x", "go", 1).edge_cases[0].input, "nil");
        assert_eq!(fallback_attack("x", "Python", 1).edge_cases[0].input, "None");
        assert_eq!(fallback_attack("x", "typescript", 1).edge_cases[0].input, "undefined");
        assert_eq!(fallback_attack("x", "haskell", 1).edge_cases[0].input, "");
    }

    #[test]
    fn test_overall_risk_is_mean_of_severity_weights() {
        // No guards at all: validation (0.4 medium) fires for sure.
        let report = fallback_attack("fn main() {}", "rust", 1);
        let expected: f64 = report.vulnerabilities.iter().map(|v| v.severity.weight()).sum::<f64>()
            / report.vulnerabilities.len() as f64;
        assert!((report.overall_risk - expected).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&report.overall_risk));
    }

    #[test]
    fn test_fallback_defense_acknowledges_everything() {
        let attack = fallback_attack("go func() { _ = err }()", "go", 2);
        let defense = fallback_defense(&attack, 2);

        assert_eq!(defense.patched_vulnerabilities.len(), attack.vulnerabilities.len());
        for vuln in &attack.vulnerabilities {
            assert!(defense.patches.contains_key(&vuln.id));
        }
        assert_eq!(defense.confidence, FALLBACK_DEFENSE_CONFIDENCE);
        assert!(defense.patched_artifact.is_empty());
        // Edge cases surface as remaining risks.
        assert_eq!(defense.remaining_risks.len(), attack.edge_cases.len());
    }
}
