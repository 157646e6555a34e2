//! Parsing of structured red/blue model replies.
//!
//! The accepted grammar: sections `VULNERABILITIES`, `EDGE_CASES`, and
//! `STRESS_SCENARIOS`, each holding `Key: Value` records separated by a line
//! containing only `---`; a single `OVERALL_RISK: <number>` line may appear
//! anywhere. Defense replies use `PATCHED_VULNERABILITIES`, a `PATCHES`
//! section terminated by `---`, `REMAINING_RISKS` (or `NONE`),
//! `CONFIDENCE`, and a fenced `PATCHED_CODE` block.
//!
//! Parsing is deliberately lenient about casing and stray whitespace; a
//! reply with none of the expected markers is a parse failure, which the
//! protocol converts into a deterministic fallback.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::adversarial::report::{
    AttackReport, DefenseReport, EdgeCase, Severity, StressScenario, Vulnerability,
    VulnerabilityCategory,
};
use crate::error::{DebateError, DebateResult};

static OVERALL_RISK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*OVERALL_RISK:\s*([0-9]*\.?[0-9]+)").expect("risk regex"));

static CONFIDENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*CONFIDENCE:\s*([0-9]*\.?[0-9]+)").expect("confidence regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackSection {
    None,
    Vulnerabilities,
    EdgeCases,
    StressScenarios,
}

/// Parse a red-side reply into an [`AttackReport`].
pub fn parse_attack_report(text: &str, round: u32) -> DebateResult<AttackReport> {
    let mut section = AttackSection::None;
    let mut saw_section = false;
    let mut record: HashMap<String, String> = HashMap::new();

    let mut vulnerabilities = Vec::new();
    let mut edge_cases = Vec::new();
    let mut stress_scenarios = Vec::new();

    let flush =
        |section: AttackSection,
         record: &mut HashMap<String, String>,
         vulnerabilities: &mut Vec<Vulnerability>,
         edge_cases: &mut Vec<EdgeCase>,
         stress_scenarios: &mut Vec<StressScenario>| {
            if record.is_empty() {
                return;
            }
            match section {
                AttackSection::Vulnerabilities => {
                    vulnerabilities.push(Vulnerability {
                        id: field(record, "id")
                            .unwrap_or_else(|| format!("vuln-{}", vulnerabilities.len() + 1)),
                        category: VulnerabilityCategory::parse(
                            &field(record, "category").unwrap_or_default(),
                        ),
                        severity: Severity::parse(&field(record, "severity").unwrap_or_default()),
                        description: field(record, "description").unwrap_or_default(),
                        evidence: field(record, "evidence").unwrap_or_default(),
                        exploit: field(record, "exploit").unwrap_or_default(),
                    });
                }
                AttackSection::EdgeCases => {
                    edge_cases.push(EdgeCase {
                        id: field(record, "id")
                            .unwrap_or_else(|| format!("edge-{}", edge_cases.len() + 1)),
                        description: field(record, "description").unwrap_or_default(),
                        input: field(record, "input").unwrap_or_default(),
                        expected: field(record, "expected").unwrap_or_default(),
                    });
                }
                AttackSection::StressScenarios => {
                    stress_scenarios.push(StressScenario {
                        id: field(record, "id")
                            .unwrap_or_else(|| format!("stress-{}", stress_scenarios.len() + 1)),
                        description: field(record, "description").unwrap_or_default(),
                        load: field(record, "load").unwrap_or_default(),
                        expected: field(record, "expected").unwrap_or_default(),
                    });
                }
                AttackSection::None => {}
            }
            record.clear();
        };

    for raw_line in text.lines() {
        let line = raw_line.trim();
        let upper = line.trim_end_matches(':').to_uppercase();

        let next_section = match upper.as_str() {
            "VULNERABILITIES" => Some(AttackSection::Vulnerabilities),
            "EDGE_CASES" | "EDGE CASES" => Some(AttackSection::EdgeCases),
            "STRESS_SCENARIOS" | "STRESS SCENARIOS" => Some(AttackSection::StressScenarios),
            _ => None,
        };
        if let Some(next) = next_section {
            flush(section, &mut record, &mut vulnerabilities, &mut edge_cases, &mut stress_scenarios);
            section = next;
            saw_section = true;
            continue;
        }

        if line == "---" {
            flush(section, &mut record, &mut vulnerabilities, &mut edge_cases, &mut stress_scenarios);
            continue;
        }

        if section != AttackSection::None {
            if let Some((key, value)) = line.split_once(':') {
                record.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }
    }
    flush(section, &mut record, &mut vulnerabilities, &mut edge_cases, &mut stress_scenarios);

    let risk_line = OVERALL_RISK_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    if !saw_section && risk_line.is_none() {
        return Err(DebateError::ParseFailure {
            context: "attack reply has no recognizable sections".to_string(),
        });
    }

    let mut report = AttackReport {
        vulnerabilities,
        edge_cases,
        stress_scenarios,
        overall_risk: 0.0,
        round,
    };
    report.overall_risk = risk_line
        .map(|r| r.clamp(0.0, 1.0))
        .unwrap_or_else(|| report.computed_risk());
    Ok(report)
}

/// Parse a blue-side reply into a [`DefenseReport`].
pub fn parse_defense_report(text: &str, round: u32) -> DebateResult<DefenseReport> {
    let mut patched_vulnerabilities: Vec<String> = Vec::new();
    let mut patches: HashMap<String, String> = HashMap::new();
    let mut remaining_risks: Vec<String> = Vec::new();
    let mut saw_marker = false;

    let mut in_patches = false;
    for raw_line in text.lines() {
        let line = raw_line.trim();
        let upper = line.to_uppercase();

        if let Some(rest) = strip_prefix_ci(line, "PATCHED_VULNERABILITIES:") {
            patched_vulnerabilities = split_list(rest);
            saw_marker = true;
            in_patches = false;
            continue;
        }
        if upper.trim_end_matches(':') == "PATCHES" {
            in_patches = true;
            saw_marker = true;
            continue;
        }
        if let Some(rest) = strip_prefix_ci(line, "REMAINING_RISKS:") {
            let rest = rest.trim();
            if !rest.eq_ignore_ascii_case("none") {
                remaining_risks = split_list(rest);
            }
            saw_marker = true;
            in_patches = false;
            continue;
        }
        if upper.starts_with("CONFIDENCE:") || upper.starts_with("PATCHED_CODE") {
            in_patches = false;
            continue;
        }
        if line == "---" {
            in_patches = false;
            continue;
        }

        if in_patches {
            if let Some((id, fix)) = line.split_once(':') {
                patches.insert(id.trim().to_string(), fix.trim().to_string());
            }
        }
    }

    let confidence = CONFIDENCE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    if confidence.is_some() {
        saw_marker = true;
    }

    if !saw_marker {
        return Err(DebateError::ParseFailure {
            context: "defense reply has no recognizable markers".to_string(),
        });
    }

    Ok(DefenseReport {
        patched_vulnerabilities,
        patches,
        remaining_risks,
        confidence: confidence.map(|c| c.clamp(0.0, 1.0)).unwrap_or(0.5),
        patched_artifact: extract_fenced_block(text).unwrap_or_default(),
        round,
    })
}

fn field(record: &HashMap<String, String>, key: &str) -> Option<String> {
    record.get(key).filter(|v| !v.is_empty()).cloned()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

/// Extract the body of the first fenced code block, dropping an optional
/// language tag on the opening fence.
fn extract_fenced_block(text: &str) -> Option<String> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTACK_REPLY: &str = "\
VULNERABILITIES:
ID: v1
Category: injection
Severity: critical
Description: query built by concatenation
Evidence: line 12
Exploit: ' OR 1=1 --
---
ID: v2
Category: race_condition
Severity: high
Description: unguarded counter
---

EDGE_CASES:
ID: e1
Description: empty input slice
Input: []
Expected: graceful no-op
---

STRESS_SCENARIOS:
ID: s1
Description: sustained fan-out
Load: 1000 rps for 60s
Expected: p99 under 250ms
---

OVERALL_RISK: 0.85
";

    #[test]
    fn test_parse_attack_report_full_grammar() {
        let report = parse_attack_report(ATTACK_REPLY, 1).unwrap();

        assert_eq!(report.vulnerabilities.len(), 2);
        assert_eq!(report.vulnerabilities[0].id, "v1");
        assert_eq!(report.vulnerabilities[0].category, VulnerabilityCategory::Injection);
        assert_eq!(report.vulnerabilities[0].severity, Severity::Critical);
        assert_eq!(report.vulnerabilities[0].exploit, "' OR 1=1 --");
        assert_eq!(report.vulnerabilities[1].severity, Severity::High);

        assert_eq!(report.edge_cases.len(), 1);
        assert_eq!(report.edge_cases[0].input, "[]");
        assert_eq!(report.stress_scenarios.len(), 1);
        assert_eq!(report.overall_risk, 0.85);
        assert_eq!(report.round, 1);
    }

    #[test]
    fn test_parse_attack_report_without_risk_line_computes_risk() {
        let reply = "\
VULNERABILITIES:
ID: v1
Severity: low
Description: minor
---
";
        let report = parse_attack_report(reply, 2).unwrap();
        assert_eq!(report.vulnerabilities.len(), 1);
        assert!((report.overall_risk - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_parse_attack_report_missing_severity_is_unknown() {
        let reply = "\
VULNERABILITIES:
ID: v1
Description: something odd
---
";
        let report = parse_attack_report(reply, 1).unwrap();
        assert_eq!(report.vulnerabilities[0].severity, Severity::Unknown);
        assert!((report.overall_risk - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_parse_attack_report_garbage_fails() {
        let err = parse_attack_report("I cannot help with that.", 1).unwrap_err();
        assert_eq!(err.kind(), "parse-failure");
    }

    #[test]
    fn test_parse_attack_report_empty_sections_is_clean() {
        let report = parse_attack_report("VULNERABILITIES:\n\nOVERALL_RISK: 0.0\n", 1).unwrap();
        assert!(report.vulnerabilities.is_empty());
        assert_eq!(report.overall_risk, 0.0);
    }

    const DEFENSE_REPLY: &str = "\
PATCHED_VULNERABILITIES: v1, v2
PATCHES:
v1: switched to parameterized statements
v2: guarded the counter with a mutex
---
REMAINING_RISKS: NONE
CONFIDENCE: 0.85
PATCHED_CODE:
```go
func main() { fixed() }
```
";

    #[test]
    fn test_parse_defense_report_full_grammar() {
        let report = parse_defense_report(DEFENSE_REPLY, 1).unwrap();

        assert_eq!(report.patched_vulnerabilities, vec!["v1", "v2"]);
        assert_eq!(report.patches["v1"], "switched to parameterized statements");
        assert!(report.remaining_risks.is_empty());
        assert_eq!(report.confidence, 0.85);
        assert_eq!(report.patched_artifact, "func main() { fixed() }");
    }

    #[test]
    fn test_parse_defense_report_remaining_risks_list() {
        let reply = "\
PATCHED_VULNERABILITIES: v1
REMAINING_RISKS: timing side channel, partial retry coverage
CONFIDENCE: 0.4
";
        let report = parse_defense_report(reply, 3).unwrap();
        assert_eq!(
            report.remaining_risks,
            vec!["timing side channel", "partial retry coverage"]
        );
        assert!(report.patched_artifact.is_empty());
        assert_eq!(report.round, 3);
    }

    #[test]
    fn test_parse_defense_report_garbage_fails() {
        let err = parse_defense_report("sure, looks fine to me!", 1).unwrap_err();
        assert_eq!(err.kind(), "parse-failure");
    }

    #[test]
    fn test_confidence_clamped() {
        let report = parse_defense_report("CONFIDENCE: 1.7\n", 1).unwrap();
        assert_eq!(report.confidence, 1.0);
    }
}
