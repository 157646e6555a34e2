//! Attack and defense prompt construction.
//!
//! Both prompts pin the model to an exact reply grammar so the parser can
//! recover structured reports; see `parser` for the accepted shape.

use crate::adversarial::report::{AttackReport, DefenseReport};

/// Build the red-side prompt for one round.
///
/// Echoes the prior round's defense patches, when present, so the attacker
/// can try to bypass them.
pub fn build_attack_prompt(
    language: &str,
    artifact: &str,
    previous_defense: Option<&DefenseReport>,
    round: u32,
) -> String {
    let mut prompt = String::with_capacity(artifact.len() + 1024);

    prompt.push_str(&format!(
        "You are the Red Team in round {round} of an adversarial review.\n\
         Attack the following {language} solution: find vulnerabilities, edge cases, \
         and stress scenarios an operator would regret missing.\n\n"
    ));

    if let Some(defense) = previous_defense {
        prompt.push_str("The Blue Team applied these patches last round; attempt to bypass them:\n");
        for (id, fix) in &defense.patches {
            prompt.push_str(&format!("- {id}: {fix}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("SOLUTION ({language}):\n{artifact}\n\n"));

    prompt.push_str(
        "Reply in exactly this format:\n\
         VULNERABILITIES:\n\
         ID: <identifier>\n\
         Category: <injection|overflow|race_condition|logic_error|auth|xss|other>\n\
         Severity: <critical|high|medium|low>\n\
         Description: <one line>\n\
         Evidence: <one line>\n\
         Exploit: <one line>\n\
         ---\n\
         (repeat per vulnerability, records separated by ---)\n\n\
         EDGE_CASES:\n\
         ID: <identifier>\n\
         Description: <one line>\n\
         Input: <one line>\n\
         Expected: <one line>\n\
         ---\n\n\
         STRESS_SCENARIOS:\n\
         ID: <identifier>\n\
         Description: <one line>\n\
         Load: <one line>\n\
         Expected: <one line>\n\
         ---\n\n\
         OVERALL_RISK: <number between 0 and 1>\n",
    );

    prompt
}

/// Build the blue-side prompt for one round.
pub fn build_defense_prompt(
    language: &str,
    artifact: &str,
    attack: &AttackReport,
    round: u32,
) -> String {
    let mut prompt = String::with_capacity(artifact.len() + 1024);

    prompt.push_str(&format!(
        "You are the Blue Team in round {round} of an adversarial review.\n\
         Patch the {language} solution below against every finding.\n\n\
         FINDINGS:\n"
    ));

    for vuln in &attack.vulnerabilities {
        prompt.push_str(&format!(
            "- [{}] severity={} category={}: {} (exploit: {})\n",
            vuln.id, vuln.severity, vuln.category, vuln.description, vuln.exploit
        ));
    }
    if !attack.edge_cases.is_empty() {
        prompt.push_str("\nEDGE CASES TO COVER:\n");
        for case in &attack.edge_cases {
            prompt.push_str(&format!("- [{}] {}\n", case.id, case.description));
        }
    }

    prompt.push_str(&format!("\nSOLUTION ({language}):\n{artifact}\n\n"));

    prompt.push_str(
        "Reply in exactly this format:\n\
         PATCHED_VULNERABILITIES: <id1, id2, ...>\n\
         PATCHES:\n\
         <id>: <fix description>\n\
         ---\n\
         REMAINING_RISKS: <comma-separated risks, or NONE>\n\
         CONFIDENCE: <number between 0 and 1>\n\
         PATCHED_CODE:\n\
         ```\n\
         <full patched solution>\n\
         ```\n",
    );

    prompt
}
