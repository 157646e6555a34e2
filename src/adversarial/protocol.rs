//! The Red/Blue execute loop.
//!
//! Each round runs an attack, checks the termination gates (too few
//! findings, then risk below threshold), and otherwise runs a defense whose
//! patched artifact feeds the next round. A deadline — the configured
//! timeout, installed under the caller's cancellation token — bounds the
//! whole run; when it fires mid-loop the accumulated reports come back
//! wrapped in a timeout error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::adversarial::fallback::{fallback_attack, fallback_defense};
use crate::adversarial::parser::{parse_attack_report, parse_defense_report};
use crate::adversarial::prompts::{build_attack_prompt, build_defense_prompt};
use crate::adversarial::report::{AdversarialResult, AttackReport, DefenseReport};
use crate::error::{DebateError, DebateResult};
use crate::interfaces::{AuditEvent, CompletionClient, SharedAuditSink};

/// Default number of attack/defend rounds.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;
/// Default minimum finding count needed to keep attacking.
pub const DEFAULT_MIN_VULNERABILITIES: usize = 1;
/// Default risk level below which the loop stops.
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.2;
/// Default wall-clock budget for a full run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Tuning for the adversarial loop.
#[derive(Debug, Clone)]
pub struct AdversarialConfig {
    /// Upper bound on attack/defend rounds.
    pub max_rounds: u32,
    /// Below this many findings the attack is considered spent.
    pub min_vulnerabilities: usize,
    /// Below this overall risk the artifact is considered safe.
    pub risk_threshold: f64,
    /// Wall-clock budget for the whole run.
    pub timeout: Duration,
}

impl Default for AdversarialConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            min_vulnerabilities: DEFAULT_MIN_VULNERABILITIES,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

enum CallOutcome {
    Reply(String),
    UpstreamFailed,
    DeadlineExpired,
}

/// Drives the attack–defend loop against one model client.
pub struct RedBlueProtocol {
    client: Arc<dyn CompletionClient>,
    config: AdversarialConfig,
    audit: Option<SharedAuditSink>,
}

impl RedBlueProtocol {
    /// Create a protocol with default configuration.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            config: AdversarialConfig::default(),
            audit: None,
        }
    }

    /// Builder: override the configuration.
    pub fn with_config(mut self, config: AdversarialConfig) -> Self {
        self.config = config;
        self
    }

    /// Builder: attach an audit sink.
    pub fn with_audit_sink(mut self, sink: SharedAuditSink) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Run the full loop over a candidate solution.
    pub async fn execute(
        &self,
        token: &CancellationToken,
        solution: &str,
        language: &str,
    ) -> DebateResult<AdversarialResult> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.timeout;

        let mut artifact = solution.to_string();
        let mut attack_reports: Vec<AttackReport> = Vec::new();
        let mut defense_reports: Vec<DefenseReport> = Vec::new();

        for round in 1..=self.config.max_rounds {
            if token.is_cancelled() {
                return Err(DebateError::cancelled("adversarial round"));
            }

            // --- Attack ---
            self.emit_phase("attack", round, true);
            let prompt = build_attack_prompt(language, &artifact, defense_reports.last(), round);
            self.emit(AuditEvent::PromptSent {
                agent_id: "red_team".into(),
                phase: "attack".into(),
                prompt_chars: prompt.len(),
                timestamp: Utc::now(),
            });

            let attack = match self.call(&prompt, deadline, token).await? {
                CallOutcome::Reply(text) => match parse_attack_report(&text, round) {
                    Ok(report) => {
                        self.emit_response("red_team", "attack", false);
                        report
                    }
                    Err(err) => {
                        log::warn!("attack reply unparseable, using fallback: {err}");
                        self.emit_response("red_team", "attack", true);
                        fallback_attack(&artifact, language, round)
                    }
                },
                CallOutcome::UpstreamFailed => {
                    self.emit_response("red_team", "attack", true);
                    fallback_attack(&artifact, language, round)
                }
                CallOutcome::DeadlineExpired => {
                    return Err(self.timeout_error(artifact, attack_reports, defense_reports, started));
                }
            };
            self.emit_phase("attack", round, false);
            attack_reports.push(attack);
            let attack = attack_reports.last().expect("just pushed");

            // --- Termination gates, in order ---
            if attack.vulnerabilities.len() < self.config.min_vulnerabilities {
                self.emit_gate("min-vulnerabilities", "resolved");
                return Ok(resolved(artifact, attack_reports, defense_reports, started));
            }
            if attack.overall_risk < self.config.risk_threshold {
                self.emit_gate("risk-threshold", "resolved");
                return Ok(resolved(artifact, attack_reports, defense_reports, started));
            }

            // --- Defense ---
            self.emit_phase("defense", round, true);
            let prompt = build_defense_prompt(language, &artifact, attack, round);
            self.emit(AuditEvent::PromptSent {
                agent_id: "blue_team".into(),
                phase: "defense".into(),
                prompt_chars: prompt.len(),
                timestamp: Utc::now(),
            });

            let defense = match self.call(&prompt, deadline, token).await? {
                CallOutcome::Reply(text) => match parse_defense_report(&text, round) {
                    Ok(report) => {
                        self.emit_response("blue_team", "defense", false);
                        report
                    }
                    Err(err) => {
                        log::warn!("defense reply unparseable, using fallback: {err}");
                        self.emit_response("blue_team", "defense", true);
                        fallback_defense(attack, round)
                    }
                },
                CallOutcome::UpstreamFailed => {
                    self.emit_response("blue_team", "defense", true);
                    fallback_defense(attack, round)
                }
                CallOutcome::DeadlineExpired => {
                    return Err(self.timeout_error(artifact, attack_reports, defense_reports, started));
                }
            };
            self.emit_phase("defense", round, false);

            if !defense.patched_artifact.is_empty() {
                artifact = defense.patched_artifact.clone();
            }
            defense_reports.push(defense);
        }

        self.emit_gate("max-rounds", "exhausted");
        Ok(exhausted(artifact, attack_reports, defense_reports, started))
    }

    /// One model call bounded by the run deadline and the caller's token.
    async fn call(
        &self,
        prompt: &str,
        deadline: tokio::time::Instant,
        token: &CancellationToken,
    ) -> DebateResult<CallOutcome> {
        if tokio::time::Instant::now() >= deadline {
            return Ok(CallOutcome::DeadlineExpired);
        }

        tokio::select! {
            _ = token.cancelled() => Err(DebateError::cancelled("adversarial model call")),
            result = tokio::time::timeout_at(deadline, self.client.complete(prompt)) => {
                match result {
                    Ok(Ok(text)) => Ok(CallOutcome::Reply(text)),
                    Ok(Err(err)) => {
                        log::warn!("model call failed, falling back: {err}");
                        Ok(CallOutcome::UpstreamFailed)
                    }
                    Err(_) => Ok(CallOutcome::DeadlineExpired),
                }
            }
        }
    }

    fn timeout_error(
        &self,
        artifact: String,
        attack_reports: Vec<AttackReport>,
        defense_reports: Vec<DefenseReport>,
        started: Instant,
    ) -> DebateError {
        self.emit_gate("deadline", "expired");
        let partial = exhausted(artifact, attack_reports, defense_reports, started);
        DebateError::AdversarialTimeout {
            rounds: partial.rounds,
            partial: Box::new(partial),
        }
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit {
            sink.record(event);
        }
    }

    fn emit_phase(&self, phase: &str, round: u32, started: bool) {
        let timestamp = Utc::now();
        self.emit(if started {
            AuditEvent::PhaseStarted {
                phase: phase.into(),
                round,
                timestamp,
            }
        } else {
            AuditEvent::PhaseEnded {
                phase: phase.into(),
                round,
                timestamp,
            }
        });
    }

    fn emit_response(&self, agent_id: &str, phase: &str, fallback: bool) {
        self.emit(AuditEvent::ResponseReceived {
            agent_id: agent_id.into(),
            phase: phase.into(),
            fallback,
            timestamp: Utc::now(),
        });
    }

    fn emit_gate(&self, gate: &str, decision: &str) {
        self.emit(AuditEvent::GateDecision {
            gate: gate.into(),
            decision: decision.into(),
            timestamp: Utc::now(),
        });
    }
}

impl std::fmt::Debug for RedBlueProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedBlueProtocol")
            .field("config", &self.config)
            .field("has_audit", &self.audit.is_some())
            .finish()
    }
}

/// Result for the early-exit gates: nothing is left open.
fn resolved(
    final_artifact: String,
    attack_reports: Vec<AttackReport>,
    defense_reports: Vec<DefenseReport>,
    started: Instant,
) -> AdversarialResult {
    AdversarialResult {
        rounds: attack_reports.len() as u32,
        final_artifact,
        attack_reports,
        defense_reports,
        all_resolved: true,
        remaining_risks: Vec::new(),
        duration: started.elapsed(),
    }
}

/// Result when the rounds (or the clock) ran out: remaining risks are the
/// last defense's open risks, plus every vulnerability of a final attack
/// that no defense followed.
fn exhausted(
    final_artifact: String,
    attack_reports: Vec<AttackReport>,
    defense_reports: Vec<DefenseReport>,
    started: Instant,
) -> AdversarialResult {
    let mut remaining: Vec<String> = defense_reports
        .last()
        .map(|d| d.remaining_risks.clone())
        .unwrap_or_default();

    if attack_reports.len() > defense_reports.len() {
        if let Some(attack) = attack_reports.last() {
            for vuln in &attack.vulnerabilities {
                remaining.push(format!("{}: {}", vuln.id, vuln.description));
            }
        }
    }
    remaining.dedup();

    AdversarialResult {
        rounds: attack_reports.len() as u32,
        final_artifact,
        all_resolved: remaining.is_empty(),
        remaining_risks: remaining,
        attack_reports,
        defense_reports,
        duration: started.elapsed(),
    }
}
