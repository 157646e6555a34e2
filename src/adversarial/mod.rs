//! Red/Blue adversarial protocol.
//!
//! A bounded attack–defend loop over a candidate artifact: the red side
//! hunts vulnerabilities, edge cases, and stress scenarios; the blue side
//! patches what was found. Model failures never stall the loop — both sides
//! have deterministic fallbacks.

pub mod fallback;
pub mod parser;
pub mod prompts;
pub mod protocol;
pub mod report;

pub use self::protocol::{AdversarialConfig, RedBlueProtocol};
pub use self::report::{
    AdversarialResult, AttackReport, DefenseReport, EdgeCase, Severity, StressScenario,
    Vulnerability, VulnerabilityCategory,
};
