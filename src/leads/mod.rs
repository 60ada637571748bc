//! Lead scoring and classification engine.
//!
//! Turns a resolved signals bundle (MX records, SPF/DKIM presence, DMARC
//! policy) and a classified mail provider into a reproducible readiness
//! score, technical segment, itemized breakdown, and the derived
//! sales-facing classification chain. Everything is a pure function of the
//! immutable rule tables plus per-call inputs; callers may run any number of
//! classifications concurrently.

pub mod breakdown;
pub mod commercial;
pub mod domain;
pub mod heat;
pub mod priority;
pub mod providers;
pub mod ruleset;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use breakdown::{ProviderContribution, ScoreBreakdown};
pub use commercial::{calculate_commercial_heat, calculate_commercial_segment};
pub use domain::{
    CommercialHeat, CommercialSegment, DmarcPolicy, LeadClassification, PriorityCategory,
    ProviderName, ScoreResult, Segment, SignalsBundle, TechnicalHeat, TenantSize,
};
pub use heat::calculate_technical_heat;
pub use priority::{calculate_priority_category, calculate_priority_score};
pub use providers::{ProviderClassifier, ProviderRegistry, RegistryError};
pub use ruleset::{
    first_match, HardFailCondition, HardFailRule, RiskKey, Rule, RuleCondition, RuleContext,
    RuleSet, RulesetError, RulesetVersion, SignalKey,
};
pub use scoring::ScoringEngine;
