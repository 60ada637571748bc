//! Technical heat: infrastructure-level urgency derived from the technical
//! segment and provider.

use super::domain::{ProviderName, Segment, TechnicalHeat};
use super::ruleset::{first_match, RuleContext, RuleSet};

/// Derive the technical heat via the ordered heat table. Falls back to
/// `Cold`, the least-urgent classification, when no rule matches.
pub fn calculate_technical_heat(
    rules: &RuleSet,
    technical_segment: Segment,
    provider: &ProviderName,
) -> TechnicalHeat {
    let ctx = RuleContext {
        technical_segment: Some(technical_segment),
        provider: Some(provider),
        ..RuleContext::default()
    };

    match first_match(&rules.technical_heat_rules, &ctx) {
        Some(rule) => rule.result,
        None => {
            tracing::warn!(
                segment = %technical_segment,
                provider = %provider,
                "no technical heat rule matched; falling back to Cold"
            );
            TechnicalHeat::Cold
        }
    }
}
