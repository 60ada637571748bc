//! Commercial segment and commercial heat: the business-motive layer on top
//! of the technical classification.

use super::domain::{CommercialHeat, CommercialSegment, ProviderName, Segment};
use super::ruleset::{first_match, RuleContext, RuleSet};

/// Derive the commercial segment from technical segment, provider, and
/// score. Falls back to `NoGo` when no rule matches.
pub fn calculate_commercial_segment(
    rules: &RuleSet,
    technical_segment: Segment,
    provider: &ProviderName,
    readiness_score: i32,
) -> CommercialSegment {
    let ctx = RuleContext {
        score: Some(readiness_score),
        provider: Some(provider),
        technical_segment: Some(technical_segment),
        ..RuleContext::default()
    };

    match first_match(&rules.commercial_segment_rules, &ctx) {
        Some(rule) => rule.result,
        None => {
            tracing::warn!(
                segment = %technical_segment,
                provider = %provider,
                score = readiness_score,
                "no commercial segment rule matched; falling back to NO_GO"
            );
            CommercialSegment::NoGo
        }
    }
}

/// Derive the commercial heat from the commercial segment and score. Falls
/// back to `Low` when no rule matches.
pub fn calculate_commercial_heat(
    rules: &RuleSet,
    commercial_segment: CommercialSegment,
    readiness_score: i32,
) -> CommercialHeat {
    let ctx = RuleContext {
        score: Some(readiness_score),
        commercial_segment: Some(commercial_segment),
        ..RuleContext::default()
    };

    match first_match(&rules.commercial_heat_rules, &ctx) {
        Some(rule) => rule.result,
        None => {
            tracing::warn!(
                commercial_segment = %commercial_segment,
                score = readiness_score,
                "no commercial heat rule matched; falling back to LOW"
            );
            CommercialHeat::Low
        }
    }
}
