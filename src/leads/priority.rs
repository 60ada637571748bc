//! Priority category (P1-P6) and the numeric priority score used for
//! sorting leads.

use super::domain::{CommercialHeat, CommercialSegment, PriorityCategory, Segment, TechnicalHeat};
use super::ruleset::{first_match, RuleContext, RuleSet, RulesetVersion};

// Priority score thresholds. Hard-coded rather than table-driven: this
// mapping is stable business logic, not tunable scoring.
const PRIORITY_1_SCORE: i32 = 80;
const PRIORITY_2_SCORE: i32 = 70;
const PRIORITY_3_MIGRATION_SCORE: i32 = 50;
const PRIORITY_3_EXISTING_SCORE: i32 = 70;
const PRIORITY_4_EXISTING_SCORE: i32 = 50;
const PRIORITY_5_EXISTING_SCORE: i32 = 30;
const PRIORITY_5_COLD_SCORE: i32 = 40;
const PRIORITY_6_COLD_SCORE: i32 = 20;

/// Derive the P1-P6 category and its human-readable label from the heat and
/// commercial classifications. Falls back to `(P6, "No-Go / Archive")`.
pub fn calculate_priority_category(
    rules: &RuleSet,
    technical_heat: TechnicalHeat,
    commercial_heat: CommercialHeat,
    commercial_segment: CommercialSegment,
) -> (PriorityCategory, String) {
    let ctx = RuleContext {
        technical_heat: Some(technical_heat),
        commercial_heat: Some(commercial_heat),
        commercial_segment: Some(commercial_segment),
        ..RuleContext::default()
    };

    match first_match(&rules.priority_category_rules, &ctx) {
        Some(rule) => {
            let label = rule
                .label
                .clone()
                .unwrap_or_else(|| rule.result.label().to_string());
            (rule.result, label)
        }
        None => {
            tracing::warn!(
                technical_heat = %technical_heat,
                commercial_heat = %commercial_heat,
                commercial_segment = %commercial_segment,
                "no priority category rule matched; falling back to P6"
            );
            (
                PriorityCategory::P6,
                PriorityCategory::P6.label().to_string(),
            )
        }
    }
}

/// Rank a lead 1 (act first) through 7 (coldest) from its segment and score.
///
/// Null segment, null score, and unrecognized segments all take the
/// version-dependent Skip fallback: 6 under v1 rules, 7 under v2.
pub fn calculate_priority_score(
    version: RulesetVersion,
    segment: Option<Segment>,
    score: Option<i32>,
) -> u8 {
    let (segment, score) = match (segment, score) {
        (Some(segment), Some(score)) => (segment, score),
        _ => return version.skip_priority(),
    };

    match segment {
        // Migration leads keep priority even at low scores.
        Segment::Migration => {
            if score >= PRIORITY_1_SCORE {
                1
            } else if score >= PRIORITY_2_SCORE {
                2
            } else if score >= PRIORITY_3_MIGRATION_SCORE {
                3
            } else {
                4
            }
        }
        Segment::Existing => {
            if score >= PRIORITY_3_EXISTING_SCORE {
                3
            } else if score >= PRIORITY_4_EXISTING_SCORE {
                4
            } else if score >= PRIORITY_5_EXISTING_SCORE {
                5
            } else {
                6
            }
        }
        Segment::Cold => {
            if score >= PRIORITY_5_COLD_SCORE {
                5
            } else if score >= PRIORITY_6_COLD_SCORE {
                6
            } else {
                7
            }
        }
        Segment::Skip => version.skip_priority(),
    }
}
