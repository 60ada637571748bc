//! Itemized score breakdown for audit display.
//!
//! Walks the same contribution order as the plain calculator but keeps every
//! term in a labeled bucket instead of only the running sum. The total must
//! agree with [`ScoringEngine::calculate_score`] bit for bit; the regression
//! and property suites hold that invariant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{DmarcPolicy, ProviderName, SignalsBundle};
use super::ruleset::{RiskKey, SignalKey};
use super::scoring::{spf_has_excessive_includes, ScoringEngine};

/// Provider identity and its point contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderContribution {
    pub name: ProviderName,
    pub points: i32,
}

/// Every contributing term of one score calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_score: i32,
    pub provider: ProviderContribution,
    pub signal_points: BTreeMap<SignalKey, i32>,
    pub risk_points: BTreeMap<RiskKey, i32>,
    pub total_score: i32,
}

impl ScoringEngine {
    /// Recompute the readiness score while retaining each contributing term.
    pub fn calculate_score_breakdown(
        &self,
        provider: &ProviderName,
        signals: &SignalsBundle,
    ) -> ScoreBreakdown {
        let rules = self.rules();

        let mut signal_points = BTreeMap::new();
        let mut risk_points = BTreeMap::new();

        if signals.spf {
            signal_points.insert(SignalKey::Spf, rules.signal_points(SignalKey::Spf));
        }
        if signals.dkim {
            signal_points.insert(SignalKey::Dkim, rules.signal_points(SignalKey::Dkim));
        }
        if let Some(policy) = signals.dmarc_policy {
            let key = match policy {
                DmarcPolicy::Quarantine => SignalKey::DmarcQuarantine,
                DmarcPolicy::Reject => SignalKey::DmarcReject,
                DmarcPolicy::None => SignalKey::DmarcNone,
            };
            signal_points.insert(key, rules.signal_points(key));
        }

        if !signals.spf {
            if let Some(points) = rules.risk_points(RiskKey::NoSpf) {
                risk_points.insert(RiskKey::NoSpf, points);
            }
        }
        if !signals.dkim {
            if let Some(points) = rules.risk_points(RiskKey::NoDkim) {
                risk_points.insert(RiskKey::NoDkim, points);
            }
            if let Some(points) = rules.risk_points(RiskKey::DkimNone) {
                risk_points.insert(RiskKey::DkimNone, points);
            }
        }
        if signals.dmarc_policy == Some(DmarcPolicy::None) {
            if let Some(points) = rules.risk_points(RiskKey::DmarcNone) {
                risk_points.insert(RiskKey::DmarcNone, points);
            }
        }
        if provider == &ProviderName::hosting() && !signals.spf && !signals.dkim {
            if let Some(points) = rules.risk_points(RiskKey::HostingMxWeak) {
                risk_points.insert(RiskKey::HostingMxWeak, points);
            }
        }
        if spf_has_excessive_includes(signals) {
            if let Some(points) = rules.risk_points(RiskKey::SpfMultipleIncludes) {
                risk_points.insert(RiskKey::SpfMultipleIncludes, points);
            }
        }

        let provider_points = rules.provider_points(provider);
        let raw_total = rules.base_score
            + provider_points
            + signal_points.values().sum::<i32>()
            + risk_points.values().sum::<i32>();

        ScoreBreakdown {
            base_score: rules.base_score,
            provider: ProviderContribution {
                name: provider.clone(),
                points: provider_points,
            },
            signal_points,
            risk_points,
            total_score: raw_total.clamp(0, 100),
        }
    }
}
