//! Readiness scoring and segment determination.
//!
//! Everything here is pure and synchronous over the loaded [`RuleSet`]; the
//! optional result cache is a transparent layer that must never change what
//! an uncached call would return.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::commercial::{calculate_commercial_heat, calculate_commercial_segment};
use super::domain::{
    is_valid_domain, DmarcPolicy, LeadClassification, ProviderName, ScoreResult, Segment,
    SignalsBundle,
};
use super::heat::calculate_technical_heat;
use super::priority::{calculate_priority_category, calculate_priority_score};
use super::ruleset::{
    first_match, RiskKey, RuleContext, RuleSet, RulesetError, RulesetVersion, SignalKey,
};

/// SPF records chaining more than this many `include:` terms are flagged as
/// a delegation-sprawl risk.
pub(crate) const SPF_INCLUDE_LIMIT: usize = 3;

/// How long a scoring result stays cached per (domain, provider, signals).
pub const SCORING_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on cached scoring results. Hitting it drops expired entries
/// first, then the whole map if every entry is still fresh.
pub(crate) const SCORING_CACHE_MAX_ENTRIES: usize = 4096;

struct CachedScore {
    result: ScoreResult,
    cached_at: Instant,
}

/// Stateless rule interpreter over one loaded ruleset version.
///
/// Construct once at process startup and share by reference; all methods are
/// pure functions of their inputs plus the immutable rule tables.
pub struct ScoringEngine {
    rules: &'static RuleSet,
    cache: Option<Mutex<HashMap<String, CachedScore>>>,
    cache_ttl: Duration,
}

impl ScoringEngine {
    pub fn new(version: RulesetVersion) -> Result<Self, RulesetError> {
        Ok(Self {
            rules: RuleSet::load(version)?,
            cache: None,
            cache_ttl: SCORING_CACHE_TTL,
        })
    }

    /// Enable the transparent per-domain result cache.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(Mutex::new(HashMap::new()));
        self
    }

    pub fn rules(&self) -> &'static RuleSet {
        self.rules
    }

    pub fn version(&self) -> RulesetVersion {
        self.rules.version
    }

    /// Check signal-independent terminal conditions against the hard-fail
    /// table, in order. Returns the first matching rule's description.
    pub fn check_hard_fail(&self, mx_records: Option<&[String]>) -> Option<&str> {
        self.rules
            .hard_fail_rules
            .iter()
            .find(|rule| rule.condition.holds(mx_records))
            .map(|rule| rule.description.as_str())
    }

    /// Compute the 0-100 readiness score from provider identity, signal
    /// presence, and risk penalties. Deterministic and free of I/O.
    pub fn calculate_score(&self, provider: &ProviderName, signals: &SignalsBundle) -> i32 {
        let rules = self.rules;
        let mut score = rules.base_score;

        score += rules.provider_points(provider);

        if signals.spf {
            score += rules.signal_points(SignalKey::Spf);
        }
        if signals.dkim {
            score += rules.signal_points(SignalKey::Dkim);
        }
        if let Some(policy) = signals.dmarc_policy {
            score += match policy {
                DmarcPolicy::Quarantine => rules.signal_points(SignalKey::DmarcQuarantine),
                DmarcPolicy::Reject => rules.signal_points(SignalKey::DmarcReject),
                DmarcPolicy::None => rules.signal_points(SignalKey::DmarcNone),
            };
        }

        if !signals.spf {
            score += rules.risk_points(RiskKey::NoSpf).unwrap_or(0);
        }
        if !signals.dkim {
            score += rules.risk_points(RiskKey::NoDkim).unwrap_or(0);
            // v2 stacks an extra penalty for DKIM being absent outright.
            score += rules.risk_points(RiskKey::DkimNone).unwrap_or(0);
        }
        // A published policy of literally "none" is penalized on top of its
        // zero signal contribution; an absent DMARC record is not. The
        // asymmetry is part of the scoring contract.
        if signals.dmarc_policy == Some(DmarcPolicy::None) {
            score += rules.risk_points(RiskKey::DmarcNone).unwrap_or(0);
        }
        if provider == &ProviderName::hosting() && !signals.spf && !signals.dkim {
            score += rules.risk_points(RiskKey::HostingMxWeak).unwrap_or(0);
        }
        if spf_has_excessive_includes(signals) {
            score += rules.risk_points(RiskKey::SpfMultipleIncludes).unwrap_or(0);
        }

        score.clamp(0, 100)
    }

    /// Map (score, provider) to a technical segment via the ordered segment
    /// table. No rule matching is a configuration gap, not a caller error:
    /// it degrades to Skip with a diagnostic reason.
    pub fn determine_segment(&self, score: i32, provider: &ProviderName) -> (Segment, String) {
        let ctx = RuleContext {
            score: Some(score),
            provider: Some(provider),
            ..RuleContext::default()
        };

        match first_match(&self.rules.segment_rules, &ctx) {
            Some(rule) => {
                let description = rule.description.as_deref().unwrap_or("Matched segment rule");
                let reason = format!("{description}. Score: {score}, Provider: {provider}");
                (rule.result, reason)
            }
            None => {
                tracing::warn!(
                    score,
                    provider = %provider,
                    "no segment rule matched; ruleset is missing coverage"
                );
                (
                    Segment::Skip,
                    format!("Score {score} with provider {provider} did not match any segment rule"),
                )
            }
        }
    }

    /// Score a domain end to end: defensive domain validation, hard-fail
    /// gate, score calculation, segment determination.
    pub fn score_domain(
        &self,
        domain: &str,
        provider: &ProviderName,
        signals: &SignalsBundle,
        mx_records: Option<&[String]>,
    ) -> ScoreResult {
        if !is_valid_domain(domain) {
            return ScoreResult {
                score: 0,
                segment: Segment::Skip,
                reason: format!("Invalid domain format: {domain}"),
            };
        }

        if let Some(cached) = self.cache_get(domain, provider, signals, mx_records) {
            return cached;
        }

        let result = if let Some(description) = self.check_hard_fail(mx_records) {
            ScoreResult {
                score: 0,
                segment: Segment::Skip,
                reason: format!("Hard-fail: {description}"),
            }
        } else {
            let score = self.calculate_score(provider, signals);
            let (segment, reason) = self.determine_segment(score, provider);
            ScoreResult {
                score,
                segment,
                reason,
            }
        };

        self.cache_put(domain, provider, signals, mx_records, &result);
        result
    }

    /// Run the full classification chain for a lead: score and segment plus
    /// every derived sales-facing field, all mutually consistent.
    pub fn classify_lead(
        &self,
        domain: &str,
        provider: &ProviderName,
        signals: &SignalsBundle,
        mx_records: Option<&[String]>,
    ) -> LeadClassification {
        let scored = self.score_domain(domain, provider, signals, mx_records);

        let technical_heat = calculate_technical_heat(self.rules, scored.segment, provider);
        let commercial_segment =
            calculate_commercial_segment(self.rules, scored.segment, provider, scored.score);
        let commercial_heat =
            calculate_commercial_heat(self.rules, commercial_segment, scored.score);
        let (priority_category, priority_label) =
            calculate_priority_category(self.rules, technical_heat, commercial_heat, commercial_segment);
        let priority_score = calculate_priority_score(
            self.rules.version,
            Some(scored.segment),
            Some(scored.score),
        );

        LeadClassification {
            score: scored.score,
            segment: scored.segment,
            reason: scored.reason,
            technical_heat,
            commercial_segment,
            commercial_heat,
            priority_category,
            priority_label,
            priority_score,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_cache_ttl(&mut self, ttl: Duration) {
        self.cache_ttl = ttl;
    }

    #[cfg(test)]
    pub(crate) fn cache_len(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|cache| cache.lock().ok().map(|guard| guard.len()))
            .unwrap_or(0)
    }

    fn cache_key(
        domain: &str,
        provider: &ProviderName,
        signals: &SignalsBundle,
        mx_records: Option<&[String]>,
    ) -> String {
        let mx = match mx_records {
            Some(records) if !records.is_empty() => "present",
            _ => "missing",
        };
        format!(
            "{domain}|{provider}|mx={mx}|{}",
            signals.canonical_key()
        )
    }

    fn cache_get(
        &self,
        domain: &str,
        provider: &ProviderName,
        signals: &SignalsBundle,
        mx_records: Option<&[String]>,
    ) -> Option<ScoreResult> {
        let cache = self.cache.as_ref()?;
        let key = Self::cache_key(domain, provider, signals, mx_records);
        let mut guard = cache.lock().ok()?;
        match guard.get(&key) {
            Some(entry) if entry.cached_at.elapsed() < self.cache_ttl => {
                tracing::debug!(domain, "scoring cache hit");
                Some(entry.result.clone())
            }
            Some(_) => {
                guard.remove(&key);
                None
            }
            None => None,
        }
    }

    fn cache_put(
        &self,
        domain: &str,
        provider: &ProviderName,
        signals: &SignalsBundle,
        mx_records: Option<&[String]>,
        result: &ScoreResult,
    ) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let key = Self::cache_key(domain, provider, signals, mx_records);
        if let Ok(mut guard) = cache.lock() {
            if guard.len() >= SCORING_CACHE_MAX_ENTRIES {
                guard.retain(|_, entry| entry.cached_at.elapsed() < self.cache_ttl);
                if guard.len() >= SCORING_CACHE_MAX_ENTRIES {
                    guard.clear();
                }
            }
            guard.insert(
                key,
                CachedScore {
                    result: result.clone(),
                    cached_at: Instant::now(),
                },
            );
        }
    }
}

pub(crate) fn spf_has_excessive_includes(signals: &SignalsBundle) -> bool {
    signals
        .spf_record
        .as_deref()
        .map(|record| record.matches("include:").count() > SPF_INCLUDE_LIMIT)
        .unwrap_or(false)
}
