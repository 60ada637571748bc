//! Versioned scoring ruleset: point tables, hard-fail rules, and the ordered
//! classification rule lists, loaded once from embedded JSON documents.
//!
//! Every classifier shares one tiny interpreter: a [`RuleCondition`] is a
//! conjunction of optional clauses evaluated against a [`RuleContext`], and
//! [`first_match`] returns the first rule whose condition holds. Rule order
//! inside a table is semantically load-bearing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::domain::{
    CommercialHeat, CommercialSegment, PriorityCategory, ProviderName, Segment, TechnicalHeat,
};

const RULES_V1: &str = include_str!("data/rules_v1.json");
const RULES_V2: &str = include_str!("data/rules_v2.json");

/// Selects which generation of the rule tables governs scoring.
///
/// The two published regression datasets disagree on whether a missing DKIM
/// record draws the extra `dkim_none` penalty and on the priority score of
/// Skip-segment leads (6 vs 7). Rather than silently picking one, both
/// behaviors ship behind a version switch; `V2` is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RulesetVersion {
    V1,
    V2,
}

impl RulesetVersion {
    /// Priority score assigned to Skip-segment leads and to any
    /// null/unrecognized segment input.
    pub fn skip_priority(&self) -> u8 {
        match self {
            RulesetVersion::V1 => 6,
            RulesetVersion::V2 => 7,
        }
    }
}

impl Default for RulesetVersion {
    fn default() -> Self {
        RulesetVersion::V2
    }
}

impl fmt::Display for RulesetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesetVersion::V1 => f.write_str("v1"),
            RulesetVersion::V2 => f.write_str("v2"),
        }
    }
}

impl TryFrom<u8> for RulesetVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RulesetVersion::V1),
            2 => Ok(RulesetVersion::V2),
            other => Err(format!("unsupported ruleset version {other}")),
        }
    }
}

impl From<RulesetVersion> for u8 {
    fn from(value: RulesetVersion) -> Self {
        match value {
            RulesetVersion::V1 => 1,
            RulesetVersion::V2 => 2,
        }
    }
}

/// Positive signal contributions keyed by the authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKey {
    Spf,
    Dkim,
    DmarcQuarantine,
    DmarcReject,
    DmarcNone,
}

/// Negative risk contributions keyed by the detected weakness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKey {
    NoSpf,
    NoDkim,
    DkimNone,
    DmarcNone,
    HostingMxWeak,
    SpfMultipleIncludes,
}

impl fmt::Display for RiskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskKey::NoSpf => "no_spf",
            RiskKey::NoDkim => "no_dkim",
            RiskKey::DkimNone => "dkim_none",
            RiskKey::DmarcNone => "dmarc_none",
            RiskKey::HostingMxWeak => "hosting_mx_weak",
            RiskKey::SpfMultipleIncludes => "spf_multiple_includes",
        };
        f.write_str(name)
    }
}

/// Signal-independent condition that forces a terminal Skip classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardFailCondition {
    MxMissing,
}

impl HardFailCondition {
    pub(crate) fn holds(&self, mx_records: Option<&[String]>) -> bool {
        match self {
            HardFailCondition::MxMissing => mx_records.map(|mx| mx.is_empty()).unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardFailRule {
    pub condition: HardFailCondition,
    pub description: String,
}

/// Conjunction of optional clauses; absent clauses are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleCondition {
    pub min_score: Option<i32>,
    pub max_score: Option<i32>,
    pub provider_in: Option<Vec<ProviderName>>,
    pub technical_segment: Option<Segment>,
    pub technical_heat: Option<TechnicalHeat>,
    pub commercial_segment: Option<CommercialSegment>,
    pub commercial_segment_in: Option<Vec<CommercialSegment>>,
    pub commercial_heat: Option<CommercialHeat>,
    pub commercial_heat_in: Option<Vec<CommercialHeat>>,
}

impl RuleCondition {
    /// True when every present clause holds against the context. A clause
    /// that names a field the context does not carry fails the rule.
    pub fn matches(&self, ctx: &RuleContext<'_>) -> bool {
        if let Some(min) = self.min_score {
            match ctx.score {
                Some(score) if score >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = self.max_score {
            match ctx.score {
                Some(score) if score <= max => {}
                _ => return false,
            }
        }
        if let Some(providers) = &self.provider_in {
            match ctx.provider {
                Some(provider) if providers.contains(provider) => {}
                _ => return false,
            }
        }
        if let Some(required) = self.technical_segment {
            if ctx.technical_segment != Some(required) {
                return false;
            }
        }
        if let Some(required) = self.technical_heat {
            if ctx.technical_heat != Some(required) {
                return false;
            }
        }
        if let Some(required) = self.commercial_segment {
            if ctx.commercial_segment != Some(required) {
                return false;
            }
        }
        if let Some(segments) = &self.commercial_segment_in {
            match ctx.commercial_segment {
                Some(segment) if segments.contains(&segment) => {}
                _ => return false,
            }
        }
        if let Some(required) = self.commercial_heat {
            if ctx.commercial_heat != Some(required) {
                return false;
            }
        }
        if let Some(heats) = &self.commercial_heat_in {
            match ctx.commercial_heat {
                Some(heat) if heats.contains(&heat) => {}
                _ => return false,
            }
        }
        true
    }

    fn is_wildcard(&self) -> bool {
        *self == RuleCondition::default()
    }
}

/// Facts a classifier exposes to the rule interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext<'a> {
    pub score: Option<i32>,
    pub provider: Option<&'a ProviderName>,
    pub technical_segment: Option<Segment>,
    pub technical_heat: Option<TechnicalHeat>,
    pub commercial_segment: Option<CommercialSegment>,
    pub commercial_heat: Option<CommercialHeat>,
}

/// One entry of an ordered rule table producing `T` on match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule<T> {
    pub result: T,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub condition: RuleCondition,
}

/// First-match-wins reducer shared by every rule-table classifier.
pub fn first_match<'a, T>(rules: &'a [Rule<T>], ctx: &RuleContext<'_>) -> Option<&'a Rule<T>> {
    rules.iter().find(|rule| rule.condition.matches(ctx))
}

/// Immutable, validated scoring configuration for one ruleset version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: RulesetVersion,
    pub base_score: i32,
    pub provider_points: BTreeMap<ProviderName, i32>,
    pub signal_points: BTreeMap<SignalKey, i32>,
    pub risk_points: BTreeMap<RiskKey, i32>,
    pub hard_fail_rules: Vec<HardFailRule>,
    pub segment_rules: Vec<Rule<Segment>>,
    pub technical_heat_rules: Vec<Rule<TechnicalHeat>>,
    pub commercial_segment_rules: Vec<Rule<CommercialSegment>>,
    pub commercial_heat_rules: Vec<Rule<CommercialHeat>>,
    pub priority_category_rules: Vec<Rule<PriorityCategory>>,
}

impl RuleSet {
    /// Load and cache the ruleset for `version`. The parsed document is
    /// validated once and kept for the process lifetime; there is no hot
    /// reload. Callers hold the returned reference explicitly instead of
    /// reaching into a global.
    pub fn load(version: RulesetVersion) -> Result<&'static RuleSet, RulesetError> {
        static V1_CACHE: OnceLock<RuleSet> = OnceLock::new();
        static V2_CACHE: OnceLock<RuleSet> = OnceLock::new();

        let (cache, raw) = match version {
            RulesetVersion::V1 => (&V1_CACHE, RULES_V1),
            RulesetVersion::V2 => (&V2_CACHE, RULES_V2),
        };

        if let Some(rules) = cache.get() {
            return Ok(rules);
        }

        let parsed = Self::parse(version, raw)?;
        Ok(cache.get_or_init(|| parsed))
    }

    pub(crate) fn parse(version: RulesetVersion, raw: &str) -> Result<RuleSet, RulesetError> {
        let rules: RuleSet =
            serde_json::from_str(raw).map_err(|source| RulesetError::Parse { version, source })?;
        rules.validate()?;
        if rules.version != version {
            return Err(RulesetError::VersionMismatch {
                expected: version,
                found: rules.version,
            });
        }
        Ok(rules)
    }

    /// Fail fast on documents that would otherwise silently default
    /// mid-request: empty tables, positive risk points, missing catch-alls.
    fn validate(&self) -> Result<(), RulesetError> {
        let version = self.version;

        if !(0..=100).contains(&self.base_score) {
            return Err(RulesetError::BaseScoreOutOfRange {
                version,
                base_score: self.base_score,
            });
        }

        for (&key, &points) in &self.risk_points {
            if points > 0 {
                return Err(RulesetError::PositiveRiskPoints {
                    version,
                    key,
                    points,
                });
            }
        }

        self.require_table("segment_rules", !self.segment_rules.is_empty())?;
        self.require_table(
            "technical_heat_rules",
            !self.technical_heat_rules.is_empty(),
        )?;
        self.require_table(
            "commercial_segment_rules",
            !self.commercial_segment_rules.is_empty(),
        )?;
        self.require_table(
            "commercial_heat_rules",
            !self.commercial_heat_rules.is_empty(),
        )?;
        self.require_table(
            "priority_category_rules",
            !self.priority_category_rules.is_empty(),
        )?;
        self.require_table("hard_fail_rules", !self.hard_fail_rules.is_empty())?;

        // The heat and category tables are expected to terminate in an
        // unconditional catch-all; the evaluators still carry a default, but
        // a table without one is a data problem worth rejecting at startup.
        for (table, has_catch_all) in [
            (
                "technical_heat_rules",
                self.technical_heat_rules
                    .iter()
                    .any(|rule| rule.condition.is_wildcard()),
            ),
            (
                "commercial_segment_rules",
                self.commercial_segment_rules
                    .iter()
                    .any(|rule| rule.condition.is_wildcard()),
            ),
            (
                "commercial_heat_rules",
                self.commercial_heat_rules
                    .iter()
                    .any(|rule| rule.condition.is_wildcard()),
            ),
            (
                "priority_category_rules",
                self.priority_category_rules
                    .iter()
                    .any(|rule| rule.condition.is_wildcard()),
            ),
        ] {
            if !has_catch_all {
                return Err(RulesetError::MissingCatchAll { version, table });
            }
        }

        Ok(())
    }

    fn require_table(&self, table: &'static str, populated: bool) -> Result<(), RulesetError> {
        if populated {
            Ok(())
        } else {
            Err(RulesetError::EmptyRuleTable {
                version: self.version,
                table,
            })
        }
    }

    pub fn provider_points(&self, provider: &ProviderName) -> i32 {
        self.provider_points.get(provider).copied().unwrap_or(0)
    }

    pub fn signal_points(&self, key: SignalKey) -> i32 {
        self.signal_points.get(&key).copied().unwrap_or(0)
    }

    /// Risk contribution for `key`, or `None` when this ruleset version does
    /// not define the penalty at all.
    pub fn risk_points(&self, key: RiskKey) -> Option<i32> {
        self.risk_points.get(&key).copied()
    }
}

/// Failure loading or validating a ruleset document. Fatal at startup; every
/// classification depends on the tables being well-formed.
#[derive(Debug)]
pub enum RulesetError {
    Parse {
        version: RulesetVersion,
        source: serde_json::Error,
    },
    VersionMismatch {
        expected: RulesetVersion,
        found: RulesetVersion,
    },
    BaseScoreOutOfRange {
        version: RulesetVersion,
        base_score: i32,
    },
    PositiveRiskPoints {
        version: RulesetVersion,
        key: RiskKey,
        points: i32,
    },
    EmptyRuleTable {
        version: RulesetVersion,
        table: &'static str,
    },
    MissingCatchAll {
        version: RulesetVersion,
        table: &'static str,
    },
}

impl fmt::Display for RulesetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesetError::Parse { version, .. } => {
                write!(f, "ruleset {version} is not valid JSON")
            }
            RulesetError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "ruleset document declares {found} but was loaded as {expected}"
                )
            }
            RulesetError::BaseScoreOutOfRange {
                version,
                base_score,
            } => {
                write!(
                    f,
                    "ruleset {version} base_score {base_score} is outside [0, 100]"
                )
            }
            RulesetError::PositiveRiskPoints {
                version,
                key,
                points,
            } => {
                write!(
                    f,
                    "ruleset {version} risk_points entry {key} must be non-positive, got {points}"
                )
            }
            RulesetError::EmptyRuleTable { version, table } => {
                write!(f, "ruleset {version} table {table} is empty")
            }
            RulesetError::MissingCatchAll { version, table } => {
                write!(f, "ruleset {version} table {table} has no catch-all rule")
            }
        }
    }
}

impl std::error::Error for RulesetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RulesetError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
