use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a mail provider as listed in the provider registry.
///
/// The registry is data-driven, so this is a case-sensitive name rather than
/// a closed enum. `Unknown` and `Local` are reserved sentinels: `Unknown`
/// means the caller had no MX root at all, `Local` means the MX root matched
/// no registry entry and the domain is presumed self-hosted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderName(pub String);

impl ProviderName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn unknown() -> Self {
        Self("Unknown".to_string())
    }

    pub fn local() -> Self {
        Self("Local".to_string())
    }

    pub fn hosting() -> Self {
        Self("Hosting".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Published DMARC policy, parsed case-insensitively from the record's `p=` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmarcPolicy {
    None,
    Quarantine,
    Reject,
}

impl DmarcPolicy {
    /// Parse a raw policy string. Unrecognized values are treated as if no
    /// DMARC record were published at all.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "quarantine" => Some(Self::Quarantine),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// DNS-derived authentication signals for a single domain, resolved upstream.
///
/// `spf_record` carries the raw SPF TXT payload when the resolver captured
/// it; it is only consulted for the multiple-includes risk heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalsBundle {
    pub spf: bool,
    pub dkim: bool,
    #[serde(default)]
    pub dmarc_policy: Option<DmarcPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spf_record: Option<String>,
}

impl SignalsBundle {
    /// Canonical encoding with a fixed field order, so equivalent bundles
    /// always produce the same cache key regardless of construction order.
    pub(crate) fn canonical_key(&self) -> String {
        let dmarc = match self.dmarc_policy {
            Some(DmarcPolicy::None) => "none",
            Some(DmarcPolicy::Quarantine) => "quarantine",
            Some(DmarcPolicy::Reject) => "reject",
            None => "-",
        };
        format!(
            "dkim={};dmarc={};spf={};spf_record={}",
            self.dkim,
            dmarc,
            self.spf,
            self.spf_record.as_deref().unwrap_or("-"),
        )
    }
}

/// Coarse technical bucket derived from score and provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Migration,
    Existing,
    Cold,
    Skip,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Migration => "Migration",
            Segment::Existing => "Existing",
            Segment::Cold => "Cold",
            Segment::Skip => "Skip",
        };
        f.write_str(name)
    }
}

/// Infrastructure-level urgency derived from the technical segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TechnicalHeat {
    Hot,
    Warm,
    Cold,
}

impl fmt::Display for TechnicalHeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TechnicalHeat::Hot => "Hot",
            TechnicalHeat::Warm => "Warm",
            TechnicalHeat::Cold => "Cold",
        };
        f.write_str(name)
    }
}

/// Business-motive classification layered on top of the technical segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommercialSegment {
    Greenfield,
    Competitive,
    WeakPartner,
    Renewal,
    LowIntent,
    NoGo,
}

impl fmt::Display for CommercialSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommercialSegment::Greenfield => "GREENFIELD",
            CommercialSegment::Competitive => "COMPETITIVE",
            CommercialSegment::WeakPartner => "WEAK_PARTNER",
            CommercialSegment::Renewal => "RENEWAL",
            CommercialSegment::LowIntent => "LOW_INTENT",
            CommercialSegment::NoGo => "NO_GO",
        };
        f.write_str(name)
    }
}

/// Commercial urgency for outreach cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommercialHeat {
    High,
    Medium,
    Low,
}

impl fmt::Display for CommercialHeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommercialHeat::High => "HIGH",
            CommercialHeat::Medium => "MEDIUM",
            CommercialHeat::Low => "LOW",
        };
        f.write_str(name)
    }
}

/// Combined technical + commercial urgency bucket used for sales triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityCategory {
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
}

impl PriorityCategory {
    /// Canonical human-readable label for the category.
    pub fn label(&self) -> &'static str {
        match self {
            PriorityCategory::P1 => "High Potential Greenfield",
            PriorityCategory::P2 => "Competitive Takeover",
            PriorityCategory::P3 => "Existing Microsoft but Weak Partner",
            PriorityCategory::P4 => "Renewal Pressure",
            PriorityCategory::P5 => "Low Intent / Long Nurturing",
            PriorityCategory::P6 => "No-Go / Archive",
        }
    }
}

impl fmt::Display for PriorityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriorityCategory::P1 => "P1",
            PriorityCategory::P2 => "P2",
            PriorityCategory::P3 => "P3",
            PriorityCategory::P4 => "P4",
            PriorityCategory::P5 => "P5",
            PriorityCategory::P6 => "P6",
        };
        f.write_str(name)
    }
}

/// Rough tenant-size estimate derived from MX hostname patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantSize {
    Small,
    Medium,
    Large,
}

/// Outcome of the score-and-segment pipeline for a single domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: i32,
    pub segment: Segment,
    pub reason: String,
}

/// Full derived classification chain for a lead, recomputed on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadClassification {
    pub score: i32,
    pub segment: Segment,
    pub reason: String,
    pub technical_heat: TechnicalHeat,
    pub commercial_segment: CommercialSegment,
    pub commercial_heat: CommercialHeat,
    pub priority_category: PriorityCategory,
    pub priority_label: String,
    pub priority_score: u8,
}

/// Defensive re-validation of a domain string. Upstream normalizers are
/// expected to hand the engine clean domains; anything failing this check is
/// scored as an automatic Skip rather than an error so that a bad row never
/// aborts a scanning batch.
pub(crate) fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.trim();
    if domain.is_empty() {
        return false;
    }

    const JUNK_VALUES: [&str; 9] = [
        "nan", "n/a", "na", "none", "null", "website", "web", "http", "https",
    ];
    let lowered = domain.to_ascii_lowercase();
    if JUNK_VALUES.contains(&lowered.as_str()) {
        return false;
    }

    if domain.contains("://") || domain.contains(char::is_whitespace) {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return false;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }
    }

    labels
        .last()
        .map(|tld| tld.len() >= 2)
        .unwrap_or(false)
}
