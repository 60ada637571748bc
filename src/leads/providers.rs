//! Provider registry and MX-root fingerprinting.
//!
//! The registry is an ordered list of providers with the MX root domains they
//! are known to operate. Classification walks the registry in order and the
//! first provider with a matching root wins, so registry order is part of the
//! contract.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::domain::{ProviderName, TenantSize};

const PROVIDERS_JSON: &str = include_str!("data/providers.json");

/// How long a classification result stays cached per MX root.
pub const PROVIDER_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound on cached classifications. Hitting it drops expired entries
/// first, then the whole map if every entry is still fresh.
pub(crate) const PROVIDER_CACHE_MAX_ENTRIES: usize = 4096;

/// One registry entry: a provider and the MX roots it operates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub name: ProviderName,
    pub mx_roots: Vec<String>,
}

/// Substring pattern mapping a self-hosted MX root to a local hosting brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalProviderPattern {
    pub contains: String,
    pub label: String,
}

/// Static provider registry, loaded once from the embedded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRegistry {
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub local_providers: Vec<LocalProviderPattern>,
}

impl ProviderRegistry {
    pub fn load() -> Result<&'static ProviderRegistry, RegistryError> {
        static CACHE: OnceLock<ProviderRegistry> = OnceLock::new();

        if let Some(registry) = CACHE.get() {
            return Ok(registry);
        }

        let parsed = Self::parse(PROVIDERS_JSON)?;
        Ok(CACHE.get_or_init(|| parsed))
    }

    pub(crate) fn parse(raw: &str) -> Result<ProviderRegistry, RegistryError> {
        let registry: ProviderRegistry =
            serde_json::from_str(raw).map_err(|source| RegistryError::Parse { source })?;
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.providers.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }
        for entry in &self.providers {
            if entry.mx_roots.is_empty() {
                return Err(RegistryError::EmptyRoots {
                    provider: entry.name.clone(),
                });
            }
            for root in &entry.mx_roots {
                if root.trim().is_empty() || *root != root.to_lowercase() {
                    return Err(RegistryError::MalformedRoot {
                        provider: entry.name.clone(),
                        root: root.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Failure loading or validating the provider registry. Fatal at startup.
#[derive(Debug)]
pub enum RegistryError {
    Parse { source: serde_json::Error },
    EmptyRegistry,
    EmptyRoots { provider: ProviderName },
    MalformedRoot { provider: ProviderName, root: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Parse { .. } => write!(f, "provider registry is not valid JSON"),
            RegistryError::EmptyRegistry => write!(f, "provider registry lists no providers"),
            RegistryError::EmptyRoots { provider } => {
                write!(f, "provider {provider} lists no MX roots")
            }
            RegistryError::MalformedRoot { provider, root } => {
                write!(
                    f,
                    "provider {provider} MX root '{root}' must be non-empty lowercase"
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Parse { source } => Some(source),
            _ => None,
        }
    }
}

struct CachedProvider {
    provider: ProviderName,
    cached_at: Instant,
}

/// Classifies MX roots against the registry, memoizing results per root.
///
/// The cache is purely a performance optimization: a hit must return exactly
/// what an uncached classification would.
pub struct ProviderClassifier {
    registry: &'static ProviderRegistry,
    cache: Mutex<HashMap<String, CachedProvider>>,
    cache_ttl: Duration,
}

impl ProviderClassifier {
    pub fn new(registry: &'static ProviderRegistry) -> Self {
        Self {
            registry,
            cache: Mutex::new(HashMap::new()),
            cache_ttl: PROVIDER_CACHE_TTL,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.registry
    }

    /// Classify the provider operating `mx_root`.
    ///
    /// `None` or empty input means the domain had no MX at all and yields
    /// `Unknown`. A root matching no registry entry yields `Local`: the
    /// domain does receive mail, just not through anything we recognize, so
    /// it is presumed self-hosted.
    pub fn classify(&self, mx_root: Option<&str>) -> ProviderName {
        let normalized = match mx_root.map(|root| root.trim().to_lowercase()) {
            Some(root) if !root.is_empty() => root,
            _ => return ProviderName::unknown(),
        };

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(entry) = cache.get(&normalized) {
                if entry.cached_at.elapsed() < self.cache_ttl {
                    tracing::debug!(mx_root = %normalized, provider = %entry.provider, "provider cache hit");
                    return entry.provider.clone();
                }
                cache.remove(&normalized);
            }
        }

        let provider = classify_root(self.registry, &normalized);

        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() >= PROVIDER_CACHE_MAX_ENTRIES {
                cache.retain(|_, entry| entry.cached_at.elapsed() < self.cache_ttl);
                if cache.len() >= PROVIDER_CACHE_MAX_ENTRIES {
                    cache.clear();
                }
            }
            cache.insert(
                normalized,
                CachedProvider {
                    provider: provider.clone(),
                    cached_at: Instant::now(),
                },
            );
        }

        provider
    }

    #[cfg(test)]
    pub(crate) fn set_cache_ttl(&mut self, ttl: Duration) {
        self.cache_ttl = ttl;
    }

    #[cfg(test)]
    pub(crate) fn cache_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Map a self-hosted MX root to a known local-hosting brand by substring
    /// match. Best effort: `None` when nothing matches.
    pub fn classify_local_provider(&self, mx_root: &str) -> Option<&str> {
        let normalized = mx_root.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.registry
            .local_providers
            .iter()
            .find(|pattern| normalized.contains(&pattern.contains))
            .map(|pattern| pattern.label.as_str())
    }

    /// Guess the tenant size behind `mx_root` using provider-specific
    /// hostname heuristics. Only M365 and Google expose a usable pattern;
    /// every other provider yields `None`.
    pub fn estimate_tenant_size(
        &self,
        provider: &ProviderName,
        mx_root: &str,
    ) -> Option<TenantSize> {
        let normalized = mx_root.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        match provider.as_str() {
            "M365" => estimate_m365_tenant_size(&normalized),
            "Google" => estimate_google_tenant_size(&normalized),
            _ => None,
        }
    }
}

/// Uncached registry walk. Match strategies per root, in combined priority:
/// exact, subdomain suffix, embedded root.
pub(crate) fn classify_root(registry: &ProviderRegistry, mx_root: &str) -> ProviderName {
    for entry in &registry.providers {
        for root in &entry.mx_roots {
            if mx_root == root {
                return entry.name.clone();
            }
            if mx_root.ends_with(&format!(".{root}")) {
                return entry.name.clone();
            }
            if mx_root.contains(&format!(".{root}")) || mx_root.starts_with(&format!("{root}.")) {
                return entry.name.clone();
            }
        }
    }
    ProviderName::local()
}

fn m365_tenant_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-z0-9-]+)\.mail\.protection\.outlook\.com$").expect("valid regex")
    })
}

fn estimate_m365_tenant_size(mx_root: &str) -> Option<TenantSize> {
    // Tenant-routed hostnames ("contoso-com.mail.protection.outlook.com")
    // carry the tenant slug; sharded slugs with digits or very long slugs
    // indicate consolidated multi-domain tenants.
    let captures = m365_tenant_regex().captures(mx_root)?;
    let slug = captures.get(1)?.as_str();
    if slug.chars().any(|c| c.is_ascii_digit()) || slug.len() > 24 {
        Some(TenantSize::Large)
    } else {
        Some(TenantSize::Medium)
    }
}

fn estimate_google_tenant_size(mx_root: &str) -> Option<TenantSize> {
    // Legacy googlemail.com MX setups date back to self-service signups;
    // current google.com routing is the Workspace default.
    if mx_root.ends_with("googlemail.com") {
        Some(TenantSize::Small)
    } else if mx_root.ends_with("google.com") {
        Some(TenantSize::Medium)
    } else {
        None
    }
}
