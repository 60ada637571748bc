use std::env;
use std::fmt;

use crate::leads::RulesetVersion;

/// Top-level settings for embedding the engine in a host process. The log
/// level feeds `telemetry::init`.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub ruleset_version: RulesetVersion,
    pub log_level: String,
}

impl EngineSettings {
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let ruleset_version = match env::var("HUNTER_RULESET_VERSION") {
            Ok(value) => parse_ruleset_version(&value)?,
            Err(_) => RulesetVersion::default(),
        };

        let log_level = env::var("HUNTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            ruleset_version,
            log_level,
        })
    }
}

fn parse_ruleset_version(value: &str) -> Result<RulesetVersion, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "v1" => Ok(RulesetVersion::V1),
        "2" | "v2" => Ok(RulesetVersion::V2),
        _ => Err(SettingsError::InvalidRulesetVersion {
            value: value.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum SettingsError {
    InvalidRulesetVersion { value: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::InvalidRulesetVersion { value } => {
                write!(
                    f,
                    "HUNTER_RULESET_VERSION must be one of 1, 2, v1, v2; got '{value}'"
                )
            }
        }
    }
}

impl std::error::Error for SettingsError {}
