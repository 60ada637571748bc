use crate::config::SettingsError;
use crate::leads::{RegistryError, RulesetError};
use crate::telemetry::TelemetryError;

/// Error raised while bootstrapping the engine. All of these are fatal at
/// startup: nothing downstream can classify without the rule tables and the
/// provider registry.
#[derive(Debug, thiserror::Error)]
pub enum HunterError {
    #[error(transparent)]
    Ruleset(#[from] RulesetError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}
