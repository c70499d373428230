use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    MissingDefaultEnvelope,
    UnknownEnvelope,
    DuplicateCandidate,
    UnknownCandidate,
    EmptyStrategyChain,
    InvalidValue,
}

/// Raised only while assembling the engine from configuration. The admission
/// path itself never returns an error: every per-task outcome is a `Decision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

pub fn missing_default_envelope() -> ConfigError {
    ConfigError::new(
        ConfigErrorKind::MissingDefaultEnvelope,
        "engine requires a default decision envelope",
    )
}

pub fn unknown_envelope(id: impl AsRef<str>) -> ConfigError {
    ConfigError::new(
        ConfigErrorKind::UnknownEnvelope,
        format!("default_envelope '{}' is not declared", id.as_ref()),
    )
}

pub fn duplicate_candidate(id: impl AsRef<str>) -> ConfigError {
    ConfigError::new(
        ConfigErrorKind::DuplicateCandidate,
        format!("duplicate candidate id '{}' in registry", id.as_ref()),
    )
}

pub fn unknown_candidate(id: impl AsRef<str>) -> ConfigError {
    ConfigError::new(
        ConfigErrorKind::UnknownCandidate,
        format!("candidate id '{}' does not exist in the registry", id.as_ref()),
    )
}

pub fn empty_strategy_chain() -> ConfigError {
    ConfigError::new(
        ConfigErrorKind::EmptyStrategyChain,
        "strategy chain must contain at least one strategy",
    )
}

pub fn invalid_value(message: impl Into<String>) -> ConfigError {
    ConfigError::new(ConfigErrorKind::InvalidValue, message)
}
