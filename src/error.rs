use thiserror::Error;

/// Library error type for carousel setup.
#[derive(Debug, Error)]
pub enum Error {
    /// A control declared an action the carousel does not expose.
    #[error("unknown carousel action: {0}")]
    UnknownAction(String),

    /// A selector in an actionable list could not be parsed.
    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
