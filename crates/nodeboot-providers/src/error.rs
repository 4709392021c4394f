use thiserror::Error;

/// Result type alias for provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors from resolver and authenticator providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Host is not part of the known membership
    #[error("unknown host: {0}")]
    UnknownHost(String),

    /// DNS resolution error
    #[error("DNS error: {0}")]
    Dns(String),

    /// Token material is missing or unusable
    #[error("token error: {0}")]
    Token(String),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
