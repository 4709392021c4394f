use crate::capability::BoxError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Errors that can occur during a bootstrap exchange
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Controller endpoint URL is unusable
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Client configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Pinned CA material could not be loaded
    #[error("invalid trust anchor: {0}")]
    TrustAnchor(String),

    /// Controller is not reachable yet, retry later
    #[error("controller not ready: {0}")]
    NotReady(String),

    /// Pre-flight DNS lookup failed
    #[error("pre-flight DNS lookup failed")]
    Dns(#[source] LookupError),

    /// Connection establishment through the dialer failed
    #[error(transparent)]
    Dial(#[from] DialError),

    /// HTTP exchange failed below the protocol level
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request did not complete within the overall timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Request body could not be serialized
    #[error("failed to encode bootstrap request")]
    Encode(#[source] serde_json::Error),

    /// Authenticator failed to produce a usable token
    #[error("failed to authenticate bootstrap request")]
    Auth(#[source] BoxError),

    /// Controller answered with a non-200 status
    #[error("bootstrap returned status code {code}: {detail}")]
    Status {
        /// HTTP status code
        code: u16,
        /// First line of the response body
        detail: String,
    },

    /// Response body did not match the expected schema
    #[error("failed to decode bootstrap response")]
    Decode(#[source] serde_json::Error),

    /// Caller cancelled the exchange
    #[error("bootstrap cancelled")]
    Cancelled,
}

/// Coarse classification of a [`BootstrapError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Caller misconfiguration; permanent
    Input,
    /// Infrastructure exists but is not reachable yet
    NotReady,
    /// Name resolution failed
    Resolution,
    /// Could not connect or complete the HTTP exchange
    Connectivity,
    /// Credential generation failed; permanent
    Authentication,
    /// Controller rejected the request
    Protocol,
    /// Response schema mismatch; permanent
    Decode,
    /// Caller cancelled
    Cancelled,
}

impl BootstrapError {
    /// Classify this error
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidEndpoint(_)
            | Self::Config(_)
            | Self::TrustAnchor(_)
            | Self::Encode(_) => ErrorClass::Input,
            Self::NotReady(_) => ErrorClass::NotReady,
            Self::Dns(_) => ErrorClass::Resolution,
            Self::Dial(dial) => dial.class(),
            Self::Http(_) | Self::Timeout(_) => ErrorClass::Connectivity,
            Self::Auth(_) => ErrorClass::Authentication,
            Self::Status { .. } => ErrorClass::Protocol,
            Self::Decode(_) => ErrorClass::Decode,
            Self::Cancelled => ErrorClass::Cancelled,
        }
    }

    /// Returns true if the controller is simply not reachable yet
    #[must_use]
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }

    /// Returns true if retrying later may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::NotReady | ErrorClass::Resolution | ErrorClass::Connectivity
        )
    }

    /// Returns the HTTP status code if the controller rejected the request
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Errors from the candidate dialer.
///
/// Cloneable so a failure can be recovered intact from the HTTP client's
/// error chain.
#[derive(Error, Debug, Clone)]
pub enum DialError {
    /// Target was not in `host:port` form
    #[error("cannot split host and port from {target:?}: {reason}")]
    InvalidTarget {
        /// Target as given
        target: String,
        /// What was wrong with it
        reason: String,
    },

    /// Bound resolver failed
    #[error("failed to resolve {host:?}")]
    Resolve {
        /// Host being resolved
        host: String,
        /// Error returned by the resolver
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Resolver returned no candidates
    #[error("no addresses for {target:?}")]
    NoAddresses {
        /// Target being dialed
        target: String,
    },

    /// Every candidate failed; carries the first candidate's failure
    #[error("failed to dial {addr}")]
    Connect {
        /// Candidate address
        addr: SocketAddr,
        /// Underlying connect error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// System dialing of the target failed
    #[error("failed to dial {target}")]
    Unreachable {
        /// Target being dialed
        target: String,
        /// Underlying connect error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// TLS handshake with the controller failed
    #[error("TLS handshake with {server_name} failed")]
    Handshake {
        /// Name verified against the pinned CA set
        server_name: String,
        /// Underlying handshake error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl DialError {
    /// Classify this error
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidTarget { .. } => ErrorClass::Input,
            Self::Resolve { .. } => ErrorClass::Resolution,
            Self::NoAddresses { .. }
            | Self::Connect { .. }
            | Self::Unreachable { .. }
            | Self::Handshake { .. } => ErrorClass::Connectivity,
        }
    }
}

/// Errors from a [`HostLookup`](crate::HostLookup)
#[derive(Error, Debug)]
pub enum LookupError {
    /// Name does not exist or has no address records
    #[error("host {host:?} not found: {message}")]
    NotFound {
        /// Host looked up
        host: String,
        /// Resolver diagnostic
        message: String,
    },

    /// Any other lookup failure
    #[error("lookup of {host:?} failed: {message}")]
    Failed {
        /// Host looked up
        host: String,
        /// Resolver diagnostic
        message: String,
    },
}

impl LookupError {
    /// Returns true if the name was not found
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
