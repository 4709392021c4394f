//! Capability contracts injected into a bootstrap client.

use crate::error::LookupError;
use async_trait::async_trait;
use std::net::IpAddr;

/// Boxed error returned by capability implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Maps a hostname to candidate addresses without relying on ordinary DNS.
///
/// Implementations back the dialer whenever a resolver is bound to a client,
/// for example a membership view fed by gossip. The returned order is the
/// order in which candidates are dialed.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `host` into an ordered list of candidate addresses
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, BoxError>;
}

/// Standard DNS lookup used for the pre-flight sanity check.
///
/// Only consulted when no [`Resolver`] is bound.
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Look up all addresses of `host`
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, LookupError>;
}

/// Produces the credential attached to a bootstrap request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Create a token over the exact request body bytes.
    ///
    /// The token is sent verbatim in the `Authorization` header.
    async fn create_token(&self, body: &[u8]) -> Result<String, BoxError>;
}
