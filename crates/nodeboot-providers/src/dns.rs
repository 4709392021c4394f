//! DNS-backed resolver.

use crate::error::ProviderError;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use nodeboot_core::{BoxError, Resolver};
use std::net::IpAddr;
use tracing::debug;

/// [`Resolver`] that answers from DNS.
///
/// Useful when the controller name is published in DNS but the host's own
/// resolver should not be trusted, e.g. to query the cluster's name servers
/// directly.
pub struct DnsResolver {
    resolver: TokioResolver,
}

impl DnsResolver {
    /// Create a resolver using the system configuration
    pub fn from_system_conf() -> Result<Self, ProviderError> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| ProviderError::Dns(e.to_string()))?
            .build();
        Ok(Self { resolver })
    }

    /// Create a resolver with explicit configuration
    #[must_use]
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();
        Self { resolver }
    }
}

#[async_trait]
impl Resolver for DnsResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, BoxError> {
        let response = self.resolver.lookup_ip(host).await?;
        let addresses: Vec<IpAddr> = response.iter().collect();
        debug!(host, ?addresses, "DNS lookup");
        Ok(addresses)
    }
}
