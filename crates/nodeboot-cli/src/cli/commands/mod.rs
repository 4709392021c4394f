//! Command implementations.

pub mod query;
pub mod resolve;

use anyhow::{Context as _, Result};
use nodeboot::providers::{DnsResolver, MembershipResolver, StaticTokenAuthenticator};
use nodeboot::{Authenticator, BootstrapClient, Resolver};
use std::sync::Arc;

use crate::config::{Config, ResolverMode};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Settings merged from the config file and flags
    pub config: Config,
}

impl Context {
    /// Get the endpoint, returning an error if not set.
    pub fn require_endpoint(&self) -> Result<&str> {
        self.config.endpoint.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "controller endpoint required.\n\n\
                 Set it with one of:\n  \
                 1. --endpoint <URL>\n  \
                 2. NODEBOOT_ENDPOINT environment variable\n  \
                 3. `endpoint` in the config file"
            )
        })
    }

    /// Read the pinned CA bundle.
    pub fn ca_pem(&self) -> Result<Vec<u8>> {
        let path = self
            .config
            .ca_file
            .as_deref()
            .context("CA bundle required (--ca-file or `ca_file` in the config file)")?;
        std::fs::read(path).with_context(|| format!("reading CA bundle {}", path.display()))
    }

    /// Build the authenticator from the token or token file.
    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        let auth = match (&self.config.token, &self.config.token_file) {
            (Some(token), _) => StaticTokenAuthenticator::new(token.as_str())?,
            (None, Some(path)) => StaticTokenAuthenticator::from_file(path)
                .with_context(|| format!("reading token {}", path.display()))?,
            (None, None) => anyhow::bail!(
                "authorization token required (--token, NODEBOOT_TOKEN, `token` or `token_file`)"
            ),
        };
        Ok(Arc::new(auth))
    }

    /// Resolver bound to the dialer, or `None` for system resolution.
    pub fn resolver(&self) -> Result<Option<Arc<dyn Resolver>>> {
        let settings = &self.config.resolver;
        let resolver: Arc<dyn Resolver> = match settings.mode {
            ResolverMode::System => return Ok(None),
            ResolverMode::Dns => Arc::new(DnsResolver::from_system_conf()?),
            ResolverMode::Static => Arc::new(
                settings
                    .hosts
                    .clone()
                    .into_iter()
                    .collect::<MembershipResolver>(),
            ),
        };
        Ok(Some(resolver))
    }

    /// Create a bootstrap client from the merged settings.
    pub fn client(&self) -> Result<BootstrapClient> {
        let mut builder =
            BootstrapClient::builder(self.require_endpoint()?, self.ca_pem()?, self.authenticator()?);
        if let Some(resolver) = self.resolver()? {
            builder = builder.resolver(resolver);
        }
        Ok(builder.build()?)
    }
}
