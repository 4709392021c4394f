//! System DNS lookup used for the pre-flight sanity check.

use async_trait::async_trait;
use hickory_resolver::{ResolveError, TokioResolver};
use nodeboot_core::{HostLookup, LookupError};
use std::net::IpAddr;
use tracing::warn;

/// [`HostLookup`] backed by the host's resolver configuration.
///
/// If that configuration cannot be read, every lookup fails with
/// [`LookupError::Failed`]; no other name servers are consulted.
pub struct SystemLookup {
    resolver: Result<TokioResolver, String>,
}

impl Default for SystemLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemLookup {
    /// Create a lookup from the system configuration
    #[must_use]
    pub fn new() -> Self {
        let resolver = TokioResolver::builder_tokio()
            .map(|builder| builder.build())
            .map_err(|err| {
                warn!(error = %err, "failed to read system resolver configuration");
                err.to_string()
            });
        Self { resolver }
    }

    #[cfg(test)]
    pub(crate) fn unconfigured(reason: &str) -> Self {
        Self {
            resolver: Err(reason.to_string()),
        }
    }
}

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        let resolver = self.resolver.as_ref().map_err(|reason| LookupError::Failed {
            host: host.to_string(),
            message: format!("system resolver configuration unavailable: {reason}"),
        })?;
        let response = resolver
            .lookup_ip(host)
            .await
            .map_err(|err| lookup_error(host, &err))?;
        Ok(response.iter().collect())
    }
}

fn lookup_error(host: &str, err: &ResolveError) -> LookupError {
    if err.is_nx_domain() || err.is_no_records_found() {
        LookupError::NotFound {
            host: host.to_string(),
            message: err.to_string(),
        }
    } else {
        LookupError::Failed {
            host: host.to_string(),
            message: err.to_string(),
        }
    }
}
