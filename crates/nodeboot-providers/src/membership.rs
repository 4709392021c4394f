//! Membership-backed resolver for gossip clusters.
//!
//! Holds the latest view of cluster members published by a gossip layer
//! (or a static seed list) and answers lookups from it without touching DNS.

use crate::error::ProviderError;
use async_trait::async_trait;
use nodeboot_core::{BoxError, Resolver};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// [`Resolver`] answering from a shared, updatable membership view
#[derive(Default)]
pub struct MembershipResolver {
    members: RwLock<HashMap<String, Vec<IpAddr>>>,
}

impl MembershipResolver {
    /// Create an empty view
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the addresses known for `host`
    pub fn update(&self, host: impl Into<String>, addresses: Vec<IpAddr>) {
        let host = host.into();
        debug!(%host, ?addresses, "membership updated");
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host, addresses);
    }

    /// Forget `host`
    pub fn remove(&self, host: &str) {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(host);
    }

    /// Addresses currently known for `host`
    pub fn lookup(&self, host: &str) -> Option<Vec<IpAddr>> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .cloned()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<IpAddr>)> for MembershipResolver {
    fn from_iter<I: IntoIterator<Item = (S, Vec<IpAddr>)>>(iter: I) -> Self {
        let members = iter.into_iter().map(|(host, ips)| (host.into(), ips)).collect();
        Self {
            members: RwLock::new(members),
        }
    }
}

#[async_trait]
impl Resolver for MembershipResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, BoxError> {
        self.lookup(host)
            .ok_or_else(|| ProviderError::UnknownHost(host.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_in_published_order() {
        let resolver: MembershipResolver = [(
            "api.internal.cluster",
            vec!["10.0.0.2".parse().unwrap(), "10.0.0.1".parse().unwrap()],
        )]
        .into_iter()
        .collect();

        let addresses = resolver.resolve("api.internal.cluster").await.unwrap();
        assert_eq!(
            addresses,
            vec![
                "10.0.0.2".parse::<IpAddr>().unwrap(),
                "10.0.0.1".parse::<IpAddr>().unwrap()
            ]
        );
    }

    #[tokio::test]
    async fn test_updates_are_visible() {
        let resolver = MembershipResolver::new();
        assert!(resolver.resolve("controller").await.is_err());

        resolver.update("controller", vec!["10.0.0.7".parse().unwrap()]);
        assert_eq!(resolver.resolve("controller").await.unwrap().len(), 1);

        resolver.remove("controller");
        let err = resolver.resolve("controller").await.unwrap_err();
        assert_eq!(err.to_string(), "unknown host: controller");
    }
}
