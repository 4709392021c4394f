use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API version sent with every [`BootstrapRequest`]
pub const BOOTSTRAP_API_VERSION: &str = "bootstrap.nodeboot.io/v1alpha1";

/// Request sent by a node to obtain its initial credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    /// Protocol version of this request
    pub api_version: String,

    /// Public keys to certify, keyed by certificate name
    #[serde(default)]
    pub certs: BTreeMap<String, String>,

    /// Keypair IDs the node already holds, keyed by keyset name
    #[serde(default)]
    pub keypair_ids: BTreeMap<String, String>,

    /// Ask the controller to include the node configuration
    #[serde(default)]
    pub include_node_config: bool,
}

impl Default for BootstrapRequest {
    fn default() -> Self {
        Self {
            api_version: BOOTSTRAP_API_VERSION.to_string(),
            certs: BTreeMap::new(),
            keypair_ids: BTreeMap::new(),
            include_node_config: false,
        }
    }
}

impl BootstrapRequest {
    /// Create an empty request for the current API version
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a certificate for the given public key
    #[must_use]
    pub fn cert(mut self, name: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        self.certs.insert(name.into(), public_key_pem.into());
        self
    }

    /// Record a keypair ID the node already trusts
    #[must_use]
    pub fn keypair_id(mut self, keyset: impl Into<String>, id: impl Into<String>) -> Self {
        self.keypair_ids.insert(keyset.into(), id.into());
        self
    }

    /// Ask for the node configuration in the response
    #[must_use]
    pub const fn include_node_config(mut self, include: bool) -> Self {
        self.include_node_config = include;
        self
    }
}

/// Controller answer to a successful [`BootstrapRequest`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResponse {
    /// Signed certificates, keyed by certificate name
    #[serde(default)]
    pub certs: BTreeMap<String, String>,

    /// Node configuration, if it was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_config: Option<serde_json::Value>,
}
