//! Trust-bootstrap client for cluster nodes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use nodeboot::providers::{MembershipResolver, StaticTokenAuthenticator};
//! use nodeboot::{BootstrapClient, BootstrapRequest, BootstrapResponse, CancellationToken};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> nodeboot::Result<()> {
//!     let members = MembershipResolver::new();
//!     members.update("controller.internal", vec!["10.0.0.10".parse().unwrap()]);
//!
//!     let client = BootstrapClient::builder(
//!         "https://controller.internal:3988",
//!         std::fs::read("/etc/nodeboot/ca.pem").unwrap(),
//!         Arc::new(StaticTokenAuthenticator::new("Bearer s3cr3t").unwrap()),
//!     )
//!     .resolver(Arc::new(members))
//!     .build()?;
//!
//!     let request = BootstrapRequest::new().include_node_config(true);
//!     let response: BootstrapResponse = client
//!         .query_bootstrap(&CancellationToken::new(), &request)
//!         .await?;
//!
//!     println!("received {} certificates", response.certs.len());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Includes the providers
//! - `providers` - Membership and DNS resolvers, static token authenticator

#![doc(html_root_url = "https://docs.rs/nodeboot/0.3.0")]

// Re-export core types
pub use nodeboot_core::*;

// Re-export client
pub use nodeboot_client::{
    BootstrapClient, BootstrapClientBuilder, CancellationToken, Dialer, RetryConfig, SystemLookup,
};

// Re-export providers if enabled
#[cfg(feature = "providers")]
pub use nodeboot_providers as providers;

// Re-export runtime for convenience
pub use tokio;
pub use serde;
pub use serde_json;
