//! Bootstrap protocol client for nodeboot.
//!
//! This crate provides [`BootstrapClient`], which obtains a node's initial
//! credentials from the controller over TLS pinned to the cluster CA. When a
//! [`Resolver`](nodeboot_core::Resolver) is bound, connections go through
//! the candidate [`Dialer`] instead of system DNS.

#![doc(html_root_url = "https://docs.rs/nodeboot-client/0.3.0")]

mod client;
mod config;
mod dialer;
mod lookup;
mod transport;

pub use client::{BootstrapClient, BootstrapClientBuilder};
pub use config::*;
pub use dialer::Dialer;
pub use lookup::SystemLookup;
pub use nodeboot_core::{BootstrapError, Result};
pub use tokio_util::sync::CancellationToken;
