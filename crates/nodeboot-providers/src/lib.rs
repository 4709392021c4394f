//! Resolver and authenticator implementations for nodeboot.
//!
//! This crate provides ready-made capabilities to inject into a
//! `BootstrapClient`.

#![doc(html_root_url = "https://docs.rs/nodeboot-providers/0.3.0")]

mod error;

#[cfg(feature = "dns")]
pub mod dns;

pub mod membership;
pub mod token;

pub use error::{ProviderError, ProviderResult};
pub use membership::MembershipResolver;
pub use token::StaticTokenAuthenticator;

#[cfg(feature = "dns")]
pub use dns::DnsResolver;
