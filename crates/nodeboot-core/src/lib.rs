//! Core types and traits for the nodeboot bootstrap client.
//!
//! This crate provides the foundational pieces shared across the nodeboot workspace:
//!
//! - **Capabilities**: the [`Resolver`], [`HostLookup`] and [`Authenticator`] contracts
//!   that a client is assembled from
//! - **Types**: the bootstrap wire payloads and the placeholder sentinel addresses
//! - **Errors**: classified failures with [`BootstrapError`] and [`ErrorClass`]
//!
//! # Example
//!
//! ```rust,ignore
//! use nodeboot_core::{BootstrapError, ErrorClass};
//!
//! fn should_wait(err: &BootstrapError) -> bool {
//!     err.class() == ErrorClass::NotReady
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/nodeboot-core/0.3.0")]

mod capability;
mod error;
pub mod types;

pub use capability::{Authenticator, BoxError, HostLookup, Resolver};
pub use error::{BootstrapError, DialError, ErrorClass, LookupError, Result};
pub use types::*;
