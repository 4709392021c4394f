//! # nodeboot-cli
//!
//! Command-line bootstrap agent for cluster nodes.
//!
//! ## Features
//!
//! - **Bootstrap queries**: request certificates and node configuration from the controller
//! - **Pluggable resolution**: system DNS, a dedicated DNS resolver, or a static member list
//! - **Retry policy**: distinct backoff while the controller is not ready yet

pub mod cli;
pub mod config;

pub use cli::run;
