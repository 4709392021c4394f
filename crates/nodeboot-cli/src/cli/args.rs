//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bootstrap agent for cluster nodes
///
/// Requests certificates and node configuration from the cluster
/// controller, trusting only the pinned CA bundle.
#[derive(Parser, Debug)]
#[command(name = "nodeboot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "NODEBOOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Controller endpoint, e.g. https://controller.internal:3988
    #[arg(short, long, env = "NODEBOOT_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// PEM bundle of CAs trusted for the controller
    #[arg(long, env = "NODEBOOT_CA_FILE", global = true)]
    pub ca_file: Option<PathBuf>,

    /// Authorization token presented to the controller
    #[arg(long, env = "NODEBOOT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query the controller's bootstrap endpoint
    Query(QueryArgs),

    /// Show the addresses the configured resolver returns for a host
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Public key to certify, as NAME=PATH (repeatable)
    #[arg(long = "cert", value_name = "NAME=PATH")]
    pub certs: Vec<String>,

    /// Keypair id per keyset, as KEYSET=ID (repeatable)
    #[arg(long = "keypair-id", value_name = "KEYSET=ID")]
    pub keypair_ids: Vec<String>,

    /// Ask the controller for the node configuration too
    #[arg(long)]
    pub include_node_config: bool,

    /// Override the configured retry limit
    #[arg(long)]
    pub max_retries: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Host name to resolve
    pub host: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query() {
        let cli = Cli::try_parse_from([
            "nodeboot",
            "--endpoint",
            "https://controller:3988",
            "query",
            "--cert",
            "kubelet=/etc/keys/kubelet.pub",
            "--cert",
            "proxy=/etc/keys/proxy.pub",
            "--include-node-config",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("https://controller:3988"));
        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.certs.len(), 2);
        assert!(args.include_node_config);
        assert_eq!(args.max_retries, None);
    }
}
