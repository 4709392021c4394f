//! Resolve command implementation.

use anyhow::Result;
use nodeboot::{HostLookup, SystemLookup};
use std::net::IpAddr;

use super::Context;
use crate::cli::args::ResolveArgs;

/// Execute the resolve command.
pub async fn execute(ctx: Context, args: ResolveArgs) -> Result<()> {
    let addresses: Vec<IpAddr> = match ctx.resolver()? {
        Some(resolver) => resolver
            .resolve(&args.host)
            .await
            .map_err(|e| anyhow::anyhow!("resolving {}: {e}", args.host))?,
        None => SystemLookup::new().lookup_ip(&args.host).await?,
    };

    if addresses.is_empty() {
        anyhow::bail!("no addresses for {}", args.host);
    }
    for address in addresses {
        let note = if nodeboot::is_placeholder(address) {
            "  (placeholder)"
        } else {
            ""
        };
        println!("{address}{note}");
    }
    Ok(())
}
