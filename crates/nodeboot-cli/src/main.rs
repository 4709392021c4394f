//! nodeboot - cluster node bootstrap agent
//!
//! Obtains a node's initial credentials from the controller.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    nodeboot_cli::run().await
}
