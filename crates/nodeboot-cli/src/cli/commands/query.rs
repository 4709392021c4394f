//! Query command implementation.

use anyhow::{Context as _, Result};
use nodeboot::{
    BootstrapClient, BootstrapError, BootstrapRequest, BootstrapResponse, CancellationToken,
    RetryConfig,
};
use tracing::{info, warn};

use super::Context;
use crate::cli::args::QueryArgs;

/// Execute the query command.
pub async fn execute(ctx: Context, args: QueryArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = build_request(&args)?;

    let mut retry = RetryConfig::from(&ctx.config.retry);
    if let Some(max) = args.max_retries {
        retry = retry.max_retries(max);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling bootstrap");
            on_signal.cancel();
        }
    });

    let response = query_with_retry(&client, &cancel, &request, &retry).await?;

    info!(certs = response.certs.len(), "bootstrap complete");
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Run the query until it succeeds, fails hard, or the retries run out.
pub async fn query_with_retry(
    client: &BootstrapClient,
    cancel: &CancellationToken,
    request: &BootstrapRequest,
    retry: &RetryConfig,
) -> Result<BootstrapResponse> {
    let mut attempt = 0;
    loop {
        let err = match client.query_bootstrap(cancel, request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        let Some(delay) = retry.delay_for(&err, attempt) else {
            return Err(err).with_context(|| format!("bootstrap via {} failed", client.endpoint()));
        };
        warn!(
            attempt,
            error = %error_chain(&err),
            class = ?err.class(),
            delay_ms = delay.as_millis(),
            "bootstrap attempt failed, retrying"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(BootstrapError::Cancelled.into()),
            () = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}

fn build_request(args: &QueryArgs) -> Result<BootstrapRequest> {
    let mut request = BootstrapRequest::new().include_node_config(args.include_node_config);

    for spec in &args.certs {
        let (name, path) = parse_pair(spec)?;
        let public_key = std::fs::read_to_string(path)
            .with_context(|| format!("reading public key for {name} from {path}"))?;
        request = request.cert(name, public_key);
    }
    for spec in &args.keypair_ids {
        let (keyset, id) = parse_pair(spec)?;
        request = request.keypair_id(keyset, id);
    }
    Ok(request)
}

/// `err` followed by each of its causes
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Split `NAME=VALUE`, both sides non-empty.
fn parse_pair(spec: &str) -> Result<(&str, &str)> {
    match spec.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => Ok((name, value)),
        _ => anyhow::bail!("expected NAME=VALUE, got {spec:?}"),
    }
}
