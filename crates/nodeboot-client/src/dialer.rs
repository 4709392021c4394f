//! Candidate dialing through a bound [`Resolver`].

use crate::config::DEFAULT_DIAL_TIMEOUT;
use nodeboot_core::{DialError, Resolver};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{info, warn};

/// Opens TCP connections to `host:port` targets using a custom resolver.
///
/// Candidates are tried strictly in the order the resolver returns them.
/// The first successful connection wins; if all of them fail, the error of
/// the first candidate is reported.
#[derive(Clone)]
pub struct Dialer {
    resolver: Arc<dyn Resolver>,
    timeout: Duration,
}

impl Dialer {
    /// Create a dialer with the default per-candidate timeout
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }

    /// Set the per-candidate connect timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect to `target`, given as `host:port`
    pub async fn dial(&self, target: &str) -> Result<TcpStream, DialError> {
        let (host, port) = split_host_port(target)?;

        let addresses = self
            .resolver
            .resolve(host)
            .await
            .map_err(|source| DialError::Resolve {
                host: host.to_string(),
                source: Arc::from(source),
            })?;

        info!(host, ?addresses, "resolved controller host");

        let mut first_error = None;
        for ip in addresses {
            let addr = SocketAddr::new(ip, port);
            match connect_timeout(addr, self.timeout).await {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    warn!(%addr, error = %err, "failed to dial candidate");
                    if first_error.is_none() {
                        first_error = Some(DialError::Connect {
                            addr,
                            source: Arc::new(err),
                        });
                    }
                }
            }
        }

        Err(first_error.unwrap_or_else(|| DialError::NoAddresses {
            target: target.to_string(),
        }))
    }
}

async fn connect_timeout(addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .unwrap_or_else(|_| {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("dial timed out after {timeout:?}"),
            ))
        })
}

/// Split `host:port`, accepting bracketed IPv6 hosts
pub(crate) fn split_host_port(target: &str) -> Result<(&str, u16), DialError> {
    let invalid = |reason: &str| DialError::InvalidTarget {
        target: target.to_string(),
        reason: reason.to_string(),
    };

    let (host, port) = if let Some(rest) = target.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| invalid("missing ']' in address"))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        (host, port)
    } else {
        let (host, port) = target
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        if host.contains(':') {
            return Err(invalid("too many colons in address"));
        }
        (host, port)
    };

    let port = port.parse().map_err(|_| invalid("invalid port"))?;
    Ok((host, port))
}
