//! HTTP-over-TLS transport pinned to the cluster CA.

use crate::dialer::Dialer;
use bytes::Bytes;
use http::Uri;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::{TokioExecutor, TokioIo};
use nodeboot_core::{BootstrapError, DialError, Result};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tower_service::Service;
use tracing::debug;

/// Pooled HTTP client that only trusts the pinned CA set
#[derive(Clone)]
pub(crate) struct Transport {
    http: HyperClient<TrustConnector, Full<Bytes>>,
}

impl Transport {
    /// Build the transport from PEM-encoded CA certificates
    pub(crate) fn build(ca_pem: &[u8], dialer: Option<Dialer>, dial_timeout: Duration) -> Result<Self> {
        let tls = tls_config(ca_pem)?;
        let connector = TrustConnector {
            tls: TlsConnector::from(Arc::new(tls)),
            dialer,
            dial_timeout,
        };
        let http = HyperClient::builder(TokioExecutor::new()).build(connector);
        Ok(Self { http })
    }

    /// Send a request, surfacing dialer failures with their classification intact
    pub(crate) async fn send(&self, request: http::Request<Full<Bytes>>) -> Result<http::Response<Incoming>> {
        self.http.request(request).await.map_err(|err| classify_send_error(&err))
    }
}

/// Client TLS configuration: pinned roots, TLS 1.2 minimum, no client auth
pub(crate) fn tls_config(ca_pem: &[u8]) -> Result<ClientConfig> {
    let certs = CertificateDer::pem_slice_iter(ca_pem)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| BootstrapError::TrustAnchor(format!("failed to parse CA certificates: {e}")))?;
    if certs.is_empty() {
        return Err(BootstrapError::TrustAnchor("no CA certificates found".into()));
    }

    let mut roots = RootCertStore::empty();
    for cert in certs {
        roots
            .add(cert)
            .map_err(|e| BootstrapError::TrustAnchor(format!("failed to add CA certificate: {e}")))?;
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|e| BootstrapError::TrustAnchor(format!("unsupported TLS configuration: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

fn classify_send_error(err: &hyper_util::client::legacy::Error) -> BootstrapError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(dial) = cause.downcast_ref::<DialError>() {
            return BootstrapError::Dial(dial.clone());
        }
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    BootstrapError::Http(message)
}

/// Connector establishing TCP through the dialer or the system, then TLS for `https`
#[derive(Clone)]
pub(crate) struct TrustConnector {
    tls: TlsConnector,
    dialer: Option<Dialer>,
    dial_timeout: Duration,
}

impl TrustConnector {
    async fn connect(self, uri: Uri) -> std::result::Result<TrustStream, DialError> {
        let invalid = |reason: &str| DialError::InvalidTarget {
            target: uri.to_string(),
            reason: reason.to_string(),
        };
        let https = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            _ => return Err(invalid("unsupported scheme")),
        };
        let host = uri.host().ok_or_else(|| invalid("missing host"))?;
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });
        let target = format!("{host}:{port}");

        debug!(%target, https, "connecting to controller");
        let tcp = match &self.dialer {
            Some(dialer) => dialer.dial(&target).await?,
            None => self.connect_system(&target).await?,
        };

        if !https {
            return Ok(TrustStream::Plain(TokioIo::new(tcp)));
        }

        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        let server_name = ServerName::try_from(bare_host.to_string())
            .map_err(|e| invalid(&format!("invalid TLS server name: {e}")))?;
        let tls = self
            .tls
            .connect(server_name, tcp)
            .await
            .map_err(|e| DialError::Handshake {
                server_name: bare_host.to_string(),
                source: Arc::new(e),
            })?;
        Ok(TrustStream::Tls(TokioIo::new(Box::new(tls))))
    }

    async fn connect_system(&self, target: &str) -> std::result::Result<TcpStream, DialError> {
        let connect = tokio::time::timeout(self.dial_timeout, TcpStream::connect(target)).await;
        let result = connect.unwrap_or_else(|_| {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("dial timed out after {:?}", self.dial_timeout),
            ))
        });
        result.map_err(|e| DialError::Unreachable {
            target: target.to_string(),
            source: Arc::new(e),
        })
    }
}

impl Service<Uri> for TrustConnector {
    type Response = TrustStream;
    type Error = DialError;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<TrustStream, DialError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        Box::pin(self.clone().connect(uri))
    }
}

/// Connection to the controller, plaintext only for `http` endpoints
pub(crate) enum TrustStream {
    Plain(TokioIo<TcpStream>),
    Tls(TokioIo<Box<TlsStream<TcpStream>>>),
}

impl Connection for TrustStream {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}

impl Read for TrustStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl Write for TrustStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
