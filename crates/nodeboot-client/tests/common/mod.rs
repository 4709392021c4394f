#![allow(dead_code)]

use async_trait::async_trait;
use nodeboot_core::{Authenticator, BoxError, HostLookup, LookupError, Resolver};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Returns a fixed token and remembers the bytes it signed
#[derive(Default)]
pub struct RecordingAuthenticator {
    pub signed: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl Authenticator for RecordingAuthenticator {
    async fn create_token(&self, body: &[u8]) -> Result<String, BoxError> {
        self.signed.lock().unwrap().push(body.to_vec());
        Ok(format!("x-test-token {}", body.len()))
    }
}

pub struct FailingAuthenticator;

#[async_trait]
impl Authenticator for FailingAuthenticator {
    async fn create_token(&self, _body: &[u8]) -> Result<String, BoxError> {
        Err("instance identity document unavailable".into())
    }
}

/// Maps hostnames to fixed addresses, like a membership snapshot
pub struct MapResolver(pub HashMap<String, Vec<IpAddr>>);

impl MapResolver {
    pub fn single(host: &str, ip: IpAddr) -> Arc<Self> {
        Arc::new(Self(HashMap::from([(host.to_string(), vec![ip])])))
    }
}

#[async_trait]
impl Resolver for MapResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, BoxError> {
        self.0
            .get(host)
            .cloned()
            .ok_or_else(|| format!("{host} is not a known member").into())
    }
}

/// Resolver that never answers
pub struct StalledResolver;

#[async_trait]
impl Resolver for StalledResolver {
    async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>, BoxError> {
        std::future::pending().await
    }
}

/// Pre-flight lookup that always answers with localhost
pub struct LocalhostLookup;

#[async_trait]
impl HostLookup for LocalhostLookup {
    async fn lookup_ip(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
        Ok(vec![LOCALHOST])
    }
}

/// A throwaway CA and a controller certificate it signed
pub struct TestPki {
    pub ca_pem: String,
    pub server_config: Arc<ServerConfig>,
}

impl TestPki {
    pub fn generate() -> Self {
        let mut ca_params = CertificateParams::default();
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "nodeboot test CA");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca_key = KeyPair::generate().unwrap();
        let ca = ca_params.self_signed(&ca_key).unwrap();

        let params =
            CertificateParams::new(vec!["controller".to_string(), "localhost".to_string()])
                .unwrap();
        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &ca, &ca_key).unwrap();

        let server_config = ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(
            vec![cert.der().clone()],
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
        )
        .unwrap();

        Self {
            ca_pem: ca.pem(),
            server_config: Arc::new(server_config),
        }
    }
}

/// Serve every TLS connection with a fixed HTTP response, returning the bound address
pub async fn serve_tls(config: Arc<ServerConfig>, status: u16, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TlsAcceptor::from(config);

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let mut stream = BufReader::new(tls);

                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    if stream.read_line(&mut line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap_or(0);
                        }
                    }
                }
                let mut request_body = vec![0; content_length];
                if stream.read_exact(&mut request_body).await.is_err() {
                    return;
                }

                let response = format!(
                    "HTTP/1.1 {status} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.get_mut().write_all(response.as_bytes()).await;
                let _ = stream.get_mut().shutdown().await;
            });
        }
    });

    addr
}

/// Accept TCP connections and never answer, so TLS handshakes hang
pub async fn serve_silent() -> SocketAddr {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((tcp, _)) = listener.accept().await {
            held.push(tcp);
        }
    });
    addr
}
