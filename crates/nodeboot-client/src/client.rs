//! Bootstrap protocol client implementation.

use crate::config::{
    DEFAULT_DIAL_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DETAIL_READ_LIMIT, DETAIL_READ_TIMEOUT,
};
use crate::dialer::Dialer;
use crate::lookup::SystemLookup;
use crate::transport::Transport;
use bytes::Bytes;
use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use nodeboot_core::{
    is_placeholder_only, Authenticator, BootstrapError, HostLookup, Resolver, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Path appended to the endpoint's base path
const BOOTSTRAP_PATH: &str = "bootstrap";

/// Client for the controller's bootstrap endpoint.
///
/// Cloning is cheap; clones share the same lazily built transport.
#[derive(Clone)]
pub struct BootstrapClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    authenticator: Arc<dyn Authenticator>,
    ca_pem: Vec<u8>,
    endpoint: Url,
    host: String,
    bootstrap_uri: Uri,
    resolution: Resolution,
    dial_timeout: Duration,
    request_timeout: Duration,
    user_agent: HeaderValue,
    transport: OnceCell<Transport>,
    #[cfg(test)]
    transport_builds: AtomicUsize,
}

/// Who owns address resolution for the endpoint host
enum Resolution {
    /// A bound resolver; system DNS is never consulted
    Delegated(Arc<dyn Resolver>),
    /// System dialing, with a pre-flight lookup for diagnostics
    System(Arc<dyn HostLookup>),
}

impl BootstrapClient {
    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(
        endpoint: impl Into<String>,
        ca_pem: impl Into<Vec<u8>>,
        authenticator: Arc<dyn Authenticator>,
    ) -> BootstrapClientBuilder {
        BootstrapClientBuilder::new(endpoint, ca_pem, authenticator)
    }

    /// The controller base URL
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// The full URL bootstrap requests are posted to
    #[must_use]
    pub fn bootstrap_uri(&self) -> &Uri {
        &self.inner.bootstrap_uri
    }

    /// Run one bootstrap exchange.
    ///
    /// No retries happen here; inspect the error's class to decide whether
    /// to try again. Cancelling `cancel` aborts any in-flight lookup, dial
    /// or HTTP exchange and returns [`BootstrapError::Cancelled`].
    pub async fn query_bootstrap<Req, Resp>(
        &self,
        cancel: &CancellationToken,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("bootstrap cancelled");
                Err(BootstrapError::Cancelled)
            }
            result = self.exchange(request) => result,
        }
    }

    async fn exchange<Req, Resp>(&self, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let transport = self.transport().await?;

        self.preflight().await?;

        let body = serde_json::to_vec(request).map_err(BootstrapError::Encode)?;

        let token = self
            .inner
            .authenticator
            .create_token(&body)
            .await
            .map_err(BootstrapError::Auth)?;
        let authorization =
            HeaderValue::from_str(&token).map_err(|e| BootstrapError::Auth(Box::new(e)))?;

        let http_request = Request::post(self.inner.bootstrap_uri.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, authorization)
            .header(USER_AGENT, self.inner.user_agent.clone())
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| BootstrapError::InvalidEndpoint(e.to_string()))?;

        debug!(url = %self.inner.bootstrap_uri, "POST bootstrap request");

        let timeout = self.inner.request_timeout;
        let body = tokio::time::timeout(timeout, roundtrip(transport, http_request))
            .await
            .map_err(|_| BootstrapError::Timeout(timeout))??;

        serde_json::from_slice(&body).map_err(BootstrapError::Decode)
    }

    /// Build the transport on first use; concurrent callers share one build
    async fn transport(&self) -> Result<&Transport> {
        self.inner
            .transport
            .get_or_try_init(|| async {
                #[cfg(test)]
                self.inner.transport_builds.fetch_add(1, Ordering::SeqCst);
                let dialer = match &self.inner.resolution {
                    Resolution::Delegated(resolver) => {
                        Some(Dialer::new(Arc::clone(resolver)).timeout(self.inner.dial_timeout))
                    }
                    Resolution::System(_) => None,
                };
                info!(
                    endpoint = %self.inner.endpoint,
                    custom_dialer = dialer.is_some(),
                    "building bootstrap transport"
                );
                Transport::build(&self.inner.ca_pem, dialer, self.inner.dial_timeout)
            })
            .await
    }

    /// Sanity-check DNS to tell "not set up yet" apart from real failures
    async fn preflight(&self) -> Result<()> {
        let lookup = match &self.inner.resolution {
            Resolution::Delegated(_) => return Ok(()),
            Resolution::System(lookup) => lookup,
        };

        match lookup.lookup_ip(&self.inner.host).await {
            Ok(ips) if is_placeholder_only(&ips) => Err(BootstrapError::NotReady(format!(
                "controller DNS not set up yet (placeholder IP found: {ips:?})"
            ))),
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Err(BootstrapError::NotReady(format!(
                "controller DNS not set up yet ({err})"
            ))),
            Err(err) => Err(BootstrapError::Dns(err)),
        }
    }

    #[cfg(test)]
    pub(crate) fn transport_builds(&self) -> usize {
        self.inner.transport_builds.load(Ordering::SeqCst)
    }
}

async fn roundtrip(transport: &Transport, request: Request<Full<Bytes>>) -> Result<Bytes> {
    let response = transport.send(request).await?;

    let status = response.status();
    if status != StatusCode::OK {
        let detail = read_first_line(response.into_body()).await;
        warn!(status = status.as_u16(), %detail, "bootstrap request rejected");
        return Err(BootstrapError::Status {
            code: status.as_u16(),
            detail,
        });
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| BootstrapError::Http(format!("failed to read response body: {e}")))?;
    Ok(body.to_bytes())
}

/// Best-effort first line of an error body, bounded in size and time
pub(crate) async fn read_first_line<B>(mut body: B) -> String
where
    B: Body<Data = Bytes> + Unpin,
{
    let mut buf = Vec::new();
    let read = async {
        while buf.len() < DETAIL_READ_LIMIT && !buf.contains(&b'\n') {
            match body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        buf.extend_from_slice(&data);
                    }
                }
                _ => break,
            }
        }
    };
    // a stalled body keeps whatever arrived before the deadline
    let _ = tokio::time::timeout(DETAIL_READ_TIMEOUT, read).await;

    let line = buf.split(|&b| b == b'\n').next().unwrap_or_default();
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = &line[..line.len().min(DETAIL_READ_LIMIT)];
    String::from_utf8_lossy(line).into_owned()
}

/// Builder for configuring a [`BootstrapClient`]
pub struct BootstrapClientBuilder {
    endpoint: String,
    ca_pem: Vec<u8>,
    authenticator: Arc<dyn Authenticator>,
    resolver: Option<Arc<dyn Resolver>>,
    host_lookup: Option<Arc<dyn HostLookup>>,
    dial_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl BootstrapClientBuilder {
    /// Create a new builder for the given endpoint, CA bundle and authenticator
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        ca_pem: impl Into<Vec<u8>>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            ca_pem: ca_pem.into(),
            authenticator,
            resolver: None,
            host_lookup: None,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: format!("nodeboot/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Bind a resolver; all dialing goes through it and the DNS pre-flight is skipped
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the system lookup used for the pre-flight check
    #[must_use]
    pub fn host_lookup(mut self, lookup: Arc<dyn HostLookup>) -> Self {
        self.host_lookup = Some(lookup);
        self
    }

    /// Set the per-candidate connect timeout
    #[must_use]
    pub const fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Set the overall request timeout
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Build the client.
    ///
    /// The transport itself is built lazily on the first query.
    pub fn build(self) -> Result<BootstrapClient> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| BootstrapError::InvalidEndpoint(format!("{:?}: {e}", self.endpoint)))?;
        if !matches!(endpoint.scheme(), "https" | "http") {
            return Err(BootstrapError::InvalidEndpoint(format!(
                "unsupported scheme {:?}",
                endpoint.scheme()
            )));
        }
        let host = endpoint
            .host_str()
            .ok_or_else(|| BootstrapError::InvalidEndpoint(format!("{endpoint} has no host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let bootstrap_uri = bootstrap_uri(&endpoint)?;

        let user_agent = HeaderValue::from_str(&self.user_agent).map_err(|e| {
            BootstrapError::Config(format!("invalid user agent {:?}: {e}", self.user_agent))
        })?;

        let resolution = match self.resolver {
            Some(resolver) => Resolution::Delegated(resolver),
            None => Resolution::System(
                self.host_lookup
                    .unwrap_or_else(|| Arc::new(SystemLookup::new())),
            ),
        };

        Ok(BootstrapClient {
            inner: Arc::new(ClientInner {
                authenticator: self.authenticator,
                ca_pem: self.ca_pem,
                endpoint,
                host,
                bootstrap_uri,
                resolution,
                dial_timeout: self.dial_timeout,
                request_timeout: self.request_timeout,
                user_agent,
                transport: OnceCell::new(),
                #[cfg(test)]
                transport_builds: AtomicUsize::new(0),
            }),
        })
    }
}

/// Join the bootstrap path onto the endpoint's base path
fn bootstrap_uri(endpoint: &Url) -> Result<Uri> {
    let path = endpoint
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .chain([BOOTSTRAP_PATH])
        .collect::<Vec<_>>()
        .join("/");

    let mut url = endpoint.clone();
    url.set_path(&format!("/{path}"));
    url.as_str()
        .parse()
        .map_err(|e| BootstrapError::InvalidEndpoint(format!("{url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use http_body_util::StreamBody;
    use hyper::body::Frame;
    use nodeboot_core::{BoxError, ErrorClass, LookupError, PLACEHOLDER_IPV4, PLACEHOLDER_IPV6};
    use std::net::IpAddr;

    struct StaticToken;

    #[async_trait]
    impl Authenticator for StaticToken {
        async fn create_token(&self, _body: &[u8]) -> std::result::Result<String, BoxError> {
            Ok("Bearer test".into())
        }
    }

    enum Answer {
        Addresses(Vec<IpAddr>),
        NotFound,
        ServerFailure,
    }

    struct StubLookup {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl StubLookup {
        fn new(answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl HostLookup for StubLookup {
        async fn lookup_ip(&self, host: &str) -> std::result::Result<Vec<IpAddr>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Answer::Addresses(ips) => Ok(ips.clone()),
                Answer::NotFound => Err(LookupError::NotFound {
                    host: host.to_string(),
                    message: "NXDOMAIN".into(),
                }),
                Answer::ServerFailure => Err(LookupError::Failed {
                    host: host.to_string(),
                    message: "SERVFAIL".into(),
                }),
            }
        }
    }

    struct UnusedResolver;

    #[async_trait]
    impl Resolver for UnusedResolver {
        async fn resolve(&self, _host: &str) -> std::result::Result<Vec<IpAddr>, BoxError> {
            Ok(Vec::new())
        }
    }

    fn test_ca_pem() -> String {
        let mut params = rcgen::CertificateParams::default();
        params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        let key = rcgen::KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().pem()
    }

    fn client_with(lookup: Arc<StubLookup>) -> BootstrapClient {
        BootstrapClient::builder(
            "https://controller.internal.example.com:3988",
            test_ca_pem(),
            Arc::new(StaticToken),
        )
        .host_lookup(lookup)
        .build()
        .unwrap()
    }

    async fn query(client: &BootstrapClient) -> Result<serde_json::Value> {
        client
            .query_bootstrap(&CancellationToken::new(), &serde_json::json!({"nodeName": "n1"}))
            .await
    }

    #[tokio::test]
    async fn test_dns_not_found_is_not_ready() {
        let lookup = StubLookup::new(Answer::NotFound);
        let err = query(&client_with(lookup.clone())).await.unwrap_err();

        assert_eq!(err.class(), ErrorClass::NotReady, "{err}");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_placeholder_address_is_not_ready() {
        for placeholder in [IpAddr::V4(PLACEHOLDER_IPV4), IpAddr::V6(PLACEHOLDER_IPV6)] {
            let lookup = StubLookup::new(Answer::Addresses(vec![placeholder]));
            let err = query(&client_with(lookup)).await.unwrap_err();
            assert!(err.is_not_ready(), "{err}");
            assert!(err.to_string().contains("placeholder IP found"));
        }
    }

    #[tokio::test]
    async fn test_other_dns_errors_are_hard_failures() {
        let lookup = StubLookup::new(Answer::ServerFailure);
        let err = query(&client_with(lookup)).await.unwrap_err();

        assert!(matches!(err, BootstrapError::Dns(_)), "{err}");
        assert!(!err.is_not_ready());
    }

    #[tokio::test]
    async fn test_unreadable_system_resolver_is_hard_failure() {
        let client = BootstrapClient::builder(
            "https://controller.internal.example.com:3988",
            test_ca_pem(),
            Arc::new(StaticToken),
        )
        .host_lookup(Arc::new(SystemLookup::unconfigured("resolv.conf missing")))
        .build()
        .unwrap();

        let err = query(&client).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Dns(LookupError::Failed { .. })), "{err}");
        assert_eq!(err.class(), ErrorClass::Resolution);
    }

    #[tokio::test]
    async fn test_bound_resolver_skips_preflight() {
        let lookup = StubLookup::new(Answer::NotFound);
        let client = BootstrapClient::builder(
            "https://controller.internal.example.com:3988",
            test_ca_pem(),
            Arc::new(StaticToken),
        )
        .resolver(Arc::new(UnusedResolver))
        .host_lookup(lookup.clone())
        .build()
        .unwrap();

        let err = query(&client).await.unwrap_err();

        // the dialer got an empty candidate list instead of a not-ready error
        assert!(
            matches!(err, BootstrapError::Dial(nodeboot_core::DialError::NoAddresses { .. })),
            "{err}"
        );
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_built_once_under_concurrency() {
        let client = client_with(StubLookup::new(Answer::NotFound));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let client = client.clone();
            tasks.push(tokio::spawn(async move { query(&client).await }));
        }
        for task in futures_util::future::join_all(tasks).await {
            assert!(task.unwrap().unwrap_err().is_not_ready());
        }

        assert_eq!(client.transport_builds(), 1);

        query(&client).await.unwrap_err();
        assert_eq!(client.transport_builds(), 1);
    }

    #[tokio::test]
    async fn test_bad_trust_anchor_fails_on_first_use() {
        let client = BootstrapClient::builder(
            "https://controller:3988",
            "not pem",
            Arc::new(StaticToken),
        )
        .host_lookup(StubLookup::new(Answer::NotFound))
        .build()
        .unwrap();

        let err = query(&client).await.unwrap_err();
        assert!(matches!(err, BootstrapError::TrustAnchor(_)), "{err}");
        assert_eq!(err.class(), ErrorClass::Input);
    }

    #[test]
    fn test_endpoint_validation() {
        for bad in ["not a url", "ftp://controller/", "unix:/run/controller.sock"] {
            let result = BootstrapClient::builder(bad, "", Arc::new(StaticToken))
                .host_lookup(StubLookup::new(Answer::NotFound))
                .build();
            assert!(
                matches!(result, Err(BootstrapError::InvalidEndpoint(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_bootstrap_path_join() {
        let cases = [
            ("https://controller:3988", "https://controller:3988/bootstrap"),
            ("https://controller:3988/", "https://controller:3988/bootstrap"),
            ("https://controller/api/", "https://controller/api/bootstrap"),
            ("https://controller//api//v1", "https://controller/api/v1/bootstrap"),
        ];
        for (base, expected) in cases {
            let uri = bootstrap_uri(&Url::parse(base).unwrap()).unwrap();
            assert_eq!(uri.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_first_line_only() {
        let body = Full::new(Bytes::from_static(b"service unavailable\r\nextra\n"));
        assert_eq!(read_first_line(body).await, "service unavailable");

        let body = Full::new(Bytes::from_static(b"no newline"));
        assert_eq!(read_first_line(body).await, "no newline");

        let body = Full::new(Bytes::new());
        assert_eq!(read_first_line(body).await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_line_stalled_body() {
        let chunks = futures_util::stream::iter([Ok::<_, std::io::Error>(Frame::data(
            Bytes::from_static(b"partial det"),
        ))])
        .chain(futures_util::stream::pending());
        let body = StreamBody::new(chunks);

        assert_eq!(read_first_line(body).await, "partial det");
    }
}
