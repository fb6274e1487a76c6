//! Client layer: session handling, command dispatch and transport ↔ domain mapping.

mod batch;
mod session;
#[cfg(test)]
mod testing;

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    BatchId, BatchOptions, MessageRef, Msisdn, Payload, Response, ResponseKind, SendMsg,
    SendOptions, ValidationError,
};
use crate::transport::{self, ParseError};

pub use batch::Batch;
pub use session::{Credentials, DEFAULT_SESSION_TIMEOUT, SessionManager, SessionSnapshot};

const DEFAULT_BASE_URL: &str = "https://api.clickatell.com";

/// Boxed future returned by [`HttpTransport`] implementations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error produced by an [`HttpTransport`]; surfaced unchanged as [`ClickatellError::Transport`].
pub type TransportError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Parameters go into the query string.
    #[default]
    Get,
    /// Parameters go into a form-encoded body.
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Performs one HTTP round trip. No retries; timeouts belong to the implementation.
pub trait HttpTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let mut builder = match request.method {
                Method::Get => self.client.get(&request.url).query(&request.params),
                Method::Post => self.client.post(&request.url).form(&request.params),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`ClickatellClient`].
///
/// Nothing is retried or swallowed: every failure reaches the caller of the
/// operation that triggered it.
pub enum ClickatellError {
    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// Non-successful HTTP status code returned by the server.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// The gateway rejected the account credentials.
    #[error("authentication failed: {code} {reason}")]
    Authentication { code: i32, reason: String },

    /// The gateway answered a command with an `ERR` line.
    #[error("gateway error: {code} {reason}")]
    Gateway { code: i32, reason: String },

    /// A reply line did not follow the gateway grammar.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The reply parsed, but is not what the command answers with.
    #[error("unexpected response to {command}: {raw:?}")]
    UnexpectedResponse { command: &'static str, raw: String },

    /// A batch item or end was requested without a batch id.
    #[error("batch has not been started")]
    BatchNotStarted,

    /// A configured endpoint is not a valid absolute URL.
    #[error("invalid endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// One of the domain constructors rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Gateway API family a command belongs to; each has its own base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Http,
    Batch,
    Utils,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Auth,
    SendMsg,
    QueryMsg,
    Ping,
    GetBalance,
    GetMsgCharge,
    StartBatch,
    SendItem,
    EndBatch,
    RouteCoverage,
}

impl Command {
    fn path(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::SendMsg => "sendmsg",
            Self::QueryMsg => "querymsg",
            Self::Ping => "ping",
            Self::GetBalance => "getbalance",
            Self::GetMsgCharge => "getmsgcharge",
            Self::StartBatch => "startbatch",
            Self::SendItem => "senditem",
            Self::EndBatch => "endbatch",
            Self::RouteCoverage => "routeCoverage.php",
        }
    }

    fn api(self) -> Api {
        match self {
            Self::StartBatch | Self::SendItem | Self::EndBatch => Api::Batch,
            Self::RouteCoverage => Api::Utils,
            _ => Api::Http,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoints {
    http: String,
    batch: String,
    utils: String,
}

impl Endpoints {
    fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            http: format!("{base}/http"),
            batch: format!("{base}/http_batch"),
            utils: format!("{base}/utils"),
        }
    }

    fn url(&self, command: Command) -> String {
        let base = match command.api() {
            Api::Http => &self.http,
            Api::Batch => &self.batch,
            Api::Utils => &self.utils,
        };
        format!("{}/{}", base.trim_end_matches('/'), command.path())
    }
}

/// Issues commands and turns reply bodies into ordered records.
#[derive(Clone)]
struct Gateway {
    endpoints: Endpoints,
    method: Method,
    headers: Vec<(String, String)>,
    http: Arc<dyn HttpTransport>,
}

impl Gateway {
    /// One round trip; records come back in the order the gateway sent the lines.
    async fn call(
        &self,
        command: Command,
        params: Vec<(String, String)>,
    ) -> Result<Vec<Response>, ClickatellError> {
        let url = self.endpoints.url(command);
        tracing::debug!(command = command.path(), url = %url, "clickatell request");

        let response = self
            .http
            .send(HttpRequest {
                method: self.method,
                url,
                params,
                headers: self.headers.clone(),
            })
            .await
            .map_err(ClickatellError::Transport)?;

        if !(200..=299).contains(&response.status) {
            let body = if response.body.trim().is_empty() {
                None
            } else {
                Some(response.body)
            };
            return Err(ClickatellError::HttpStatus {
                status: response.status,
                body,
            });
        }

        let records = transport::parse_body(&response.body)?;
        tracing::debug!(
            command = command.path(),
            lines = records.len(),
            "clickatell response"
        );
        Ok(records)
    }
}

/// The one record a single-answer command must produce.
fn single(command: Command, mut records: Vec<Response>) -> Result<Response, ClickatellError> {
    if records.len() == 1 {
        if let Some(record) = records.pop() {
            return Ok(record);
        }
    }
    Err(ClickatellError::UnexpectedResponse {
        command: command.path(),
        raw: records
            .iter()
            .map(|record| record.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

/// `Ok`/`Id` payload of a single-answer command, or the matching error.
fn expect_payload(command: Command, record: Response) -> Result<Payload, ClickatellError> {
    match record.kind {
        ResponseKind::Ok(payload) | ResponseKind::Id(payload) => Ok(payload),
        ResponseKind::Err(reply) => Err(ClickatellError::Gateway {
            code: reply.code,
            reason: reply.reason,
        }),
        ResponseKind::Credit(_) | ResponseKind::ApiMsgId(_) => {
            Err(ClickatellError::UnexpectedResponse {
                command: command.path(),
                raw: record.raw,
            })
        }
    }
}

#[derive(Clone)]
/// Builder for [`ClickatellClient`].
///
/// Use this when you need to customize endpoints, session timeout, send
/// defaults, or the HTTP layer.
pub struct ClickatellClientBuilder {
    credentials: Credentials,
    endpoints: Endpoints,
    session_timeout: Duration,
    send_defaults: SendOptions,
    method: Method,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl ClickatellClientBuilder {
    /// Create a builder with the public gateway endpoints and a 15 minute session.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoints: Endpoints::from_base(DEFAULT_BASE_URL),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            send_defaults: SendOptions::default(),
            method: Method::Get,
            headers: Vec::new(),
            timeout: None,
            user_agent: None,
            transport: None,
        }
    }

    /// Derive all three API bases (`/http`, `/http_batch`, `/utils`) from one root.
    pub fn base_url(mut self, base: impl AsRef<str>) -> Self {
        self.endpoints = Endpoints::from_base(base.as_ref());
        self
    }

    /// Override the base used by single-message commands.
    pub fn http_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.http = endpoint.into();
        self
    }

    /// Override the base used by `startbatch`/`senditem`/`endbatch`.
    pub fn batch_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.batch = endpoint.into();
        self
    }

    /// Override the base used by utility commands such as route coverage.
    pub fn utils_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.utils = endpoint.into();
        self
    }

    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Options merged into every `sendmsg` and batch; per-call values win.
    pub fn send_defaults(mut self, defaults: SendOptions) -> Self {
        self.send_defaults = defaults;
        self
    }

    pub fn http_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    ///
    /// Ignored when a custom [`transport`](Self::transport) is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    ///
    /// Ignored when a custom [`transport`](Self::transport) is supplied.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Replace the reqwest-based HTTP layer.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build a [`ClickatellClient`].
    pub fn build(self) -> Result<ClickatellClient, ClickatellError> {
        for endpoint in [
            &self.endpoints.http,
            &self.endpoints.batch,
            &self.endpoints.utils,
        ] {
            url::Url::parse(endpoint).map_err(|source| ClickatellError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                source,
            })?;
        }

        let http = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(user_agent) = self.user_agent {
                    builder = builder.user_agent(user_agent);
                }
                let client = builder
                    .build()
                    .map_err(|err| ClickatellError::Transport(Box::new(err)))?;
                Arc::new(ReqwestTransport { client })
            }
        };

        Ok(ClickatellClient {
            gateway: Gateway {
                endpoints: self.endpoints,
                method: self.method,
                headers: self.headers,
                http,
            },
            session: SessionManager::new(self.credentials, self.session_timeout),
            defaults: self.send_defaults,
        })
    }
}

/// High-level Clickatell HTTP API client.
///
/// The client owns one session. Every operation that needs a session token
/// takes `&mut self` and transparently re-authenticates once the cached token
/// is older than the session timeout. Use one client per task if you need
/// parallel sends.
pub struct ClickatellClient {
    gateway: Gateway,
    session: SessionManager,
    defaults: SendOptions,
}

impl ClickatellClient {
    /// Create a client using the default endpoints.
    ///
    /// For more customization, use [`ClickatellClient::builder`].
    pub fn new(credentials: Credentials) -> Self {
        Self {
            gateway: Gateway {
                endpoints: Endpoints::from_base(DEFAULT_BASE_URL),
                method: Method::Get,
                headers: Vec::new(),
                http: Arc::new(ReqwestTransport {
                    client: reqwest::Client::new(),
                }),
            },
            session: SessionManager::new(credentials, DEFAULT_SESSION_TIMEOUT),
            defaults: SendOptions::default(),
        }
    }

    /// Start building a client with custom settings.
    pub fn builder(credentials: Credentials) -> ClickatellClientBuilder {
        ClickatellClientBuilder::new(credentials)
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Direct access for injecting or exporting a session token.
    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    pub fn send_defaults(&self) -> &SendOptions {
        &self.defaults
    }

    /// Current session token, authenticating first if there is none or it expired.
    pub async fn token(&mut self) -> Result<String, ClickatellError> {
        self.session.token(&self.gateway).await
    }

    async fn authenticated_call(
        &mut self,
        command: Command,
        params: Vec<(String, String)>,
    ) -> Result<Vec<Response>, ClickatellError> {
        let token = self.token().await?;
        let mut all = transport::encode_session(&token);
        all.extend(params);
        self.gateway.call(command, all).await
    }

    /// Send one text to every recipient of `request`.
    ///
    /// Returns one record per recipient line, in gateway order. Per-recipient
    /// failures are `Err` records rather than a failed call; correlate them by
    /// position or by [`Response::to`].
    ///
    /// Errors:
    /// - [`ClickatellError::Validation`] when a companion option is missing
    ///   or an extra key shadows a typed parameter (checked before any
    ///   network call),
    /// - [`ClickatellError::Authentication`] when re-authentication fails.
    pub async fn send_msg(&mut self, request: SendMsg) -> Result<Vec<Response>, ClickatellError> {
        let options = request.options().merged_over(&self.defaults);
        options.check(Some(request.sender()))?;

        let params = transport::encode_send_msg(&request, &options);
        self.authenticated_call(Command::SendMsg, params).await
    }

    /// Query the delivery status of a previously sent message.
    pub async fn query_msg(
        &mut self,
        reference: &MessageRef,
    ) -> Result<Vec<Response>, ClickatellError> {
        let params = transport::encode_query_msg(reference);
        self.authenticated_call(Command::QueryMsg, params).await
    }

    /// Keep the session alive. On success the session timeout restarts.
    pub async fn ping(&mut self) -> Result<(), ClickatellError> {
        let records = self.authenticated_call(Command::Ping, Vec::new()).await?;
        expect_payload(Command::Ping, single(Command::Ping, records)?)?;
        self.session.reset_timeout();
        Ok(())
    }

    /// Remaining account credit.
    pub async fn get_balance(&mut self) -> Result<f64, ClickatellError> {
        let records = self
            .authenticated_call(Command::GetBalance, Vec::new())
            .await?;
        let record = single(Command::GetBalance, records)?;
        match record.kind {
            ResponseKind::Credit(value) => Ok(value),
            ResponseKind::Err(reply) => Err(ClickatellError::Gateway {
                code: reply.code,
                reason: reply.reason,
            }),
            _ => Err(ClickatellError::UnexpectedResponse {
                command: Command::GetBalance.path(),
                raw: record.raw,
            }),
        }
    }

    /// Whether the gateway can route to `msisdn`; inspect the record variant.
    pub async fn check_coverage(&mut self, msisdn: &Msisdn) -> Result<Response, ClickatellError> {
        let params = transport::encode_route_coverage(msisdn);
        let records = self
            .authenticated_call(Command::RouteCoverage, params)
            .await?;
        single(Command::RouteCoverage, records)
    }

    /// Charge and status of a sent message; inspect the record variant.
    pub async fn get_msg_charge(&mut self, api_msg_id: &str) -> Result<Response, ClickatellError> {
        let params = transport::encode_msg_charge(api_msg_id);
        let records = self
            .authenticated_call(Command::GetMsgCharge, params)
            .await?;
        single(Command::GetMsgCharge, records)
    }

    /// Prepare a batch with `options` merged over the client defaults.
    ///
    /// Nothing is sent until [`Batch::start`].
    pub fn batch(&mut self, options: BatchOptions) -> Batch<'_> {
        let options = options.merged_over(&self.defaults);
        Batch::new(self, options, None)
    }

    /// Attach to a batch started earlier, possibly by another process.
    pub fn resume_batch(&mut self, batch_id: BatchId, options: BatchOptions) -> Batch<'_> {
        let options = options.merged_over(&self.defaults);
        Batch::new(self, options, Some(batch_id))
    }

    /// Start a batch, run `body` with it, and end the batch on every exit path.
    ///
    /// If `body` fails, its error is returned even when ending the batch
    /// fails too; the latter is only logged.
    pub async fn run_batch<T, F>(
        &mut self,
        options: BatchOptions,
        body: F,
    ) -> Result<T, ClickatellError>
    where
        F: AsyncFnOnce(&mut Batch<'_>) -> Result<T, ClickatellError>,
    {
        let mut batch = self.batch(options);
        batch.start().await?;

        let outcome = body(&mut batch).await;
        let ended = batch.end().await;

        match (outcome, ended) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(end_err)) => {
                tracing::warn!(error = %end_err, "failed to end batch after batch body error");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use crate::domain::{Callback, ErrorReply, Features, MessageText, SenderId};

    use super::testing::{FakeTransport, authenticated_client, client, client_with, param};
    use super::*;

    fn send_request(recipients: &[&str]) -> SendMsg {
        SendMsg::to_many(
            recipients
                .iter()
                .map(|to| Msisdn::new(*to).unwrap())
                .collect(),
            SenderId::new("Acme").unwrap(),
            MessageText::new("hello").unwrap(),
            SendOptions::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn send_msg_joins_recipients_and_attaches_token() {
        let transport = FakeTransport::new();
        transport.reply("ID: abc To: 27123456781\nID: def To: 27123456782");
        let mut client = authenticated_client(&transport, "cached-token");

        let records = client
            .send_msg(send_request(&["27123456781", "27123456782"]))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to(), Some("27123456781"));
        assert_eq!(records[1].payload().unwrap().value, "def");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "https://example.invalid/http/sendmsg");
        assert_eq!(request.method, Method::Get);
        assert_eq!(param(request, "session_id"), Some("cached-token"));
        assert_eq!(param(request, "to"), Some("27123456781,27123456782"));
        assert_eq!(param(request, "from"), Some("Acme"));
        assert_eq!(param(request, "text"), Some("hello"));
    }

    #[tokio::test]
    async fn send_msg_keeps_mixed_per_recipient_results_in_order() {
        let transport = FakeTransport::new();
        transport.reply("OK: apiMsgId To: 27123456781\nERR: 301, No Credit Left\n");
        let mut client = authenticated_client(&transport, "t");

        let records = client
            .send_msg(send_request(&["27123456781", "27123456782"]))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].kind,
            ResponseKind::Ok(Payload {
                value: "apiMsgId".to_owned(),
                extra: [("To".to_owned(), "27123456781".to_owned())].into(),
            })
        );
        assert_eq!(
            records[1].kind,
            ResponseKind::Err(ErrorReply {
                code: 301,
                reason: "No Credit Left".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn send_msg_merges_defaults_with_caller_winning() {
        let transport = FakeTransport::new();
        transport.reply("ID: abc");
        let defaults = SendOptions {
            callback: Some(Callback::All),
            req_feat: Some(Features::DELIVACK),
            ..Default::default()
        };
        let mut client = client_with(&transport, |builder| builder.send_defaults(defaults));
        client.session_mut().set_token("t");

        let request = SendMsg::one(
            Msisdn::new("27123456781").unwrap(),
            SenderId::new("Acme").unwrap(),
            MessageText::new("hi").unwrap(),
            SendOptions {
                callback: Some(Callback::Final),
                ..Default::default()
            },
        );
        client.send_msg(request).await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(param(request, "callback"), Some("2"));
        assert_eq!(param(request, "req_feat"), Some("8192"));
        assert_eq!(client.send_defaults().callback, Some(Callback::All));
    }

    #[tokio::test]
    async fn send_msg_authenticates_first_without_cached_token() {
        let transport = FakeTransport::new();
        transport.reply("OK: fresh-token");
        transport.reply("ID: abc To: 27123456781");
        let mut client = client(&transport);

        let records = client
            .send_msg(send_request(&["27123456781"]))
            .await
            .unwrap();
        assert_eq!(records[0].to(), Some("27123456781"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://example.invalid/http/auth");
        assert_eq!(requests[1].url, "https://example.invalid/http/sendmsg");
        assert_eq!(param(&requests[1], "session_id"), Some("fresh-token"));
    }

    #[tokio::test]
    async fn send_msg_surfaces_authentication_failure() {
        let transport = FakeTransport::new();
        transport.reply("ERR: 001, Authentication failed");
        let mut client = client(&transport);

        let err = client
            .send_msg(send_request(&["27123456781"]))
            .await
            .unwrap_err();
        match err {
            ClickatellError::Authentication { code, reason } => {
                assert_eq!(code, 1);
                assert_eq!(reason, "Authentication failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.ends_with("/http/auth"));
    }

    #[tokio::test]
    async fn send_msg_rejects_reserved_extra_key_locally() {
        let transport = FakeTransport::new();
        let mut client = authenticated_client(&transport, "t");
        let request = SendMsg::one(
            Msisdn::new("27123456781").unwrap(),
            SenderId::new("Acme").unwrap(),
            MessageText::new("hi").unwrap(),
            SendOptions {
                extra: [("to".to_owned(), "27999999999".to_owned())].into(),
                ..Default::default()
            },
        );

        let err = client.send_msg(request).await.unwrap_err();
        assert!(matches!(
            err,
            ClickatellError::Validation(ValidationError::ReservedField { .. })
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_any_network_call() {
        let transport = FakeTransport::new();
        let mut client = authenticated_client(&transport, "t");

        async fn send(
            client: &mut ClickatellClient,
            to: &str,
        ) -> Result<Vec<Response>, ClickatellError> {
            let request = SendMsg::one(
                Msisdn::new(to)?,
                SenderId::new("Acme")?,
                MessageText::new("hi")?,
                SendOptions::default(),
            );
            client.send_msg(request).await
        }

        for to in ["+27123456781", "0123456781"] {
            let err = send(&mut client, to).await.unwrap_err();
            assert!(matches!(
                err,
                ClickatellError::Validation(ValidationError::InvalidMsisdn { .. })
            ));
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn ping_ok_restarts_session_timeout() {
        let transport = FakeTransport::new();
        transport.reply("OK:");
        let mut client = authenticated_client(&transport, "t");
        let stale = SystemTime::now() - Duration::from_secs(10 * 60);
        client.session_mut().restore(SessionSnapshot {
            token: "t".to_owned(),
            issued_at: stale,
        });

        let before = SystemTime::now();
        client.ping().await.unwrap();

        let snapshot = client.session().snapshot().unwrap();
        assert_eq!(snapshot.token, "t");
        assert!(snapshot.issued_at >= before);
        assert_eq!(transport.requests()[0].url, "https://example.invalid/http/ping");
    }

    #[tokio::test]
    async fn ping_err_raises_gateway_error_and_keeps_issue_time() {
        let transport = FakeTransport::new();
        transport.reply("ERR: 003, Session ID expired");
        let mut client = authenticated_client(&transport, "t");
        let issued_at = SystemTime::now() - Duration::from_secs(5 * 60);
        client.session_mut().restore(SessionSnapshot {
            token: "t".to_owned(),
            issued_at,
        });

        let err = client.ping().await.unwrap_err();
        match err {
            ClickatellError::Gateway { code, reason } => {
                assert_eq!(code, 3);
                assert_eq!(reason, "Session ID expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.session().snapshot().unwrap().issued_at, issued_at);
    }

    #[tokio::test]
    async fn get_balance_returns_credit() {
        let transport = FakeTransport::new();
        transport.reply("Credit: 500.00");
        let mut client = authenticated_client(&transport, "t");

        assert_eq!(client.get_balance().await.unwrap(), 500.0);
        assert_eq!(
            transport.requests()[0].url,
            "https://example.invalid/http/getbalance"
        );
    }

    #[tokio::test]
    async fn get_balance_maps_err_and_rejects_other_records() {
        let transport = FakeTransport::new();
        transport.reply("ERR: 001, Authentication failed");
        transport.reply("OK: 12");
        let mut client = authenticated_client(&transport, "t");

        assert!(matches!(
            client.get_balance().await.unwrap_err(),
            ClickatellError::Gateway { code: 1, .. }
        ));
        assert!(matches!(
            client.get_balance().await.unwrap_err(),
            ClickatellError::UnexpectedResponse {
                command: "getbalance",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn query_msg_sends_reference_and_returns_records() {
        let transport = FakeTransport::new();
        transport.reply("ID: abc Status: 004");
        let mut client = authenticated_client(&transport, "t");

        let records = client
            .query_msg(&MessageRef::api_msg_id("abc").unwrap())
            .await
            .unwrap();
        assert_eq!(records[0].payload().unwrap().get("Status"), Some("004"));
        assert_eq!(param(&transport.requests()[0], "apimsgid"), Some("abc"));
    }

    #[tokio::test]
    async fn check_coverage_uses_utils_base() {
        let transport = FakeTransport::new();
        transport.reply("OK: This prefix is currently supported Charge: 0.8");
        let mut client = authenticated_client(&transport, "t");

        let record = client
            .check_coverage(&Msisdn::new("27123456781").unwrap())
            .await
            .unwrap();
        assert_eq!(record.payload().unwrap().get("Charge"), Some("0.8"));

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "https://example.invalid/utils/routeCoverage.php"
        );
        assert_eq!(param(request, "msisdn"), Some("27123456781"));
    }

    #[tokio::test]
    async fn get_msg_charge_returns_raw_record() {
        let transport = FakeTransport::new();
        transport.reply("apiMsgId: abc charge: 1 status: 004");
        let mut client = authenticated_client(&transport, "t");

        let record = client.get_msg_charge("abc").await.unwrap();
        assert!(matches!(record.kind, ResponseKind::ApiMsgId(_)));
        assert_eq!(record.payload().unwrap().get("charge"), Some("1"));
    }

    #[tokio::test]
    async fn unknown_tag_propagates_as_parse_error() {
        let transport = FakeTransport::new();
        transport.reply("NOTICE: gateway upgraded");
        let mut client = authenticated_client(&transport, "t");

        let err = client.get_balance().await.unwrap_err();
        assert!(matches!(
            err,
            ClickatellError::Parse(ParseError::UnknownResponseTag { .. })
        ));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let transport = FakeTransport::new();
        let mut client = authenticated_client(&transport, "t");

        let err = client.get_balance().await.unwrap_err();
        assert!(matches!(err, ClickatellError::Transport(_)));
    }

    #[tokio::test]
    async fn non_success_http_status_is_reported() {
        let transport = FakeTransport::new();
        transport.reply_status(503, "   ");
        let mut client = authenticated_client(&transport, "t");

        let err = client.get_balance().await.unwrap_err();
        assert!(matches!(
            err,
            ClickatellError::HttpStatus {
                status: 503,
                body: None
            }
        ));
    }

    #[tokio::test]
    async fn post_method_and_headers_reach_transport() {
        let transport = FakeTransport::new();
        transport.reply("Credit: 1");
        let mut client = client_with(&transport, |builder| {
            builder
                .http_method(Method::Post)
                .header("X-Trace", "abc")
        });
        client.session_mut().set_token("t");

        client.get_balance().await.unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.headers,
            vec![("X-Trace".to_owned(), "abc".to_owned())]
        );
    }

    #[test]
    fn builder_endpoint_overrides_are_applied() {
        let transport = FakeTransport::new();
        let client = client_with(&transport, |builder| {
            builder
                .base_url("https://gw.example.invalid/")
                .batch_endpoint("https://batch.example.invalid/b")
        });
        assert_eq!(
            client.gateway.endpoints.url(Command::Auth),
            "https://gw.example.invalid/http/auth"
        );
        assert_eq!(
            client.gateway.endpoints.url(Command::StartBatch),
            "https://batch.example.invalid/b/startbatch"
        );
        assert_eq!(
            client.gateway.endpoints.url(Command::RouteCoverage),
            "https://gw.example.invalid/utils/routeCoverage.php"
        );
    }

    #[test]
    fn builder_rejects_invalid_endpoint() {
        let credentials = Credentials::new("user", "pass", "1").unwrap();
        let result = ClickatellClient::builder(credentials)
            .http_endpoint("not a url")
            .build();
        assert!(matches!(
            result,
            Err(ClickatellError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn default_endpoints_point_at_public_gateway() {
        let endpoints = Endpoints::from_base(DEFAULT_BASE_URL);
        assert_eq!(
            endpoints.url(Command::SendMsg),
            "https://api.clickatell.com/http/sendmsg"
        );
        assert_eq!(
            endpoints.url(Command::EndBatch),
            "https://api.clickatell.com/http_batch/endbatch"
        );
    }
}
