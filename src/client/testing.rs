use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{
    BoxFuture, ClickatellClient, ClickatellClientBuilder, Credentials, HttpRequest, HttpResponse,
    HttpTransport, TransportError,
};

/// Replays queued replies in order and records every request it sees.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    state: Arc<Mutex<FakeTransportState>>,
}

#[derive(Debug, Default)]
struct FakeTransportState {
    replies: VecDeque<(u16, String)>,
    requests: Vec<HttpRequest>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(&self, body: impl Into<String>) {
        self.reply_status(200, body);
    }

    pub(crate) fn reply_status(&self, status: u16, body: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.replies.push_back((status, body.into()));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

impl HttpTransport for FakeTransport {
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let reply = {
                let mut state = self.state.lock().unwrap();
                state.requests.push(request);
                state.replies.pop_front()
            };
            match reply {
                Some((status, body)) => Ok(HttpResponse { status, body }),
                None => Err("connection refused: no reply queued".into()),
            }
        })
    }
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("username", "password", "123456").unwrap()
}

pub(crate) fn client_with(
    transport: &FakeTransport,
    configure: impl FnOnce(ClickatellClientBuilder) -> ClickatellClientBuilder,
) -> ClickatellClient {
    let builder = ClickatellClient::builder(credentials())
        .base_url("https://example.invalid")
        .transport(Arc::new(transport.clone()));
    configure(builder).build().unwrap()
}

pub(crate) fn client(transport: &FakeTransport) -> ClickatellClient {
    client_with(transport, |builder| builder)
}

/// A client whose session already holds `token`, so no `auth` call happens.
pub(crate) fn authenticated_client(transport: &FakeTransport, token: &str) -> ClickatellClient {
    let mut client = client(transport);
    client.session_mut().set_token(token);
    client
}

pub(crate) fn param<'a>(request: &'a HttpRequest, key: &str) -> Option<&'a str> {
    request
        .params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
