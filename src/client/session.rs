use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::{ClickatellError, Command, Gateway, single};
use crate::domain::{ApiId, Password, ResponseKind, Username, ValidationError};
use crate::transport;

/// How long the gateway keeps an idle session alive.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone)]
/// Account credentials exchanged for a session token by the `auth` command.
pub struct Credentials {
    username: Username,
    password: Password,
    api_id: ApiId,
}

impl Credentials {
    /// Validate that every part is non-empty.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        api_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            username: Username::new(username)?,
            password: Password::new(password)?,
            api_id: ApiId::new(api_id)?,
        })
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn api_id(&self) -> &ApiId {
        &self.api_id
    }
}

/// A session token and the wall-clock time it was issued or last refreshed.
///
/// Serializable so a token can be handed to another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub token: String,
    pub issued_at: SystemTime,
}

impl SessionSnapshot {
    /// A token is valid while `now - issued_at < timeout`.
    ///
    /// An issue time in the future (clock adjusted backwards) counts as fresh.
    pub fn is_valid_at(&self, now: SystemTime, timeout: Duration) -> bool {
        match now.duration_since(self.issued_at) {
            Ok(age) => age < timeout,
            Err(_) => true,
        }
    }
}

/// Owns the credentials and the cached session token.
///
/// Expiry is evaluated lazily on every [`token`](Self::token) access; there
/// is no background refresh. Not meant to be shared between tasks.
#[derive(Debug, Clone)]
pub struct SessionManager {
    credentials: Credentials,
    timeout: Duration,
    current: Option<SessionSnapshot>,
}

impl SessionManager {
    pub fn new(credentials: Credentials, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
            current: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a cached token exists and has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.valid_token(SystemTime::now()).is_some()
    }

    fn valid_token(&self, now: SystemTime) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|snapshot| snapshot.is_valid_at(now, self.timeout))
            .map(|snapshot| snapshot.token.as_str())
    }

    /// Use a token obtained elsewhere; the timeout restarts now.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.current = Some(SessionSnapshot {
            token: token.into(),
            issued_at: SystemTime::now(),
        });
    }

    /// Restart the timeout without changing the token. No-op without a token.
    pub fn reset_timeout(&mut self) {
        if let Some(snapshot) = self.current.as_mut() {
            snapshot.issued_at = SystemTime::now();
        }
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.current.clone()
    }

    /// Adopt an exported session, keeping its original issue time.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.current = Some(snapshot);
    }

    /// Forget the cached token; the next access re-authenticates.
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub(super) async fn token(&mut self, gateway: &Gateway) -> Result<String, ClickatellError> {
        if let Some(token) = self.valid_token(SystemTime::now()) {
            return Ok(token.to_owned());
        }
        self.authenticate(gateway).await
    }

    async fn authenticate(&mut self, gateway: &Gateway) -> Result<String, ClickatellError> {
        let params = transport::encode_auth(
            &self.credentials.username,
            &self.credentials.password,
            &self.credentials.api_id,
        );
        let record = single(Command::Auth, gateway.call(Command::Auth, params).await?)?;

        match record.kind {
            ResponseKind::Ok(payload) if !payload.value.is_empty() => {
                tracing::info!(
                    user = self.credentials.username.as_str(),
                    "clickatell session established"
                );
                self.set_token(payload.value.clone());
                Ok(payload.value)
            }
            ResponseKind::Err(reply) => {
                self.current = None;
                Err(ClickatellError::Authentication {
                    code: reply.code,
                    reason: reply.reason,
                })
            }
            _ => Err(ClickatellError::UnexpectedResponse {
                command: Command::Auth.path(),
                raw: record.raw,
            }),
        }
    }
}
