use std::fmt;

use crate::domain::validation::ValidationError;

fn non_empty_trimmed(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Clickatell account user name.
///
/// Invariant: non-empty after trimming.
pub struct Username(String);

impl Username {
    /// Query field name used by the `auth` command (`user`).
    pub const FIELD: &'static str = "user";

    /// Create a validated [`Username`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(non_empty_trimmed(value.into(), Self::FIELD)?))
    }

    /// Borrow the validated user name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Clickatell account password.
///
/// Invariant: must not be empty (whitespace is preserved and allowed).
pub struct Password(String);

impl Password {
    /// Query field name used by the `auth` command (`password`).
    pub const FIELD: &'static str = "password";

    /// Create a validated [`Password`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the password.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Identifier of the HTTP API product registered on the account.
///
/// Invariant: non-empty after trimming.
pub struct ApiId(String);

impl ApiId {
    /// Query field name used by the `auth` command (`api_id`).
    pub const FIELD: &'static str = "api_id";

    /// Create a validated [`ApiId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(non_empty_trimmed(value.into(), Self::FIELD)?))
    }

    /// Borrow the validated id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Recipient number in international format.
///
/// Invariant: digits only, country code first, no leading `0` and no `+`.
/// Numbering plans whose significant numbers start with `0` after the
/// country code are still rejected; this mirrors the gateway's own rule.
pub struct Msisdn(String);

impl Msisdn {
    /// Query field name used for recipients (`to`).
    pub const FIELD: &'static str = "to";

    /// Create a validated [`Msisdn`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = non_empty_trimmed(value.into(), Self::FIELD)?;
        let well_formed = !value.starts_with('+')
            && !value.starts_with('0')
            && value.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(ValidationError::InvalidMsisdn { input: value });
        }
        Ok(Self(value))
    }

    /// Borrow the number as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Source address (`from`) shown to the recipient.
///
/// Invariant: either up to 16 digits, or up to 11 ASCII alphanumerics.
pub struct SenderId(String);

impl SenderId {
    /// Query field name used by the gateway (`from`).
    pub const FIELD: &'static str = "from";

    pub const MAX_NUMERIC_LEN: usize = 16;
    pub const MAX_ALPHANUMERIC_LEN: usize = 11;

    /// Create a validated [`SenderId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = non_empty_trimmed(value.into(), Self::FIELD)?;
        let len = value.len();
        let numeric = value.bytes().all(|b| b.is_ascii_digit()) && len <= Self::MAX_NUMERIC_LEN;
        let alphanumeric =
            value.bytes().all(|b| b.is_ascii_alphanumeric()) && len <= Self::MAX_ALPHANUMERIC_LEN;
        if !(numeric || alphanumeric) {
            return Err(ValidationError::InvalidSenderId { input: value });
        }
        Ok(Self(value))
    }

    /// Borrow the validated sender id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SenderId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SenderId> for String {
    fn from(value: SenderId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMS message body.
///
/// Invariant: not empty. Whitespace is kept as-is.
pub struct MessageText(String);

impl MessageText {
    /// Query field name used by the gateway (`text`).
    pub const FIELD: &'static str = "text";

    /// Create a validated [`MessageText`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Batch template text with `#field#` placeholders substituted per item.
pub struct Template(String);

impl Template {
    /// Query field name used by `startbatch` (`template`).
    pub const FIELD: &'static str = "template";

    /// Create a validated [`Template`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Template {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Template> for String {
    fn from(value: Template) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Gateway-issued batch identifier.
pub struct BatchId(String);

impl BatchId {
    /// Query field name used by batch commands (`batch_id`).
    pub const FIELD: &'static str = "batch_id";

    /// Create a validated [`BatchId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(non_empty_trimmed(value.into(), Self::FIELD)?))
    }

    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Reference to a submitted message for `querymsg`.
pub enum MessageRef {
    /// Gateway-assigned id returned by `sendmsg`.
    ApiMsgId(String),
    /// Client-assigned id passed as `climsgid` when sending.
    CliMsgId(String),
}

impl MessageRef {
    pub const API_MSG_ID_FIELD: &'static str = "apimsgid";
    pub const CLI_MSG_ID_FIELD: &'static str = "climsgid";

    /// Reference a message by gateway id.
    pub fn api_msg_id(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self::ApiMsgId(non_empty_trimmed(
            value.into(),
            Self::API_MSG_ID_FIELD,
        )?))
    }

    /// Reference a message by client id.
    pub fn cli_msg_id(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self::CliMsgId(non_empty_trimmed(
            value.into(),
            Self::CLI_MSG_ID_FIELD,
        )?))
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::ApiMsgId(_) => Self::API_MSG_ID_FIELD,
            Self::CliMsgId(_) => Self::CLI_MSG_ID_FIELD,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ApiMsgId(value) | Self::CliMsgId(value) => value,
        }
    }
}
