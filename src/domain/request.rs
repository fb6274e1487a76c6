use std::collections::BTreeMap;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;
use crate::domain::value::{MessageText, Msisdn, SenderId, Template};

/// Per-recipient template substitutions for a batch item (`field` -> value).
pub type TemplateContext = BTreeMap<String, String>;

/// Which delivery statuses the gateway posts back to the account's callback URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Callback {
    None,
    Intermediate,
    Final,
    All,
}

impl Callback {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Intermediate => 1,
            Self::Final => 2,
            Self::All => 3,
        }
    }
}

/// Required-feature bitmask (`req_feat`).
///
/// The gateway only routes through carriers supporting every set feature.
/// Combine flags with `|`, e.g. `Features::NUMER | Features::FLASH` is `544`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features(u32);

impl Features {
    pub const TEXT: Self = Self(1);
    pub const EIGHT_BIT: Self = Self(2);
    pub const UDH: Self = Self(4);
    pub const UCS2: Self = Self(8);
    pub const ALPHA: Self = Self(16);
    pub const NUMER: Self = Self(32);
    pub const FLASH: Self = Self(512);
    pub const DELIVACK: Self = Self(8192);
    pub const CONCAT: Self = Self(16384);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Features {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Account-local delivery queue; high is always drained before medium and low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    High,
    Medium,
    Low,
}

impl Queue {
    pub fn code(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// Predefined message types, so callers never set the UDH by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageType {
    #[default]
    #[serde(rename = "SMS_TEXT")]
    Text,
    #[serde(rename = "SMS_FLASH")]
    Flash,
    #[serde(rename = "SMS_NOKIA_OLOGO")]
    NokiaOperatorLogo,
    #[serde(rename = "SMS_NOKIA_GLOGO")]
    NokiaGroupLogo,
    #[serde(rename = "SMS_NOKIA_PICTURE")]
    NokiaPicture,
    #[serde(rename = "SMS_NOKIA_RINGTONE")]
    NokiaRingtone,
    #[serde(rename = "SMS_NOKIA_RTTL")]
    NokiaRtttl,
    #[serde(rename = "SMS_NOKIA_CLEAN")]
    NokiaClean,
    #[serde(rename = "SMS_NOKIA_VCARD")]
    NokiaVcard,
    #[serde(rename = "SMS_NOKIA_VCAL")]
    NokiaVcal,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "SMS_TEXT",
            Self::Flash => "SMS_FLASH",
            Self::NokiaOperatorLogo => "SMS_NOKIA_OLOGO",
            Self::NokiaGroupLogo => "SMS_NOKIA_GLOGO",
            Self::NokiaPicture => "SMS_NOKIA_PICTURE",
            Self::NokiaRingtone => "SMS_NOKIA_RINGTONE",
            Self::NokiaRtttl => "SMS_NOKIA_RTTL",
            Self::NokiaClean => "SMS_NOKIA_CLEAN",
            Self::NokiaVcard => "SMS_NOKIA_VCARD",
            Self::NokiaVcal => "SMS_NOKIA_VCAL",
        }
    }
}

/// Optional `sendmsg`/`startbatch` parameters.
///
/// Unset fields are omitted from the request. Instance-level defaults are
/// configured once on the client and merged into every call with
/// [`SendOptions::merged_over`]; values set on the call win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendOptions {
    pub callback: Option<Callback>,
    pub req_feat: Option<Features>,
    pub queue: Option<Queue>,
    pub msg_type: Option<MessageType>,
    pub deliv_ack: Option<bool>,
    pub concat: Option<u8>,
    pub climsgid: Option<String>,
    /// Route replies back to the account (two-way). Needs a sender id.
    pub mo: Option<bool>,
    pub escalate: Option<bool>,
    /// Delay delivery by this many minutes.
    pub deliv_time: Option<u32>,
    /// Any further gateway parameters, sent verbatim.
    pub extra: BTreeMap<String, String>,
}

impl SendOptions {
    /// Overlay `self` on top of `defaults`.
    pub fn merged_over(&self, defaults: &SendOptions) -> SendOptions {
        let mut extra = defaults.extra.clone();
        extra.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        SendOptions {
            callback: self.callback.or(defaults.callback),
            req_feat: self.req_feat.or(defaults.req_feat),
            queue: self.queue.or(defaults.queue),
            msg_type: self.msg_type.or(defaults.msg_type),
            deliv_ack: self.deliv_ack.or(defaults.deliv_ack),
            concat: self.concat.or(defaults.concat),
            climsgid: self.climsgid.clone().or_else(|| defaults.climsgid.clone()),
            mo: self.mo.or(defaults.mo),
            escalate: self.escalate.or(defaults.escalate),
            deliv_time: self.deliv_time.or(defaults.deliv_time),
            extra,
        }
    }

    /// Check options that only make sense together with another parameter,
    /// and that no `extra` key shadows a parameter the client sets itself.
    pub fn check(&self, from: Option<&SenderId>) -> Result<(), ValidationError> {
        if self.mo == Some(true) && from.is_none() {
            return Err(ValidationError::MissingOption {
                option: SenderId::FIELD,
                required_by: "mo",
            });
        }
        reject_reserved(self.extra.keys())
    }
}

/// Parameters encoded from typed fields; never accepted as free-form keys.
const RESERVED_FIELDS: &[&str] = &[
    "session_id",
    "user",
    "password",
    "api_id",
    "to",
    "from",
    "text",
    "template",
    "batch_id",
    "msisdn",
    "apimsgid",
    "climsgid",
    "callback",
    "req_feat",
    "queue",
    "msg_type",
    "deliv_ack",
    "concat",
    "mo",
    "escalate",
    "deliv_time",
];

/// Fail on the first key that would duplicate a typed parameter (ASCII case-insensitive).
pub(crate) fn reject_reserved<'a>(
    keys: impl IntoIterator<Item = &'a String>,
) -> Result<(), ValidationError> {
    match keys.into_iter().find(|key| {
        RESERVED_FIELDS
            .iter()
            .any(|reserved| key.eq_ignore_ascii_case(reserved))
    }) {
        Some(key) => Err(ValidationError::ReservedField { key: key.clone() }),
        None => Ok(()),
    }
}

/// A validated `sendmsg` request.
#[derive(Debug, Clone)]
pub struct SendMsg {
    recipients: Vec<Msisdn>,
    from: SenderId,
    text: MessageText,
    options: SendOptions,
}

impl SendMsg {
    /// Send one text to every recipient in a single gateway call.
    pub fn to_many(
        recipients: Vec<Msisdn>,
        from: SenderId,
        text: MessageText,
        options: SendOptions,
    ) -> Result<Self, ValidationError> {
        if recipients.is_empty() {
            return Err(ValidationError::Empty {
                field: Msisdn::FIELD,
            });
        }
        Ok(Self {
            recipients,
            from,
            text,
            options,
        })
    }

    /// Send one text to a single recipient.
    pub fn one(to: Msisdn, from: SenderId, text: MessageText, options: SendOptions) -> Self {
        Self {
            recipients: vec![to],
            from,
            text,
            options,
        }
    }

    pub fn recipients(&self) -> &[Msisdn] {
        &self.recipients
    }

    pub fn sender(&self) -> &SenderId {
        &self.from
    }

    pub fn text(&self) -> &MessageText {
        &self.text
    }

    pub fn options(&self) -> &SendOptions {
        &self.options
    }
}

/// Batch-level parameters shared by every item sent in the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub template: Option<Template>,
    pub from: Option<SenderId>,
    pub options: SendOptions,
}

impl BatchOptions {
    pub fn new(template: Template) -> Self {
        Self {
            template: Some(template),
            ..Default::default()
        }
    }

    pub fn with_sender(mut self, from: SenderId) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_options(mut self, options: SendOptions) -> Self {
        self.options = options;
        self
    }

    /// Copy with the client-level send defaults filled in.
    pub fn merged_over(&self, defaults: &SendOptions) -> BatchOptions {
        BatchOptions {
            template: self.template.clone(),
            from: self.from.clone(),
            options: self.options.merged_over(defaults),
        }
    }

    /// Everything `startbatch` needs before it may hit the network.
    pub fn check(&self) -> Result<&Template, ValidationError> {
        self.options.check(self.from.as_ref())?;
        self.template.as_ref().ok_or(ValidationError::MissingOption {
            option: Template::FIELD,
            required_by: "startbatch",
        })
    }
}
