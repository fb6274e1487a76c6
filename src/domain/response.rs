use std::collections::BTreeMap;

/// One parsed line of a gateway reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The trimmed line exactly as received, kept for diagnostics.
    pub raw: String,
    pub kind: ResponseKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    Ok(Payload),
    Err(ErrorReply),
    /// Message submission id, e.g. `ID: 1a2b To: 27123456781`.
    Id(Payload),
    Credit(f64),
    ApiMsgId(Payload),
}

/// Primary value of a line plus any embedded `Key: value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub value: String,
    pub extra: BTreeMap<String, String>,
}

impl Payload {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReply {
    pub code: i32,
    pub reason: String,
}

impl Response {
    /// Payload of `Ok`, `Id` and `ApiMsgId` lines.
    pub fn payload(&self) -> Option<&Payload> {
        match &self.kind {
            ResponseKind::Ok(payload) | ResponseKind::Id(payload) | ResponseKind::ApiMsgId(payload) => {
                Some(payload)
            }
            ResponseKind::Err(_) | ResponseKind::Credit(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorReply> {
        match &self.kind {
            ResponseKind::Err(reply) => Some(reply),
            _ => None,
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self.kind, ResponseKind::Err(_))
    }

    /// Recipient this line reports on, when the gateway included a `To:` field.
    pub fn to(&self) -> Option<&str> {
        self.payload().and_then(|payload| payload.get("To"))
    }
}
