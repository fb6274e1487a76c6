//! Gateway reply grammar: `TAG: remainder` lines, where the remainder may
//! embed further `Key: value` pairs.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{ErrorReply, Payload, Response, ResponseKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("response line has no `TAG:` prefix: {line:?}")]
    MissingTag { line: String },

    #[error("unknown response tag {tag:?} in line {line:?}")]
    UnknownResponseTag { tag: String, line: String },

    #[error("malformed ERR response (expected `<code>, <reason>`): {line:?}")]
    MalformedErrorResponse { line: String },

    #[error("malformed Credit response (expected a number): {line:?}")]
    MalformedCreditResponse { line: String },
}

/// Leading tag of a reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Ok,
    Err,
    Id,
    Credit,
    ApiMsgId,
}

impl Tag {
    /// Case-insensitive lookup; `None` for tags without a handler.
    pub fn lookup(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        [
            ("ok", Self::Ok),
            ("err", Self::Err),
            ("id", Self::Id),
            ("credit", Self::Credit),
            ("apimsgid", Self::ApiMsgId),
        ]
        .into_iter()
        .find_map(|(name, kind)| tag.eq_ignore_ascii_case(name).then_some(kind))
    }
}

/// Parse a whole reply body into records, one per non-blank line, in order.
pub fn parse_body(body: &str) -> Result<Vec<Response>, ParseError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

/// Split a line on its first `:` and dispatch the remainder by tag.
pub fn parse_line(line: &str) -> Result<Response, ParseError> {
    let line = line.trim();
    let Some((tag, remainder)) = line.split_once(':') else {
        return Err(ParseError::MissingTag {
            line: line.to_owned(),
        });
    };
    dispatch(tag, remainder, line)
}

/// Route `remainder` to the parser registered for `tag`.
pub fn dispatch(tag: &str, remainder: &str, line: &str) -> Result<Response, ParseError> {
    let Some(tag) = Tag::lookup(tag) else {
        return Err(ParseError::UnknownResponseTag {
            tag: tag.trim().to_owned(),
            line: line.to_owned(),
        });
    };
    parse(tag, remainder, line)
}

pub fn parse(tag: Tag, remainder: &str, line: &str) -> Result<Response, ParseError> {
    let kind = match tag {
        Tag::Ok => ResponseKind::Ok(extract_payload(remainder)),
        Tag::Id => ResponseKind::Id(extract_payload(remainder)),
        Tag::ApiMsgId => ResponseKind::ApiMsgId(extract_payload(remainder)),
        Tag::Err => ResponseKind::Err(parse_error_reply(remainder, line)?),
        Tag::Credit => ResponseKind::Credit(parse_credit(remainder, line)?),
    };
    Ok(Response {
        raw: line.to_owned(),
        kind,
    })
}

fn extra_field_re() -> &'static Regex {
    static EXTRA_FIELD_RE: OnceLock<Regex> = OnceLock::new();
    // Values may carry a decimal fraction (`Charge: 0.8`).
    EXTRA_FIELD_RE
        .get_or_init(|| Regex::new(r"([A-Za-z]+):\s*([A-Za-z0-9]+(?:\.[0-9]+)?)").unwrap())
}

fn next_extra_field(text: &str) -> Option<(Range<usize>, String, String)> {
    let captures = extra_field_re().captures(text)?;
    let whole = captures.get(0)?;
    Some((
        whole.range(),
        captures[1].to_owned(),
        captures[2].to_owned(),
    ))
}

/// Pull every `Key: value` pair out of `text`; what is left is the value.
///
/// Each match is at least three bytes long and is removed before the next
/// search, so the loop always terminates.
pub fn extract_payload(text: &str) -> Payload {
    let mut rest = text.to_owned();
    let mut extra = BTreeMap::new();
    while let Some((range, key, value)) = next_extra_field(&rest) {
        rest.replace_range(range, "");
        extra.insert(key, value);
    }
    Payload {
        value: rest.trim().to_owned(),
        extra,
    }
}

fn parse_error_reply(remainder: &str, line: &str) -> Result<ErrorReply, ParseError> {
    let (code, reason) = remainder.split_once(", ").unwrap_or((remainder, ""));
    let code = code
        .trim()
        .parse::<i32>()
        .map_err(|_| ParseError::MalformedErrorResponse {
            line: line.to_owned(),
        })?;
    Ok(ErrorReply {
        code,
        reason: reason.trim().to_owned(),
    })
}

fn parse_credit(remainder: &str, line: &str) -> Result<f64, ParseError> {
    remainder
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::MalformedCreditResponse {
            line: line.to_owned(),
        })
}
