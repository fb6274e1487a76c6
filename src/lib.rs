//! Typed Rust client for the Clickatell HTTP API.
//!
//! The crate is split into a domain layer of validated types, a transport
//! layer for the gateway's line-oriented reply format, and a client layer that
//! owns the session token and orchestrates commands.
//!
//! ```rust,no_run
//! use clickatell::{ClickatellClient, Credentials, MessageText, Msisdn, SendMsg, SendOptions, SenderId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), clickatell::ClickatellError> {
//!     let mut client = ClickatellClient::new(Credentials::new("user", "password", "3456789")?);
//!     let request = SendMsg::one(
//!         Msisdn::new("27123456781")?,
//!         SenderId::new("Acme")?,
//!         MessageText::new("hello")?,
//!         SendOptions::default(),
//!     );
//!     for record in client.send_msg(request).await? {
//!         println!("{}", record.raw);
//!     }
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
mod transport;

pub use client::{
    Batch, ClickatellClient, ClickatellClientBuilder, ClickatellError, Credentials,
    DEFAULT_SESSION_TIMEOUT, HttpRequest, HttpResponse, HttpTransport, Method, SessionManager,
    SessionSnapshot,
};
pub use domain::{
    BatchId, BatchOptions, Callback, ErrorReply, Features, MessageRef, MessageText, MessageType,
    Msisdn, Payload, Queue, Response, ResponseKind, SendMsg, SendOptions, SenderId, Template,
    TemplateContext, ValidationError,
};
pub use transport::{ParseError, Tag, dispatch, parse_body, parse_line};
