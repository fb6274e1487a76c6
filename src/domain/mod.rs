//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod validation;
mod value;

pub use request::{
    BatchOptions, Callback, Features, MessageType, Queue, SendMsg, SendOptions, TemplateContext,
};
pub(crate) use request::reject_reserved;
pub use response::{ErrorReply, Payload, Response, ResponseKind};
pub use validation::ValidationError;
pub use value::{
    ApiId, BatchId, MessageRef, MessageText, Msisdn, Password, SenderId, Template, Username,
};
