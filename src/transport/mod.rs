//! Transport layer: wire-format details (parameter encoding, reply parsing).

mod encode;
mod parse;

pub use encode::{
    encode_auth, encode_end_batch, encode_msg_charge, encode_query_msg, encode_route_coverage,
    encode_send_item, encode_send_msg, encode_session, encode_start_batch,
};
pub use parse::{ParseError, Tag, dispatch, parse_body, parse_line};
