use crate::domain::{
    ApiId, BatchId, BatchOptions, MessageRef, MessageText, Msisdn, Password, SendMsg, SendOptions,
    SenderId, Template, TemplateContext, Username,
};

/// Query field carrying the session token on every authenticated command.
pub const SESSION_FIELD: &str = "session_id";

type Params = Vec<(String, String)>;

fn param(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_owned(), value.into())
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

pub fn encode_session(token: &str) -> Params {
    vec![param(SESSION_FIELD, token)]
}

pub fn encode_auth(username: &Username, password: &Password, api_id: &ApiId) -> Params {
    vec![
        param(Username::FIELD, username.as_str()),
        param(Password::FIELD, password.as_str()),
        param(ApiId::FIELD, api_id.as_str()),
    ]
}

/// `options` must already be merged with the client defaults.
pub fn encode_send_msg(request: &SendMsg, options: &SendOptions) -> Params {
    let to = request
        .recipients()
        .iter()
        .map(Msisdn::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut params = vec![
        param(Msisdn::FIELD, to),
        param(SenderId::FIELD, request.sender().as_str()),
        param(MessageText::FIELD, request.text().as_str()),
    ];
    push_options(&mut params, options);
    params
}

pub fn encode_query_msg(reference: &MessageRef) -> Params {
    vec![param(reference.field(), reference.as_str())]
}

pub fn encode_msg_charge(api_msg_id: &str) -> Params {
    vec![param(MessageRef::API_MSG_ID_FIELD, api_msg_id)]
}

pub fn encode_route_coverage(msisdn: &Msisdn) -> Params {
    vec![param("msisdn", msisdn.as_str())]
}

pub fn encode_start_batch(template: &Template, options: &BatchOptions) -> Params {
    let mut params = vec![param(Template::FIELD, template.as_str())];
    if let Some(from) = options.from.as_ref() {
        params.push(param(SenderId::FIELD, from.as_str()));
    }
    push_options(&mut params, &options.options);
    params
}

/// Template fields in `context` override same-named entries in `options.extra`.
pub fn encode_send_item(
    batch_id: &BatchId,
    to: &Msisdn,
    context: &TemplateContext,
    options: &SendOptions,
) -> Params {
    let mut options = options.clone();
    options
        .extra
        .extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut params = vec![
        param(BatchId::FIELD, batch_id.as_str()),
        param(Msisdn::FIELD, to.as_str()),
    ];
    push_options(&mut params, &options);
    params
}

pub fn encode_end_batch(batch_id: &BatchId) -> Params {
    vec![param(BatchId::FIELD, batch_id.as_str())]
}

fn push_options(params: &mut Params, options: &SendOptions) {
    if let Some(callback) = options.callback {
        params.push(param("callback", callback.code().to_string()));
    }
    if let Some(req_feat) = options.req_feat {
        params.push(param("req_feat", req_feat.bits().to_string()));
    }
    if let Some(queue) = options.queue {
        params.push(param("queue", queue.code().to_string()));
    }
    if let Some(msg_type) = options.msg_type {
        params.push(param("msg_type", msg_type.as_str()));
    }
    if let Some(deliv_ack) = options.deliv_ack {
        params.push(param("deliv_ack", flag(deliv_ack)));
    }
    if let Some(concat) = options.concat {
        params.push(param("concat", concat.to_string()));
    }
    if let Some(climsgid) = options.climsgid.as_deref() {
        params.push(param(MessageRef::CLI_MSG_ID_FIELD, climsgid));
    }
    if let Some(mo) = options.mo {
        params.push(param("mo", flag(mo)));
    }
    if let Some(escalate) = options.escalate {
        params.push(param("escalate", flag(escalate)));
    }
    if let Some(deliv_time) = options.deliv_time {
        params.push(param("deliv_time", deliv_time.to_string()));
    }
    for (key, value) in &options.extra {
        params.push(param(key, value.as_str()));
    }
}
