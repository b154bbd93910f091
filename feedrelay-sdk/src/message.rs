//! Wire messages exchanged between clients and relays.
//!
//! Every message is a JSON array whose first element names the message
//! type, e.g. `["REQ", "sub1", {...filter}]` or `["OK", "<id>", true, ""]`.

use crate::event::Event;
use crate::filter::Filter;
use serde_json::{Value, json};

/// Errors produced while decoding a wire message.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message is not a non-empty array")]
    NotAnArray,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("malformed {0} message")]
    Malformed(&'static str),
}

/// Messages sent from a client to a relay.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `["EVENT", <event>]`
    Event(Box<Event>),
    /// `["REQ", <subscription_id>, <filter>...]`
    Req {
        subscription_id: String,
        filters: Vec<Filter>,
    },
    /// `["CLOSE", <subscription_id>]`
    Close(String),
    /// `["AUTH", <signed auth event>]`
    Auth(Box<Event>),
}

/// Messages sent from a relay to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    /// `["EVENT", <subscription_id>, <event>]`
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    /// `["OK", <event_id>, <accepted>, <message>]`
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
    /// `["EOSE", <subscription_id>]`
    Eose(String),
    /// `["CLOSED", <subscription_id>, <message>]`
    Closed {
        subscription_id: String,
        message: String,
    },
    /// `["NOTICE", <message>]`
    Notice(String),
    /// `["AUTH", <challenge>]`
    Auth(String),
}

fn split(text: &str) -> Result<(String, Vec<Value>), MessageError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(mut items) = value else {
        return Err(MessageError::NotAnArray);
    };
    if items.is_empty() {
        return Err(MessageError::NotAnArray);
    }
    let Value::String(kind) = items.remove(0) else {
        return Err(MessageError::NotAnArray);
    };
    Ok((kind, items))
}

fn string_at(items: &[Value], index: usize, what: &'static str) -> Result<String, MessageError> {
    items
        .get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(MessageError::Malformed(what))
}

fn event_at(items: &mut [Value], index: usize, what: &'static str) -> Result<Box<Event>, MessageError> {
    let value = items
        .get_mut(index)
        .map(Value::take)
        .ok_or(MessageError::Malformed(what))?;
    Ok(Box::new(serde_json::from_value(value)?))
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, MessageError> {
        let (kind, mut items) = split(text)?;
        match kind.as_str() {
            "EVENT" => Ok(Self::Event(event_at(&mut items, 0, "EVENT")?)),
            "AUTH" => Ok(Self::Auth(event_at(&mut items, 0, "AUTH")?)),
            "CLOSE" => Ok(Self::Close(string_at(&items, 0, "CLOSE")?)),
            "REQ" => {
                let subscription_id = string_at(&items, 0, "REQ")?;
                let filters = items
                    .into_iter()
                    .skip(1)
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<Filter>, _>>()?;
                Ok(Self::Req {
                    subscription_id,
                    filters,
                })
            }
            _ => Err(MessageError::UnknownType(kind)),
        }
    }

    pub fn to_json(&self) -> String {
        let value = match self {
            Self::Event(event) => json!(["EVENT", event]),
            Self::Auth(event) => json!(["AUTH", event]),
            Self::Close(id) => json!(["CLOSE", id]),
            Self::Req {
                subscription_id,
                filters,
            } => {
                let mut items = vec![json!("REQ"), json!(subscription_id)];
                items.extend(filters.iter().map(|filter| json!(filter)));
                Value::Array(items)
            }
        };
        value.to_string()
    }
}

impl RelayMessage {
    pub fn from_json(text: &str) -> Result<Self, MessageError> {
        let (kind, mut items) = split(text)?;
        match kind.as_str() {
            "EVENT" => Ok(Self::Event {
                subscription_id: string_at(&items, 0, "EVENT")?,
                event: event_at(&mut items, 1, "EVENT")?,
            }),
            "OK" => Ok(Self::Ok {
                event_id: string_at(&items, 0, "OK")?,
                accepted: items
                    .get(1)
                    .and_then(Value::as_bool)
                    .ok_or(MessageError::Malformed("OK"))?,
                message: items
                    .get(2)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
            "EOSE" => Ok(Self::Eose(string_at(&items, 0, "EOSE")?)),
            "CLOSED" => Ok(Self::Closed {
                subscription_id: string_at(&items, 0, "CLOSED")?,
                message: items
                    .get(1)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
            "NOTICE" => Ok(Self::Notice(string_at(&items, 0, "NOTICE")?)),
            "AUTH" => Ok(Self::Auth(string_at(&items, 0, "AUTH")?)),
            _ => Err(MessageError::UnknownType(kind)),
        }
    }

    pub fn to_json(&self) -> String {
        let value = match self {
            Self::Event {
                subscription_id,
                event,
            } => json!(["EVENT", subscription_id, event]),
            Self::Ok {
                event_id,
                accepted,
                message,
            } => json!(["OK", event_id, accepted, message]),
            Self::Eose(id) => json!(["EOSE", id]),
            Self::Closed {
                subscription_id,
                message,
            } => json!(["CLOSED", subscription_id, message]),
            Self::Notice(message) => json!(["NOTICE", message]),
            Self::Auth(challenge) => json!(["AUTH", challenge]),
        };
        value.to_string()
    }
}
