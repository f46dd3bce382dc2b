//! Wire format for the agent webhook.
//!
//! Outbound payloads are strongly typed. Inbound bodies are not: the agent
//! is an external workflow that may answer with a typed message object, any
//! other JSON value, plain text or nothing at all. [`decode_response`] turns
//! every one of those into a renderable [`Message`], and reports a
//! [`DecodeError`] only for objects that claim to be a message but cannot be
//! one.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::message::{Button, Message, MessageType, UrlMetadata};
use crate::session::{Session, Sex};
use crate::util::ANONYMOUS_SESSION;

/// Content of a reply that carried none.
pub const NO_CONTENT: &str = "No content provided";

/// Fields whose presence marks an inbound object as a message.
const MESSAGE_FIELDS: [&str; 4] = ["type", "content", "buttons", "urlMetadata"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

/// Profile as echoed on the first turn of a conversation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserPayload {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

/// Identity carried with a button selection; no demographic fields.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ButtonUserPayload {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendPayload {
    pub message: String,
    pub session_id: String,
    pub timestamp: String,
    pub user: Option<UserPayload>,
    pub is_first_message: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Geolocation>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ButtonDescriptor {
    pub value: String,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ButtonPayload {
    pub button: ButtonDescriptor,
    pub session_id: String,
    pub timestamp: String,
    pub user: Option<ButtonUserPayload>,
}

/// Body of one POST to the agent.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OutboundPayload {
    Send(SendPayload),
    Button(ButtonPayload),
}

impl OutboundPayload {
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Send(payload) => &payload.session_id,
            Self::Button(payload) => &payload.session_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Buttons message carries no buttons")]
    MissingButtons,

    #[error("Malformed {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn session_token(session: Option<&Session>) -> String {
    session
        .map(Session::session_id)
        .filter(|id| !id.is_empty())
        .unwrap_or(ANONYMOUS_SESSION)
        .to_string()
}

/// Build the payload for a free-text turn.
///
/// The full profile is only echoed on the first turn of a conversation; the
/// agent is expected to remember it under the session id afterwards.
#[must_use]
pub fn encode_send(
    text: &str,
    session: Option<&Session>,
    is_first_turn: bool,
    location: Option<Geolocation>,
) -> OutboundPayload {
    let user = session.filter(|_| is_first_turn).map(|session| {
        let profile = session.profile();
        UserPayload {
            id: profile.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            age: profile.age,
            location: profile.location.clone(),
            sex: profile.sex,
        }
    });

    OutboundPayload::Send(SendPayload {
        message: text.to_string(),
        session_id: session_token(session),
        timestamp: now_iso8601(),
        user,
        is_first_message: is_first_turn,
        geolocation: location,
    })
}

/// Build the payload for a button click.
#[must_use]
pub fn encode_button_selection(
    value: &str,
    action: Option<&str>,
    session: Option<&Session>,
) -> OutboundPayload {
    let user = session.map(|session| {
        let profile = session.profile();
        ButtonUserPayload {
            id: profile.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
        }
    });

    OutboundPayload::Button(ButtonPayload {
        button: ButtonDescriptor {
            value: value.to_string(),
            action: action.map(str::to_string),
        },
        session_id: session_token(session),
        timestamp: now_iso8601(),
        user,
    })
}

/// Interpret a raw response body as a bot message.
pub fn decode_response(raw: &str) -> Result<Message, DecodeError> {
    decode_with_fallback(raw, NO_CONTENT)
}

/// Like [`decode_response`], but a reply without content acknowledges the
/// selected button instead of reporting missing content.
pub fn decode_button_response(raw: &str, value: &str) -> Result<Message, DecodeError> {
    decode_with_fallback(raw, &format!("You selected: {value}"))
}

fn decode_with_fallback(raw: &str, fallback: &str) -> Result<Message, DecodeError> {
    if raw.trim().is_empty() {
        return Ok(Message::bot_text(fallback));
    }

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!("Response body is not JSON ({e}), using it as text");
            return Ok(Message::bot_text(raw));
        }
    };

    match value {
        Value::Object(map) if MESSAGE_FIELDS.iter().any(|field| map.contains_key(*field)) => {
            decode_object(&map, fallback)
        }
        Value::Null => Ok(Message::bot_text(fallback)),
        Value::String(text) if text.is_empty() => Ok(Message::bot_text(fallback)),
        Value::String(text) => Ok(Message::bot_text(text)),
        other => Ok(Message::bot_text(other.to_string())),
    }
}

fn decode_object(map: &Map<String, Value>, fallback: &str) -> Result<Message, DecodeError> {
    let kind = match map.get("type") {
        None | Some(Value::Null) => MessageType::Text,
        Some(Value::String(name)) => name
            .parse::<MessageType>()
            .map_err(DecodeError::UnknownType)?,
        Some(other) => {
            return Err(DecodeError::Malformed {
                field: "type",
                reason: format!("expected a string, got {other}"),
            });
        }
    };

    let content = match map.get("content") {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::String(text)) if text.is_empty() => fallback.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    let buttons: Option<Vec<Button>> = optional_field(map, "buttons")?;
    let url_metadata: Option<UrlMetadata> = optional_field(map, "urlMetadata")?;

    if kind == MessageType::Buttons && buttons.as_ref().is_none_or(Vec::is_empty) {
        return Err(DecodeError::MissingButtons);
    }

    Ok(Message::bot(kind, content, buttons, url_metadata))
}

fn optional_field<T: serde::de::DeserializeOwned>(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, DecodeError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| DecodeError::Malformed {
                field,
                reason: e.to_string(),
            }),
    }
}
