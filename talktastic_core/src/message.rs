//! Conversation log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::new_message_id;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Selects which payload field of a [`Message`] is authoritative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    Url,
    Buttons,
}

impl MessageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::Url => "url",
            Self::Buttons => "buttons",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            "buttons" => Ok(Self::Buttons),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Button {
    #[must_use]
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            action: None,
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlMetadata {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub url: String,
}

/// One entry of the conversation log.
///
/// `buttons` is only ever set on a [`MessageType::Buttons`] message and
/// `url_metadata` only on a [`MessageType::Url`] message; the constructors
/// drop whichever one the type does not make authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Button>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_metadata: Option<UrlMetadata>,
}

impl Message {
    fn text(sender: Sender, content: String) -> Self {
        Self {
            id: new_message_id(),
            sender,
            timestamp: Utc::now(),
            kind: MessageType::Text,
            content,
            buttons: None,
            url_metadata: None,
        }
    }

    /// A text message typed by the user.
    #[must_use]
    pub fn user_text(content: impl Into<String>) -> Self {
        Self::text(Sender::User, content.into())
    }

    /// A plain text reply from the agent.
    #[must_use]
    pub fn bot_text(content: impl Into<String>) -> Self {
        Self::text(Sender::Bot, content.into())
    }

    /// The empty bot message that marks a response as pending.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::text(Sender::Bot, String::new())
    }

    /// A typed reply from the agent.
    #[must_use]
    pub fn bot(
        kind: MessageType,
        content: impl Into<String>,
        buttons: Option<Vec<Button>>,
        url_metadata: Option<UrlMetadata>,
    ) -> Self {
        let mut message = Self::text(Sender::Bot, content.into());
        message.kind = kind;
        message.buttons = buttons.filter(|_| kind == MessageType::Buttons);
        message.url_metadata = url_metadata.filter(|_| kind == MessageType::Url);
        message
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.sender == Sender::Bot && self.content.is_empty()
    }

    /// Buttons offered by this message, empty unless it is a buttons message.
    #[must_use]
    pub fn button_choices(&self) -> &[Button] {
        self.buttons.as_deref().unwrap_or_default()
    }
}
