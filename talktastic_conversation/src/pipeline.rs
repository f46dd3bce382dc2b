//! The conversation pipeline.
//!
//! `ConversationPipeline` is the only writer of the conversation log. Each
//! turn runs Idle -> Pending -> {Resolved | Failed} -> Idle:
//!
//! - on submit the user message and a placeholder bot message are appended
//!   together, under one lock, before the request is sent;
//! - while a turn is pending every further submit or button click is
//!   rejected, not queued;
//! - the placeholder is removed by id and replaced by exactly one terminal
//!   bot message: the decoded reply or a fixed error text.
//!
//! A turn whose future is dropped before it settles removes its own
//! placeholder, so the log never keeps a dangling one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use talktastic_core::{
    Button, DecodeError, Geolocation, Message, OutboundPayload, Session, Transport,
    TransportError, decode_button_response, decode_response, encode_button_selection, encode_send,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::log::ConversationLog;

/// Reply shown when a text turn cannot reach the agent.
pub const CONNECTION_ERROR: &str =
    "Sorry, I encountered an error connecting to the AI service. Please try again later.";

/// Reply shown when the agent answered with something that is not a message.
pub const UNEXPECTED_FORMAT: &str =
    "I received your message but got an unexpected response format.";

/// Default greeting seeded into a new log.
pub const DEFAULT_WELCOME: &str = "Welcome to Talktastic Hub! How can I help you today?";

fn button_error(value: &str) -> String {
    format!("You selected: {value}. (Error: Could not connect to AI service)")
}

/// Configuration for a conversation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Agent webhook URL
    pub endpoint: String,
    /// Signed-in user, read but never modified
    pub session: Option<Session>,
    /// Location hint sent with text turns
    pub location: Option<Geolocation>,
    /// Greeting placed at the top of every new log
    pub welcome_message: Option<String>,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            session: None,
            location: None,
            welcome_message: None,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }

    #[must_use]
    pub const fn with_location(mut self, location: Option<Geolocation>) -> Self {
        self.location = location;
        self
    }

    /// Blank greetings are dropped.
    #[must_use]
    pub fn with_welcome_message(mut self, welcome: Option<String>) -> Self {
        self.welcome_message = welcome.filter(|text| !text.trim().is_empty());
        self
    }

    fn welcome(&self) -> Option<Message> {
        self.welcome_message
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(Message::bot_text)
    }
}

/// Where the pipeline is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Pending { placeholder: Uuid },
}

/// Why a submission was turned away before anything was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Input was empty after trimming
    EmptyInput,
    /// Another turn is still pending
    Busy,
    /// The referenced button does not exist in the log
    UnknownButton,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The agent's reply was appended
    Resolved(Message),
    /// The round trip failed and an error reply was appended
    Failed(Message),
    /// Nothing was appended
    Rejected(Rejection),
}

impl SubmitOutcome {
    /// The bot message this submission appended, if any.
    #[must_use]
    pub const fn reply(&self) -> Option<&Message> {
        match self {
            Self::Resolved(message) | Self::Failed(message) => Some(message),
            Self::Rejected(_) => None,
        }
    }
}

#[derive(Debug)]
struct PipelineState {
    log: ConversationLog,
    pending: Option<Uuid>,
    is_first_turn: bool,
}

fn lock(state: &Mutex<PipelineState>) -> MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What a turn sends, and how its reply and failure are rendered.
#[derive(Clone, Copy)]
enum TurnRequest<'a> {
    Text(&'a str),
    Button(&'a Button),
}

/// Ownership of the single in-flight slot.
///
/// Settling it appends the terminal message; dropping it unsettled only
/// removes the placeholder.
struct InFlight<'a> {
    state: &'a Mutex<PipelineState>,
    placeholder: Uuid,
    is_first_turn: bool,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, reply: Result<Message, Message>) -> SubmitOutcome {
        let mut state = lock(self.state);
        let (message, resolved) = match reply {
            Ok(message) => (message, true),
            Err(message) => (message, false),
        };

        if !state.log.replace(self.placeholder, message.clone()) {
            warn!("Placeholder {} was already gone", self.placeholder);
        }
        state.pending = None;
        if resolved {
            state.is_first_turn = false;
        }
        self.settled = true;

        if resolved {
            SubmitOutcome::Resolved(message)
        } else {
            SubmitOutcome::Failed(message)
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = lock(self.state);
        state.log.remove(self.placeholder);
        state.pending = None;
        warn!("Turn abandoned before the agent replied");
    }
}

pub struct ConversationPipeline<T = Arc<dyn Transport>>
where
    T: Transport,
{
    transport: T,
    config: PipelineConfig,
    state: Mutex<PipelineState>,
}

impl<T: Transport> ConversationPipeline<T> {
    pub fn new(transport: T, config: PipelineConfig) -> Self {
        info!("Creating conversation pipeline for {}", config.endpoint);
        let mut log = ConversationLog::new();
        if let Some(welcome) = config.welcome() {
            log.push(welcome);
        }

        Self {
            transport,
            config,
            state: Mutex::new(PipelineState {
                log,
                pending: None,
                is_first_turn: true,
            }),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Point subsequent turns at a different endpoint.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.config.endpoint = endpoint.into();
        info!("Endpoint set to {}", self.config.endpoint);
    }

    /// Snapshot of the log.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).log.messages().to_vec()
    }

    /// Whether a turn is pending; submissions are disabled while it is.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    #[must_use]
    pub fn is_first_turn(&self) -> bool {
        lock(&self.state).is_first_turn
    }

    #[must_use]
    pub fn turn_state(&self) -> TurnState {
        match lock(&self.state).pending {
            Some(placeholder) => TurnState::Pending { placeholder },
            None => TurnState::Idle,
        }
    }

    /// The most recent buttons message in the log.
    #[must_use]
    pub fn latest_buttons(&self) -> Option<Message> {
        lock(&self.state).log.latest_buttons().cloned()
    }

    /// Button `index` of message `message_id`.
    #[must_use]
    pub fn find_button(&self, message_id: Uuid, index: usize) -> Option<Button> {
        lock(&self.state).log.button(message_id, index).cloned()
    }

    /// Start a new conversation. Refused while a turn is pending.
    pub fn reset(&self) -> bool {
        let mut state = lock(&self.state);
        if state.pending.is_some() {
            return false;
        }

        state.log.clear();
        if let Some(welcome) = self.config.welcome() {
            state.log.push(welcome);
        }
        state.is_first_turn = true;
        info!("Conversation reset");
        true
    }

    /// Send free text to the agent.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Rejected(Rejection::EmptyInput);
        }
        self.run_turn(Message::user_text(text), TurnRequest::Text(text))
            .await
    }

    /// Send a button selection to the agent.
    pub async fn click_button(&self, button: &Button) -> SubmitOutcome {
        let echo = Message::user_text(format!("Selected: {}", button.value));
        self.run_turn(echo, TurnRequest::Button(button)).await
    }

    /// Click button `index` of the buttons message `message_id`.
    pub async fn select_button(&self, message_id: Uuid, index: usize) -> SubmitOutcome {
        let Some(button) = self.find_button(message_id, index) else {
            return SubmitOutcome::Rejected(Rejection::UnknownButton);
        };
        self.click_button(&button).await
    }

    /// Claim the in-flight slot and append the user message and placeholder.
    fn begin_turn(&self, user_message: Message) -> Option<InFlight<'_>> {
        let mut state = lock(&self.state);
        if state.pending.is_some() {
            debug!("Submission rejected, a turn is already pending");
            return None;
        }

        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id;
        state.log.push(user_message);
        state.log.push(placeholder);
        state.pending = Some(placeholder_id);

        Some(InFlight {
            state: &self.state,
            placeholder: placeholder_id,
            is_first_turn: state.is_first_turn,
            settled: false,
        })
    }

    async fn run_turn(&self, user_message: Message, request: TurnRequest<'_>) -> SubmitOutcome {
        let Some(turn) = self.begin_turn(user_message) else {
            return SubmitOutcome::Rejected(Rejection::Busy);
        };

        let session = self.config.session.as_ref();
        let payload: OutboundPayload = match request {
            TurnRequest::Text(text) => {
                encode_send(text, session, turn.is_first_turn, self.config.location)
            }
            TurnRequest::Button(button) => {
                encode_button_selection(&button.value, button.action.as_deref(), session)
            }
        };

        let reply = match self.transport.post(&self.config.endpoint, &payload).await {
            Ok(raw) => Ok(Self::interpret(&raw, &request)),
            Err(e) => Err(Self::failure(&e, &request)),
        };

        turn.settle(reply)
    }

    fn interpret(raw: &str, request: &TurnRequest<'_>) -> Message {
        let decoded: Result<Message, DecodeError> = match request {
            TurnRequest::Text(_) => decode_response(raw),
            TurnRequest::Button(button) => decode_button_response(raw, &button.value),
        };

        decoded.unwrap_or_else(|e| {
            warn!("Could not interpret agent response ({e}): {raw}");
            Message::bot_text(UNEXPECTED_FORMAT)
        })
    }

    fn failure(e: &TransportError, request: &TurnRequest<'_>) -> Message {
        match request {
            TurnRequest::Text(_) => {
                error!("Error sending message to webhook: {e}");
                Message::bot_text(CONNECTION_ERROR)
            }
            TurnRequest::Button(button) => {
                error!("Error handling button click: {e}");
                Message::bot_text(button_error(&button.value))
            }
        }
    }
}
