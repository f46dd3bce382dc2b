//! Integration tests for the conversation pipeline.
//!
//! These tests verify that:
//! - A submit appends the user message and a placeholder before the round
//!   trip completes, and the placeholder resolves to exactly one reply
//! - Failures become bot error messages without touching the user message
//! - A second submission while a turn is pending is rejected
//! - Button clicks share the in-flight slot and send the narrow payload

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use talktastic_conversation::{
    CONNECTION_ERROR, ConversationPipeline, DEFAULT_WELCOME, PipelineConfig, Rejection,
    SubmitOutcome, TurnState, UNEXPECTED_FORMAT,
};
use talktastic_core::{
    Button, MessageType, OutboundPayload, Profile, Sender, Session, Sex, Transport,
    TransportError,
};
use tokio::sync::Notify;
use uuid::Uuid;

const ENDPOINT: &str = "https://n8n.example.com/webhook/chat";

/// Replays scripted responses and records every payload it was given.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<String, TransportError>>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<String, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(
        &self,
        endpoint: &str,
        payload: &OutboundPayload,
    ) -> Result<String, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), serde_json::to_value(payload).unwrap()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
    }
}

/// Holds every request until released.
#[derive(Default)]
struct GatedTransport {
    received: Notify,
    release: Notify,
}

#[async_trait]
impl Transport for GatedTransport {
    async fn post(
        &self,
        _endpoint: &str,
        _payload: &OutboundPayload,
    ) -> Result<String, TransportError> {
        self.received.notify_one();
        self.release.notified().await;
        Ok(r#"{"type":"text","content":"done"}"#.to_string())
    }
}

fn session() -> Session {
    let mut profile = Profile::new("u1", "Ada", "ada@example.com");
    profile.age = Some(36);
    profile.location = Some("London".to_string());
    profile.sex = Some(Sex::Female);
    Session::begin(profile)
}

fn pipeline<T: Transport>(transport: T) -> ConversationPipeline<T> {
    ConversationPipeline::new(
        transport,
        PipelineConfig::new(ENDPOINT).with_session(Some(session())),
    )
}

#[tokio::test]
async fn test_text_reply_resolves_turn() {
    let transport = ScriptedTransport::new(vec![Ok(
        r#"{"type":"text","content":"hi there"}"#.to_string()
    )]);
    let chat = pipeline(transport.clone());
    assert!(chat.is_first_turn());

    let outcome = chat.submit("hello").await;
    assert!(matches!(outcome, SubmitOutcome::Resolved(ref m) if m.content == "hi there"));

    let log = chat.messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].sender, Sender::User);
    assert_eq!(log[0].content, "hello");
    assert_eq!(log[1].sender, Sender::Bot);
    assert_eq!(log[1].content, "hi there");
    assert!(!chat.is_first_turn());
    assert!(!chat.is_submitting());
    assert_eq!(chat.turn_state(), TurnState::Idle);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, ENDPOINT);
    assert_eq!(requests[0].1["isFirstMessage"], true);
    assert_eq!(requests[0].1["user"]["sex"], "female");
}

#[tokio::test]
async fn test_profile_only_sent_on_first_turn() {
    let transport = ScriptedTransport::new(vec![
        Ok(r#"{"content":"one"}"#.to_string()),
        Ok(r#"{"content":"two"}"#.to_string()),
    ]);
    let chat = pipeline(transport.clone());

    chat.submit("first").await;
    chat.submit("second").await;

    let requests = transport.requests();
    assert_eq!(requests[0].1["isFirstMessage"], true);
    assert_eq!(requests[0].1["user"]["name"], "Ada");
    assert_eq!(requests[1].1["isFirstMessage"], false);
    assert!(requests[1].1["user"].is_null());
    assert_eq!(requests[0].1["sessionId"], requests[1].1["sessionId"]);
}

#[tokio::test]
async fn test_http_error_becomes_bot_message() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Status { status: 500 })]);
    let chat = pipeline(transport);

    let outcome = chat.submit("hello").await;
    assert!(matches!(outcome, SubmitOutcome::Failed(_)));

    let log = chat.messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].content, "hello");
    assert_eq!(log[1].sender, Sender::Bot);
    assert_eq!(log[1].kind, MessageType::Text);
    assert_eq!(log[1].content, CONNECTION_ERROR);
    assert!(chat.is_first_turn());
    assert!(!chat.is_submitting());
}

#[tokio::test]
async fn test_network_error_becomes_bot_message() {
    let transport =
        ScriptedTransport::new(vec![Err(TransportError::Network("connection refused".into()))]);
    let chat = pipeline(transport);

    chat.submit("hello").await;
    let log = chat.messages();
    assert_eq!(log.last().unwrap().content, CONNECTION_ERROR);
    assert!(log.iter().all(|m| !m.is_placeholder()));
}

#[tokio::test]
async fn test_plain_text_and_empty_replies() {
    let transport = ScriptedTransport::new(vec![
        Ok("Workflow was started".to_string()),
        Ok(String::new()),
    ]);
    let chat = pipeline(transport);

    chat.submit("one").await;
    chat.submit("two").await;

    let log = chat.messages();
    assert_eq!(log[1].content, "Workflow was started");
    assert_eq!(log[3].content, "No content provided");
}

#[tokio::test]
async fn test_undecodable_reply_is_degraded() {
    let transport = ScriptedTransport::new(vec![Ok(r#"{"type":"video"}"#.to_string())]);
    let chat = pipeline(transport);

    let outcome = chat.submit("hello").await;
    assert!(matches!(outcome, SubmitOutcome::Resolved(ref m) if m.content == UNEXPECTED_FORMAT));
    assert!(!chat.is_first_turn());
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let transport = ScriptedTransport::new(vec![]);
    let chat = pipeline(transport.clone());

    assert_eq!(
        chat.submit("   ").await,
        SubmitOutcome::Rejected(Rejection::EmptyInput)
    );
    assert!(chat.messages().is_empty());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_second_submit_while_pending_is_rejected() {
    let transport = Arc::new(GatedTransport::default());
    let chat = Arc::new(pipeline(transport.clone()));

    let first = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("hello").await }
    });
    transport.received.notified().await;

    let log = chat.messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].content, "hello");
    assert!(log[1].is_placeholder());
    let placeholder = log[1].id;
    assert!(chat.is_submitting());
    assert_eq!(chat.turn_state(), TurnState::Pending { placeholder });

    assert_eq!(
        chat.submit("again").await,
        SubmitOutcome::Rejected(Rejection::Busy)
    );
    assert_eq!(
        chat.click_button(&Button::new("Yes", "yes")).await,
        SubmitOutcome::Rejected(Rejection::Busy)
    );
    assert!(!chat.reset());
    assert_eq!(chat.messages().len(), 2);
    assert_eq!(chat.turn_state(), TurnState::Pending { placeholder });

    transport.release.notify_one();
    let outcome = first.await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Resolved(ref m) if m.content == "done"));

    let log = chat.messages();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|m| m.id != placeholder));
    assert!(!chat.is_submitting());
}

#[tokio::test]
async fn test_abandoned_turn_removes_placeholder() {
    let transport = Arc::new(GatedTransport::default());
    let chat = Arc::new(pipeline(transport.clone()));

    let turn = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("hello").await }
    });
    transport.received.notified().await;
    assert!(chat.is_submitting());

    turn.abort();
    assert!(turn.await.unwrap_err().is_cancelled());

    let log = chat.messages();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].content, "hello");
    assert!(!chat.is_submitting());
}

#[tokio::test]
async fn test_button_click_round_trip() {
    let transport = ScriptedTransport::new(vec![
        Ok(r#"{"type":"buttons","content":"Continue?",
              "buttons":[{"text":"Yes","value":"yes","action":"continue"}]}"#
            .to_string()),
        Ok(r#"{"type":"text","content":"Great, continuing"}"#.to_string()),
    ]);
    let chat = pipeline(transport.clone());

    chat.submit("start").await;
    let choice = chat.latest_buttons().unwrap();
    assert_eq!(choice.kind, MessageType::Buttons);

    let outcome = chat.select_button(choice.id, 0).await;
    assert!(matches!(outcome, SubmitOutcome::Resolved(ref m) if m.content == "Great, continuing"));

    let log = chat.messages();
    assert_eq!(log.len(), 4);
    assert_eq!(log[2].sender, Sender::User);
    assert_eq!(log[2].content, "Selected: yes");
    assert_eq!(log[3].content, "Great, continuing");

    let (_, payload) = &transport.requests()[1];
    assert_eq!(payload["button"]["value"], "yes");
    assert_eq!(payload["button"]["action"], "continue");
    let user = payload["user"].as_object().unwrap();
    assert_eq!(user.len(), 3);
    assert!(user.contains_key("email"));
    assert!(!user.contains_key("age"));
    assert!(payload.get("message").is_none());
}

#[tokio::test]
async fn test_button_failure_names_selection() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Status { status: 502 })]);
    let chat = pipeline(transport);

    let outcome = chat.click_button(&Button::new("No", "no")).await;
    let reply = outcome.reply().unwrap();
    assert_eq!(
        reply.content,
        "You selected: no. (Error: Could not connect to AI service)"
    );
    assert_eq!(chat.messages()[0].content, "Selected: no");
}

#[tokio::test]
async fn test_unknown_button_is_rejected() {
    let transport = ScriptedTransport::new(vec![]);
    let chat = pipeline(transport);

    assert_eq!(
        chat.select_button(Uuid::nil(), 0).await,
        SubmitOutcome::Rejected(Rejection::UnknownButton)
    );
    assert!(chat.messages().is_empty());
}

#[tokio::test]
async fn test_welcome_and_reset() {
    let transport = ScriptedTransport::new(vec![Ok(r#"{"content":"hi"}"#.to_string())]);
    let chat = ConversationPipeline::new(
        transport,
        PipelineConfig::new(ENDPOINT).with_welcome_message(Some(DEFAULT_WELCOME.to_string())),
    );
    assert_eq!(chat.messages()[0].content, DEFAULT_WELCOME);

    chat.submit("hello").await;
    assert_eq!(chat.messages().len(), 3);
    assert!(!chat.is_first_turn());

    assert!(chat.reset());
    let log = chat.messages();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].content, DEFAULT_WELCOME);
    assert!(chat.is_first_turn());
}

#[tokio::test]
async fn test_blank_welcome_seeds_nothing() {
    let transport = ScriptedTransport::new(vec![Ok("hi".to_string())]);
    let chat = ConversationPipeline::new(
        transport,
        PipelineConfig::new(ENDPOINT).with_welcome_message(Some(String::new())),
    );
    assert!(chat.messages().is_empty());

    chat.submit("hello").await;
    assert!(chat.reset());
    assert!(chat.messages().is_empty());
}

#[tokio::test]
async fn test_anonymous_pipeline() {
    let transport = ScriptedTransport::new(vec![Ok("ok".to_string())]);
    let chat = ConversationPipeline::new(transport.clone(), PipelineConfig::new(ENDPOINT));

    chat.submit("hello").await;
    let (_, payload) = &transport.requests()[0];
    assert_eq!(payload["sessionId"], "anonymous");
    assert!(payload["user"].is_null());
}
