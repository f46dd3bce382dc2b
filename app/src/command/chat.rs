//! Conversation with the remote agent, one-shot or interactive.

use std::fmt::Write as _;
use std::io::Write;
use talktastic_conversation::{ConversationPipeline, PipelineConfig, Rejection, SubmitOutcome};
use talktastic_core::{Message, MessageType, Transport};
use talktastic_transport::{WebhookTransport, WebhookTransportConfig};
use tracing::info;

use super::CommonComponents;

#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Single message to send (non-interactive mode)
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let session = common.session_store().current().cloned();
        match &session {
            Some(session) => info!("Chatting as {}", session.profile().email),
            None => info!("Chatting anonymously"),
        }

        let transport = WebhookTransport::new(&WebhookTransportConfig {
            timeout: common.config.webhook.timeout_secs,
            ..WebhookTransportConfig::default()
        })?;

        let pipeline_config = PipelineConfig::new(common.endpoint())
            .with_session(session)
            .with_location(common.config.chat.location)
            .with_welcome_message(common.config.chat.welcome_message.clone());
        let pipeline = ConversationPipeline::new(transport, pipeline_config);

        if let Some(msg) = input.message {
            let outcome = pipeline.submit(&msg).await;
            print_outcome(&outcome);
            if matches!(outcome, SubmitOutcome::Failed(_)) {
                anyhow::bail!("The agent could not be reached");
            }
        } else {
            run_interactive(&pipeline).await?;
        }

        Ok(())
    }
}

async fn run_interactive<T: Transport>(pipeline: &ConversationPipeline<T>) -> anyhow::Result<()> {
    println!("=== Talktastic Chat: {} ===", pipeline.config().endpoint);
    println!("Type '/select <n>' to press a button, '/new' to start over,");
    println!("and 'exit', 'quit', or Ctrl+C to end the session.\n");
    for message in pipeline.messages() {
        println!("{}\n", render(&message));
    }

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if matches!(input, "exit" | "quit" | "q") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        if input == "/new" {
            if pipeline.reset() {
                for message in pipeline.messages() {
                    println!("\n{}\n", render(&message));
                }
            }
            continue;
        }

        let outcome = if let Some(arg) = input.strip_prefix("/select") {
            let Some(index) = arg.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1))
            else {
                eprintln!("Usage: /select <n>");
                continue;
            };
            let Some(latest) = pipeline.latest_buttons() else {
                eprintln!("There are no buttons to select.");
                continue;
            };
            pipeline.select_button(latest.id, index).await
        } else {
            pipeline.submit(input).await
        };

        print_outcome(&outcome);
    }

    println!("\nSession ended. {} messages.", pipeline.messages().len());
    Ok(())
}

fn print_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Resolved(reply) | SubmitOutcome::Failed(reply) => {
            println!("\n{}\n", render(reply));
        }
        SubmitOutcome::Rejected(Rejection::EmptyInput) => {}
        SubmitOutcome::Rejected(Rejection::Busy) => {
            eprintln!("Still waiting for the previous reply.");
        }
        SubmitOutcome::Rejected(Rejection::UnknownButton) => {
            eprintln!("No such button.");
        }
    }
}

/// Terminal rendering of one log entry.
fn render(message: &Message) -> String {
    let mut out = match message.kind {
        MessageType::Text | MessageType::Buttons => message.content.clone(),
        MessageType::Image => format!("[image] {}", message.content),
        MessageType::File => format!("[file] {}", message.content),
        MessageType::Url => message.content.clone(),
    };

    if let Some(meta) = &message.url_metadata {
        let _ = write!(out, "\n  {}", meta.title);
        if !meta.description.is_empty() {
            let _ = write!(out, "\n  {}", meta.description);
        }
        let _ = write!(out, "\n  {}", meta.url);
    }

    for (index, button) in message.button_choices().iter().enumerate() {
        let _ = write!(out, "\n  [{}] {}", index + 1, button.text);
    }

    out
}
