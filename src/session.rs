use anyhow::Result;
use tracing::debug;

use crate::context::Context;
use crate::markdown::strip_markdown;
use crate::model::Message;
use crate::model_gateway::{ModelGateway, ModelGatewayRequest};

/// Most recent history entries sent with each request.
pub const HISTORY_WINDOW: usize = 20;

pub struct ChatSession<'a, G> {
    gateway: &'a G,
    model: String,
    strip_markdown: bool,
}

impl<'a, G: ModelGateway> ChatSession<'a, G> {
    pub fn new(gateway: &'a G, model: impl Into<String>, strip_markdown: bool) -> Self {
        Self {
            gateway,
            model: model.into(),
            strip_markdown,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one user turn and records the exchange in `context`.
    ///
    /// History keeps the reply as the model sent it (trimmed); only the
    /// returned display copy has markdown stripped. Saving is left to the
    /// caller.
    pub async fn run_turn(&self, context: &mut Context, user_input: &str) -> Result<String> {
        let messages = build_messages(context, user_input);
        debug!(
            model = %self.model,
            message_count = messages.len(),
            "assembled prompt"
        );

        let response = self
            .gateway
            .chat(ModelGatewayRequest {
                model: self.model.clone(),
                messages,
            })
            .await?;
        let reply = response.content.trim().to_string();

        let display = if self.strip_markdown {
            strip_markdown(&reply)
        } else {
            reply.clone()
        };
        context.record_exchange(user_input, reply);
        Ok(display)
    }
}

/// System turn (if any), then the last [`HISTORY_WINDOW`] history entries,
/// then the new user turn.
pub fn build_messages(context: &Context, user_input: &str) -> Vec<Message> {
    let history = &context.conversation_history;
    let tail_start = history.len().saturating_sub(HISTORY_WINDOW);

    let mut messages = Vec::with_capacity(history.len() - tail_start + 2);
    if !context.system_prompt.is_empty() {
        messages.push(Message::system(context.system_prompt.clone()));
    }
    messages.extend_from_slice(&history[tail_start..]);
    messages.push(Message::user(user_input));
    messages
}
