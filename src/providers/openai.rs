use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::Message;
use crate::providers::http_errors::{model_api_request_error, model_api_status_error};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn chat_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn to_openai_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

/// Returns the first choice's content, or an empty string when the
/// service sends none.
fn first_choice_content(response: ChatCompletionResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Model response contained no choices"))?;
    Ok(choice.message.content.unwrap_or_default())
}

pub async fn chat(
    client: &Client,
    cfg: &Config,
    model: &str,
    messages: &[Message],
) -> Result<String> {
    let api_key = cfg.require_api_key()?;
    let api_url = chat_url(&cfg.api_base_url);
    let body = ChatCompletionRequest {
        model,
        messages: to_openai_messages(messages),
    };
    debug!(
        api_url = %api_url,
        model = %model,
        message_count = messages.len(),
        "sending chat completion request"
    );

    let response = client
        .post(&api_url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %model,
                error = %err,
                "chat completion request failed"
            );
            model_api_request_error(err, &api_url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %model,
            status = %status,
            response_body_len = response_body.len(),
            "chat completion returned non-success status"
        );
        return Err(model_api_status_error(status, &response_body));
    }

    let parsed: ChatCompletionResponse = response
        .json()
        .await
        .context("Failed to parse chat completion response")?;
    let content = first_choice_content(parsed)?;
    debug!(
        model = %model,
        response_len = content.len(),
        "received chat completion response"
    );
    Ok(content)
}
