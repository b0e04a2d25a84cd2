use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::model::{self, Message};

pub struct ModelGatewayRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayResponse {
    pub content: String,
}

pub type ModelGatewayFuture<'a> = Pin<Box<dyn Future<Output = Result<ModelGatewayResponse>> + 'a>>;

/// The remote chat-completion service, seen as one synchronous
/// request/response per turn.
pub trait ModelGateway {
    fn chat<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a>;
}

pub struct HostModelGateway<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> HostModelGateway<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }
}

impl ModelGateway for HostModelGateway<'_> {
    fn chat<'b>(&'b self, request: ModelGatewayRequest) -> ModelGatewayFuture<'b> {
        Box::pin(async move {
            let content =
                model::chat(self.client, self.cfg, &request.model, &request.messages).await?;
            Ok(ModelGatewayResponse { content })
        })
    }
}
