use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SendError;

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "https://nestle-bot-backend-123.azurewebsites.net/chat";

#[derive(Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

/// Anything that can turn a question into an answer.
///
/// The widget only ever talks to one of these; tests swap in a mock.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, SendError>;
}

/// HTTP client for the question-answering endpoint
#[derive(Clone)]
pub struct AnswerClient {
    client: Client,
    endpoint: String,
}

impl AnswerClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerSource for AnswerClient {
    async fn ask(&self, question: &str) -> Result<String, SendError> {
        info!(endpoint = %self.endpoint, "posting question");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&ChatRequest { question })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SendError::Status(response.status().as_u16()));
        }

        let chat_response: ChatResponse = response.json().await?;
        debug!(len = chat_response.answer.len(), "endpoint answered");
        Ok(chat_response.answer)
    }
}
