//! SQL generation client
//!
//! One chat-completion call per question against an OpenAI-compatible
//! endpoint, at temperature 0 for deterministic output. Failures are typed
//! and propagate to the caller; this client never retries on its own.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use thiserror::Error;

use tabletalk_core::PromptRequest;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Model endpoint unavailable: {0}")]
    ModelUnavailable(#[from] async_openai::error::OpenAIError),

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Generation timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

pub struct SqlGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl SqlGenerator {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the assembled prompt and return the raw completion text.
    pub async fn generate(&self, prompt: &PromptRequest) -> Result<String, GenerateError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt.system_instruction.clone())
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.user_message())
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0) // Deterministic output
            .build()?;

        let chat = self.client.chat();
        let call = chat.create(request);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GenerateError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(GenerateError::EmptyCompletion);
        }

        tracing::debug!(
            model = %self.model,
            prompt_fingerprint = %prompt.fingerprint(),
            chars = content.len(),
            "Completion received"
        );
        Ok(content)
    }
}
