//! OpenAI-compatible remote embedding provider
//!
//! Works against OpenAI proper or any endpoint speaking the same embeddings
//! API (Ollama's `/v1` surface, vLLM, LiteLLM proxies). The base URL and
//! model id come from configuration; keyless local endpoints accept any
//! placeholder key.

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;

use crate::{EmbedError, Embedder};

pub struct RemoteEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    name: String,
}

impl RemoteEmbedder {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            name: format!("remote:{model}"),
        }
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text)
            .build()?;

        let response = self.client.embeddings().create(request).await?;
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(EmbedError::MissingVector { index: 0 })
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        // The API is ordered, but index is authoritative.
        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        if data.len() != texts.len() {
            return Err(EmbedError::MissingVector { index: data.len() });
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}
