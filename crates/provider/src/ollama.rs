//! Ollama (local) client with NDJSON streaming support

use crate::error::ProviderError;
use crate::message::Message;
use async_stream::stream;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Short-lived timeout for the connectivity probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self { temperature: 0.7 }
    }
}

/// One chat completion, or one fragment of a streamed completion
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub message: Message,
    pub done: bool,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Model listing entry from /api/tags
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new client with the default request timeout
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Set custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }

    /// Default model used when a call carries no override
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if the Ollama server is reachable
    pub async fn is_connected(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        let probe = match Client::builder().timeout(PROBE_TIMEOUT).build() {
            Ok(probe) => probe,
            Err(_) => return false,
        };

        match probe.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Ollama connection check failed: {}", e);
                false
            }
        }
    }

    /// List models available on the server
    pub async fn list_models(&self) -> Result<Vec<ModelEntry>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status(status, &body));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(tags.models)
    }

    /// Get a complete chat completion
    pub async fn chat(
        &self,
        messages: &[Message],
        model: Option<&str>,
    ) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: model.unwrap_or(&self.model),
            messages,
            stream: false,
            options: ChatOptions::default(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Stream chat completion fragments as the server produces them.
    ///
    /// The body is NDJSON: one `ChatResponse` per line, the last one with
    /// `done == true`. Lines that fail to parse are skipped with a warning.
    pub fn chat_stream<'a>(
        &'a self,
        messages: &'a [Message],
        model: Option<&'a str>,
    ) -> impl Stream<Item = Result<ChatResponse, ProviderError>> + 'a {
        stream! {
            let url = format!("{}/api/chat", self.base_url);
            let request = ChatRequest {
                model: model.unwrap_or(&self.model),
                messages,
                stream: true,
                options: ChatOptions::default(),
            };

            let response = match self.client.post(&url).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(ProviderError::Network(e.to_string()));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                yield Err(ProviderError::from_http_status(status, &body));
                return;
            }

            let mut body = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ProviderError::StreamError(e.to_string()));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ChatResponse>(line) {
                        Ok(fragment) => yield Ok(fragment),
                        Err(e) => warn!("Skipping invalid stream line: {}", e),
                    }
                }
            }
        }
    }

    /// Generate text from a single prompt
    pub async fn generate(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String, ProviderError> {
        let messages = [Message::user(prompt)];
        let response = self.chat(&messages, model).await?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.2");
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "hello"},
            "done": true,
            "total_duration": 123456,
            "eval_count": 42
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(response.done);
        assert_eq!(response.message.content, "hello");
        assert_eq!(response.eval_count, Some(42));
    }

    #[test]
    fn test_stream_fragment_parsing_without_optional_fields() {
        let raw = r#"{"model":"m","message":{"role":"assistant","content":"h"},"done":false}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(!response.done);
        assert_eq!(response.total_duration, None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_connected() {
        let client = OllamaClient::new("http://127.0.0.1:9", "test-model");
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_unreachable_server_yields_network_error() {
        let client =
            OllamaClient::new("http://127.0.0.1:9", "test-model").with_timeout(Duration::from_secs(2));
        let err = client.generate("hello", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
