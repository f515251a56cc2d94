//! Generation-service boundary.
//!
//! The pipeline talks to the text-generation service exclusively through
//! [`TextGenerator`], a synchronous, replaceable capability injected into the
//! summarizer and consolidator. The HTTP implementation speaks the
//! OpenAI-style chat-completions protocol used by local model servers.

use std::thread;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::error::{WeekrepError, WeekrepResult};

/// One generation request. Each caller passes its own output budget.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

/// Abstract text-generation capability.
///
/// `Ok(None)` is the service's explicit no-output signal, distinct from a
/// transport error.
pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> WeekrepResult<Option<String>>;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Blocking HTTP client with a per-request timeout and bounded-backoff
/// retries for transient failures.
pub struct HttpGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    retries: u32,
    backoff: Duration,
}

impl HttpGenerator {
    pub fn new(cfg: &GeneratorConfig) -> WeekrepResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| WeekrepError::Generation(e.to_string()))?;

        Ok(HttpGenerator {
            client,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            retries: cfg.retries.max(1),
            backoff: Duration::from_millis(cfg.backoff_ms),
        })
    }

    fn call_once(&self, request: &GenerationRequest) -> WeekrepResult<Option<String>> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: self.temperature,
            max_tokens: request.max_tokens,
            stop: request.stop.clone(),
        };

        let response: ChatCompletionResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| WeekrepError::Generation(e.to_string()))?
            .error_for_status()
            .map_err(|e| WeekrepError::Generation(e.to_string()))?
            .json()
            .map_err(|e| WeekrepError::Generation(e.to_string()))?;

        match response.choices.into_iter().next() {
            Some(choice) if !choice.message.content.trim().is_empty() => {
                Ok(Some(choice.message.content))
            }
            _ => Ok(None),
        }
    }
}

impl TextGenerator for HttpGenerator {
    fn generate(&self, request: &GenerationRequest) -> WeekrepResult<Option<String>> {
        let mut delay = self.backoff;
        let mut last_error = String::new();

        for attempt in 1..=self.retries {
            match self.call_once(request) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < self.retries {
                        warn!(
                            "generation attempt {}/{} failed: {}",
                            attempt, self.retries, last_error
                        );
                        thread::sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }

        Err(WeekrepError::GenerationExhausted {
            attempts: self.retries,
            reason: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(server_url: &str, retries: u32) -> GeneratorConfig {
        GeneratorConfig {
            endpoint: format!("{}/v1/chat/completions", server_url),
            retries,
            backoff_ms: 1,
            ..GeneratorConfig::default()
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "hello".to_string(),
            max_tokens: 64,
            stop: Vec::new(),
        }
    }

    #[test]
    fn returns_generated_text() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"a report"}}]}"#)
            .create();

        let generator = HttpGenerator::new(&test_config(&server.url(), 1)).unwrap();
        let text = generator.generate(&request()).unwrap();

        assert_eq!(text.as_deref(), Some("a report"));
        mock.assert();
    }

    #[test]
    fn empty_choices_signal_no_output() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create();

        let generator = HttpGenerator::new(&test_config(&server.url(), 1)).unwrap();
        assert_eq!(generator.generate(&request()).unwrap(), None);
    }

    #[test]
    fn exhausts_retries_on_persistent_failure() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .expect(3)
            .create();

        let generator = HttpGenerator::new(&test_config(&server.url(), 3)).unwrap();
        let err = generator.generate(&request()).unwrap_err();

        assert!(matches!(
            err,
            WeekrepError::GenerationExhausted { attempts: 3, .. }
        ));
        mock.assert();
    }
}
