//! OllamaGenerator - HTTP implementation of the `Generator` trait.
//!
//! Talks to an Ollama-compatible `/api/chat` endpoint. Every role goes through
//! the same request shape; what differs comes from the role's profile.

use crate::profiles::{ProfileTable, render_user_message};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use brainstorm_core::config::GeneratorSettings;
use brainstorm_core::generator::{
    Generator, GeneratorProfile, GeneratorRequest, RawOutput, ResponseMode,
};
use brainstorm_core::{BrainstormError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TOP_P: f32 = 0.4;

/// Generator backed by a local chat endpoint.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    profiles: ProfileTable,
}

impl OllamaGenerator {
    /// Creates a generator for `settings`, with the request timeout applied
    /// to every call.
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| BrainstormError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            profiles: ProfileTable::from_settings(settings),
        })
    }

    /// Overrides the profile table after construction.
    pub fn with_profiles(mut self, profiles: ProfileTable) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_request(&self, body: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                BrainstormError::unavailable(format!("Request to {} failed: {err}", self.endpoint))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let text = response.text().await.map_err(|err| {
            BrainstormError::unavailable(format!("Failed to read response body: {err}"))
        })?;
        extract_content(&text)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn invoke(&self, request: GeneratorRequest) -> Result<RawOutput> {
        let profile = self.profiles.get(request.role)?;
        let body = build_chat_request(profile, &request)?;

        tracing::debug!(
            "[OllamaGenerator] {} -> {} ({} chars, {} images)",
            request.role,
            profile.model_id,
            body.messages[1].content.len(),
            request.images.len()
        );

        let content = self.send_request(&body).await?;
        tracing::debug!("[OllamaGenerator] {} answered {} chars", request.role, content.len());
        Ok(RawOutput::Text(content))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    think: bool,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

fn build_chat_request(
    profile: &GeneratorProfile,
    request: &GeneratorRequest,
) -> Result<ChatRequest> {
    let user_message = render_user_message(profile, request)?;
    let images = request
        .images
        .iter()
        .map(|bytes| BASE64_STANDARD.encode(bytes))
        .collect();

    Ok(ChatRequest {
        model: profile.model_id.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: profile.system_prompt.clone(),
                images: Vec::new(),
            },
            ChatMessage {
                role: "user",
                content: user_message,
                images,
            },
        ],
        stream: false,
        format: match profile.response_mode {
            ResponseMode::Json => Some("json"),
            ResponseMode::Text => None,
        },
        think: profile.think,
        options: SamplingOptions {
            temperature: profile.temperature,
            top_p: TOP_P,
        },
    })
}

fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|err| BrainstormError::protocol(format!("Failed to parse chat response: {err}")))?;

    parsed
        .message
        .and_then(|message| message.content)
        .ok_or_else(|| BrainstormError::protocol("Chat response carried no message content"))
}

fn map_http_error(status: StatusCode, body: &str) -> BrainstormError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|wrapper| wrapper.error)
        .unwrap_or_else(|| body.to_string());
    BrainstormError::unavailable(format!("HTTP {}: {}", status.as_u16(), message))
}
