//! DRE LLM - Extraction client implementations
//!
//! Provides OpenAI-compatible and Ollama chat clients that send a single
//! prompt with low-temperature decoding and JSON output mode, returning the
//! raw completion text.
//!
//! Author: hephaex@gmail.com

use std::time::Duration;

use async_trait::async_trait;
use dre_core::{ConfigError, ExtractionError, LlmClient, LlmConfig, LlmProvider};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

fn build_http_client(timeout_secs: Option<u64>) -> Result<Client, ConfigError> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            key: "llm.timeout_secs".to_string(),
            value: e.to_string(),
        })
}

async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ExtractionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ExtractionError::Status {
        status: status.as_u16(),
        body,
    })
}

// ============================================================================
// OpenAI Client
// ============================================================================

/// OpenAI chat-completions client (also serves Azure and compatible gateways)
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Choice {
    message: Message,
    finish_reason: Option<String>,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
            temperature,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired("OPENAI_API_KEY".to_string()))?;

        let base_url = config
            .openai_base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            api_key: api_key.clone(),
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Set custom base URL (for Azure or compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn request<'a>(&'a self, prompt: &str) -> OpenAiRequest<'a> {
        OpenAiRequest {
            model: &self.model,
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ExtractionError> {
        let request = self.request(prompt);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        let response = error_for_status(response).await?;

        let result: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ExtractionError::EmptyCompletion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Client
// ============================================================================

/// Ollama chat client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct OllamaResponse {
    message: Message,
    done: bool,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
        }
    }

    /// Use a preconfigured HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn request<'a>(&'a self, prompt: &str) -> OllamaRequest<'a> {
        OllamaRequest {
            model: &self.model,
            messages: vec![Message::user(prompt)],
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, ExtractionError> {
        let request = self.request(prompt);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        let response = error_for_status(response).await?;

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        Ok(result.message.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>, ConfigError> {
    let client: Box<dyn LlmClient> = match config.provider {
        LlmProvider::OpenAI | LlmProvider::Azure => Box::new(OpenAiClient::from_config(config)?),
        LlmProvider::Ollama => Box::new(OllamaClient::from_config(config)?),
    };
    tracing::debug!(
        provider = ?config.provider,
        model = client.model(),
        "LLM client created"
    );
    Ok(client)
}

// ============================================================================
// Tests
// ============================================================================
