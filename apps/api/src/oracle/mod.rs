/// Scoring oracle adapter: the single point of entry for every call to the
/// external scoring model.
///
/// ARCHITECTURAL RULE: No other module may talk to the scoring service directly.
/// Which wire protocol is spoken is decided once, by configuration
/// (`OracleTransport`), never by callers.
///
/// The adapter makes exactly one attempt per call. Retry policy, if any,
/// belongs to the caller.
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::OracleConfig;

pub mod prompts;

use prompts::{SCORING_SYSTEM, SUBFACTOR_SCHEMA};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
/// Upper bound on how much of an upstream error body is logged or returned.
const ERROR_EXCERPT_CHARS: usize = 512;

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// Network or transport failure, including the per-call timeout.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-2xx status.
    #[error("oracle rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The answer was empty or did not parse into a JSON document.
    #[error("oracle returned malformed output: {0}")]
    Malformed(String),
}

/// Black-box subfactor estimator. Implementations must not touch storage.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Identifies the model and output schema, stored with each evaluation.
    fn model_version(&self) -> String;

    /// Sends one serialized prompt input and returns the raw structured document.
    async fn score(&self, input: &str) -> Result<Value, OracleError>;
}

/// Wire protocol spoken by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleTransport {
    /// `POST /v1/responses` with `input` + `instructions`.
    Responses,
    /// `POST /v1/chat/completions` with system and user messages.
    Chat,
    /// `POST /v1/messages`, Anthropic style.
    Messages,
}

impl OracleTransport {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "responses" => Some(OracleTransport::Responses),
            "chat" | "chat_completions" => Some(OracleTransport::Chat),
            "messages" => Some(OracleTransport::Messages),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            OracleTransport::Responses | OracleTransport::Chat => "https://api.openai.com",
            OracleTransport::Messages => "https://api.anthropic.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            OracleTransport::Responses | OracleTransport::Chat => "gpt-4.1-mini",
            OracleTransport::Messages => "claude-sonnet-4-5",
        }
    }

    fn path(&self) -> &'static str {
        match self {
            OracleTransport::Responses => "/v1/responses",
            OracleTransport::Chat => "/v1/chat/completions",
            OracleTransport::Messages => "/v1/messages",
        }
    }

    /// Pulls the model's text out of a successful response envelope.
    fn extract_text(&self, body: &str) -> Result<String, OracleError> {
        let text = match self {
            OracleTransport::Responses => {
                let parsed: ResponsesResponse = decode_envelope(body)?;
                parsed
                    .output
                    .into_iter()
                    .flat_map(|item| item.content)
                    .find_map(|c| c.text.filter(|t| !t.trim().is_empty()))
            }
            OracleTransport::Chat => {
                let parsed: ChatResponse = decode_envelope(body)?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
            }
            OracleTransport::Messages => {
                let parsed: MessagesResponse = decode_envelope(body)?;
                parsed
                    .content
                    .into_iter()
                    .find(|b| b.block_type == "text")
                    .and_then(|b| b.text)
            }
        };

        text.filter(|t| !t.trim().is_empty())
            .ok_or_else(|| OracleError::Malformed("empty model output".to_string()))
    }
}

// ── Request envelopes ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    instructions: &'a str,
    text: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    format: FormatType,
}

#[derive(Debug, Serialize)]
struct FormatType {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: FormatType,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

// ── Response envelopes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<ResponsesOutput>,
}

#[derive(Debug, Deserialize)]
struct ResponsesOutput {
    #[serde(default)]
    content: Vec<ResponsesContent>,
}

#[derive(Debug, Deserialize)]
struct ResponsesContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ── HTTP adapter ────────────────────────────────────────────────────────────

/// The production oracle: one HTTP call per evaluation, bounded by the
/// configured timeout. Dropping the returned future aborts the request, so a
/// cancelled inbound request cancels the oracle call with it.
#[derive(Clone)]
pub struct HttpOracle {
    client: Client,
    transport: OracleTransport,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpOracle {
    pub fn new(config: &OracleConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| anyhow::anyhow!("Invalid ORACLE_PROXY_URL: {e}"))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build oracle HTTP client: {e}"))?;

        Ok(Self {
            client,
            transport: config.transport,
            endpoint: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.transport.path()
            ),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, input: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json");

        match self.transport {
            OracleTransport::Responses => request.bearer_auth(&self.api_key).json(&ResponsesRequest {
                model: &self.model,
                input,
                instructions: SCORING_SYSTEM,
                text: TextFormat {
                    format: FormatType {
                        format_type: "json_object",
                    },
                },
            }),
            OracleTransport::Chat => request.bearer_auth(&self.api_key).json(&ChatRequest {
                model: &self.model,
                messages: vec![
                    Message {
                        role: "system",
                        content: SCORING_SYSTEM,
                    },
                    Message {
                        role: "user",
                        content: input,
                    },
                ],
                response_format: FormatType {
                    format_type: "json_object",
                },
            }),
            OracleTransport::Messages => request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&MessagesRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    system: SCORING_SYSTEM,
                    messages: vec![Message {
                        role: "user",
                        content: input,
                    }],
                }),
        }
    }
}

#[async_trait]
impl ScoringOracle for HttpOracle {
    fn model_version(&self) -> String {
        format!("{}/{}", self.model, SUBFACTOR_SCHEMA)
    }

    async fn score(&self, input: &str) -> Result<Value, OracleError> {
        let response = self.build_request(input).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Oracle call timed out: {e}");
            }
            OracleError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            let message = excerpt(&message, ERROR_EXCERPT_CHARS).to_string();
            warn!("Oracle returned {status}: {message}");
            return Err(OracleError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let text = self.transport.extract_text(&body)?;
        let document = parse_document(&text)?;
        debug!("Oracle call succeeded ({} bytes of output)", text.len());
        Ok(document)
    }
}

fn decode_envelope<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, OracleError> {
    serde_json::from_str(body).map_err(|e| OracleError::Malformed(format!("bad envelope: {e}")))
}

/// Parses the model's text as the structured document. Empty output, a
/// non-object, or an empty object are all malformed. A markdown code fence
/// around the object is tolerated.
pub fn parse_document(text: &str) -> Result<Value, OracleError> {
    let mut text = text.trim();
    if let Some(fenced) = text.strip_prefix("```") {
        // The opening fence may carry a language tag on its own line.
        text = match fenced.split_once('\n') {
            Some((tag, rest)) if !tag.trim_start().starts_with('{') => rest,
            _ => fenced,
        };
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }

    if text.is_empty() {
        return Err(OracleError::Malformed("empty model output".to_string()));
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| OracleError::Malformed(format!("invalid JSON: {e}")))?;

    match &value {
        Value::Object(map) if !map.is_empty() => Ok(value),
        Value::Object(_) => Err(OracleError::Malformed("empty JSON object".to_string())),
        _ => Err(OracleError::Malformed("expected a JSON object".to_string())),
    }
}

/// The first `max_chars` characters of `text`.
fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
