//! OpenAI-compatible HTTP implementation of release note generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::DigestError;
use crate::listing::DiffItem;

use super::ReleaseNotesService;
use super::model::ReleaseNotes;

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default chat-completions model.
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
/// Default request timeout in seconds.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;

const MAX_DIFF_CHARS: usize = 12_000;
const MAX_ERROR_BODY_CHARS: usize = 160;

/// Configuration for [`OpenAiReleaseNotesService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiReleaseNotesConfig {
    /// Base API URL (e.g., `https://api.openai.com/v1`).
    pub base_url: String,
    /// Model identifier sent in chat-completions requests.
    pub model: String,
    /// API key used for bearer authentication.
    pub api_key: Option<String>,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl Default for OpenAiReleaseNotesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.to_owned(),
            model: DEFAULT_AI_MODEL.to_owned(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        }
    }
}

/// Release notes service backed by a chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiReleaseNotesService {
    config: OpenAiReleaseNotesConfig,
    client: Client,
}

impl OpenAiReleaseNotesService {
    /// Creates a service from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] when the HTTP client cannot be
    /// built.
    pub fn new(config: OpenAiReleaseNotesConfig) -> Result<Self, DigestError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| DigestError::Configuration {
                message: format!("failed to configure AI HTTP client: {error}"),
            })?;
        Ok(Self { config, client })
    }

    fn extract_api_key(&self) -> Result<&str, DigestError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DigestError::Configuration {
                message: concat!(
                    "AI API key is required (use --ai-api-key, ",
                    "DIFF_DIGEST_AI_API_KEY, or OPENAI_API_KEY)"
                )
                .to_owned(),
            })
    }
}

#[async_trait]
impl ReleaseNotesService for OpenAiReleaseNotesService {
    async fn generate(&self, item: &DiffItem) -> Result<ReleaseNotes, DigestError> {
        let api_key = self.extract_api_key()?;
        let endpoint = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let payload = ChatCompletionsRequest {
            model: self.config.model.as_str(),
            messages: vec![
                ChatCompletionsMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_owned(),
                },
                ChatCompletionsMessage {
                    role: "user",
                    content: build_prompt(item),
                },
            ],
        };

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| DigestError::Network {
                message: format!("AI request transport failed: {error}"),
            })?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.map_or_else(
                |_| "(failed to read error response body)".to_owned(),
                |content| truncate_for_message(content.as_str(), MAX_ERROR_BODY_CHARS),
            );
            return Err(DigestError::Generation {
                message: format!("AI request failed with status {}: {body}", status.as_u16()),
            });
        }

        let response_payload: ChatCompletionsResponse =
            response
                .json()
                .await
                .map_err(|error| DigestError::Generation {
                    message: format!("AI response JSON decoding failed: {error}"),
                })?;

        let answer = response_payload
            .choices
            .first()
            .and_then(|choice| parse_content_value(&choice.message.content))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| DigestError::Generation {
                message: "AI response did not contain assistant text".to_owned(),
            })?;

        ReleaseNotes::parse(answer)
    }
}

const SYSTEM_PROMPT: &str = concat!(
    "You write release notes for merged pull requests. ",
    "Answer with exactly two sections. ",
    "Start the first with 'Developer:' and describe the technical change in one or two sentences. ",
    "Start the second with 'Marketing:' and describe the user-facing benefit in one sentence. ",
    "Do not mention being an AI model."
);

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionsMessage>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatContentPart>),
}

#[derive(Debug, Deserialize)]
struct ChatContentPart {
    text: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: ChatContent,
}

fn build_prompt(item: &DiffItem) -> String {
    let mut prompt = String::new();
    prompt.push_str("Pull request: ");
    prompt.push_str(item.id.as_str());
    prompt.push('\n');

    if !item.url.is_empty() {
        prompt.push_str("URL: ");
        prompt.push_str(item.url.as_str());
        prompt.push('\n');
    }

    prompt.push_str("Description:\n");
    prompt.push_str(item.description.as_str());
    prompt.push_str("\n\nDiff:\n");
    prompt.push_str(truncate_for_message(item.diff.as_str(), MAX_DIFF_CHARS).as_str());

    prompt
}

fn parse_content_value(content: &ChatContent) -> Option<&str> {
    match content {
        ChatContent::Text(text) => Some(text.as_str()),
        ChatContent::Parts(parts) => parts
            .iter()
            .find_map(|part| part.text.as_deref().or(part.content.as_deref())),
    }
}

fn truncate_for_message(message: &str, max_chars: usize) -> String {
    let mut output = String::new();
    let mut chars = message.chars();

    for _ in 0..max_chars {
        let Some(character) = chars.next() else {
            return output;
        };
        output.push(character);
    }

    if chars.next().is_some() {
        output.push_str("...");
    }

    output
}

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;
