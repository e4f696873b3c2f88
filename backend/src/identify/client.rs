use log::info;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use shared::IdentificationResponse;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::identify::response::parse_identification;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 1000;
const ERROR_BODY_PREVIEW_CHARS: usize = 100;
const APP_REFERER: &str = "https://natureid.app";
const APP_TITLE: &str = "NatureID";

const IDENTIFICATION_PROMPT: &str = r#"I need you to carefully analyze this image and identify if it contains a plant or animal species.

IMPORTANT: Be honest about your confidence level. If you're not very certain, use a lower confidence score (below 0.7).
If the image is unclear, low quality, or you can't identify the species with reasonable certainty,
admit this by using a low confidence score (0.3-0.5) and stating your uncertainty.

Please provide:
- Category (plant or animal)
- Common name of the species (be specific)
- Scientific name (genus and species)
- Brief description (1-2 sentences about key identifying features)
- Additional relevant information (habitat, characteristics, interesting facts)

Format your response as JSON with this structure:
{
  "identification": {
    "category": "plant" or "animal",
    "name": "Common name",
    "scientificName": "Scientific name",
    "confidence": 0.3 to 0.95,
    "description": "Brief description of key features",
    "additionalInfo": {
      "habitat": "Where it's commonly found",
      "characteristics": "Distinctive traits",
      "notes": "Any uncertainty or limitations in your identification"
    }
  }
}

If you cannot confidently identify the species, indicate this in your response with lower confidence."#;

#[derive(Error, Debug)]
pub enum IdentifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI service error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("Empty response from AI service")]
    EmptyResponse,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrlRef<'a> },
}

#[derive(Serialize)]
struct ImageUrlRef<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

/// Client for the OpenRouter chat-completions endpoint.
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: HttpClient,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Result<Self, reqwest::Error> {
        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            api_key,
            model,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Sends the image plus the instruction prompt and parses the reply.
    /// Transport failures and non-2xx statuses are errors; a reply whose
    /// content cannot be parsed becomes a degraded fallback result.
    pub async fn identify(&self, image_data: &str) -> Result<IdentificationResponse, IdentifyError> {
        let image_url = resolve_image_url(image_data);
        info!(
            "Requesting identification from {} (image reference: {} bytes)",
            self.model,
            image_url.len()
        );

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: IDENTIFICATION_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrlRef { url: &image_url },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(IdentifyError::EmptyResponse)?;

        Ok(parse_identification(&content))
    }
}

/// Normalizes whatever the client sent into a syntactically valid image
/// reference, in strict precedence order: http(s) URL as-is, well-formed
/// image data URL as-is, generic data URL re-wrapped as JPEG, anything
/// else wrapped as raw base64 JPEG.
pub fn resolve_image_url(image_data: &str) -> String {
    if let Ok(parsed) = Url::parse(image_data) {
        if matches!(parsed.scheme(), "http" | "https") {
            return image_data.to_string();
        }
    }

    if image_data.starts_with("data:image/") {
        return image_data.to_string();
    }

    if let Some(rest) = image_data.strip_prefix("data:") {
        let encoded = rest.split_once("base64,").map(|(_, b)| b).unwrap_or(rest);
        return format!("data:image/jpeg;base64,{}", encoded);
    }

    format!("data:image/jpeg;base64,{}", image_data)
}

/// Prefers the structured `error.message` from the body; otherwise a
/// generic message carrying a truncated body preview.
fn upstream_error(status: u16, body: &str) -> IdentifyError {
    let message = serde_json::from_str::<UpstreamErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .map(|detail| detail.message)
        .unwrap_or_else(|| {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            format!("{}...", preview)
        });

    IdentifyError::Upstream { status, message }
}
