use shared::{Category, IdentificationResponse, IdentificationResult};
use std::collections::HashMap;

const FALLBACK_NAME: &str = "Unknown Species";
const FALLBACK_SCIENTIFIC_NAME: &str = "N/A";
const FALLBACK_CONFIDENCE: f32 = 0.5;
const FALLBACK_DESCRIPTION: &str = "We could not properly identify this specimen. \
    The AI provided a response but it was not in the expected format.";
const FALLBACK_NOTE: &str =
    "The identification system encountered an issue. Try again with a clearer image.";

/// Turns the model's free-text reply into a result. Parse failures of
/// any kind are recovered with a degraded fallback; this never fails
/// once there is content to work with.
pub fn parse_identification(content: &str) -> IdentificationResponse {
    match extract_identification(content) {
        Some(response) => response,
        None => {
            log::warn!("Model reply did not contain a parseable identification, using fallback");
            fallback_response(content)
        }
    }
}

fn extract_identification(content: &str) -> Option<IdentificationResponse> {
    let span = json_span(content)?;
    let mut response: IdentificationResponse = serde_json::from_str(span).ok()?;
    response.identification.confidence = response.identification.confidence.clamp(0.0, 1.0);
    Some(response)
}

/// The reply is expected to contain one JSON object, possibly wrapped
/// in prose. Greedy span from the first `{` to the last `}`.
fn json_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}

/// Terminal safety net: a valid, clearly tagged low-confidence result.
/// Category is guessed from the raw text, everything else is sentinel.
pub fn fallback_response(content: &str) -> IdentificationResponse {
    let category = if content.to_lowercase().contains("plant") {
        Category::Plant
    } else {
        Category::Animal
    };

    let mut additional_info = HashMap::new();
    additional_info.insert("note".to_string(), FALLBACK_NOTE.to_string());

    IdentificationResponse {
        identification: IdentificationResult {
            category,
            name: FALLBACK_NAME.to_string(),
            scientific_name: FALLBACK_SCIENTIFIC_NAME.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            description: FALLBACK_DESCRIPTION.to_string(),
            additional_info,
            degraded: true,
        },
    }
}
