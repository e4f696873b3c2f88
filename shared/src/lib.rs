use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Plant,
    Animal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationResult {
    pub category: Category,
    pub name: String,
    pub scientific_name: String,
    pub confidence: f32,
    pub description: String,
    #[serde(default)]
    pub additional_info: HashMap<String, String>,
    /// Set when the result was synthesized because the model reply
    /// could not be parsed into the expected shape.
    #[serde(default)]
    pub degraded: bool,
}

/// The envelope the model is instructed to emit and the body returned
/// by `POST /api/identify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentificationResponse {
    pub identification: IdentificationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// The original upload, not the downscaled copy sent upstream.
    pub image_data: String,
    pub results: IdentificationResponse,
    #[serde(rename = "type")]
    pub entry_type: Category,
}

impl HistoryEntry {
    pub fn new(image_data: String, results: IdentificationResponse) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            timestamp: now,
            image_data,
            entry_type: results.identification.category,
            results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Plant,
    Animal,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct IdentifyRequest {
    pub image: Option<String>,
}
