//! Image records exchanged with the image endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated image as stored by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Image {
    pub id: String,
    pub prompt: String,
    pub url: String,
    #[serde(default)]
    pub likes: i64,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_suggested: bool,
    #[serde(default)]
    pub suggested_animal: Option<String>,
    #[serde(default)]
    pub original_input: Option<String>,
}

impl Image {
    /// File name used when downloading, derived from prompt and id
    pub fn file_name(&self) -> String {
        let stem: String = self
            .prompt
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let stem = stem.trim_matches('-');
        let stem = if stem.is_empty() { "image" } else { stem };
        let id: String = self.id.chars().filter(|c| c.is_ascii_alphanumeric()).take(8).collect();
        format!("{}-{}.jpg", stem, id)
    }

    pub fn likes_display(&self) -> String {
        match self.likes {
            1 => "1 like".to_string(),
            n => format!("{} likes", n),
        }
    }
}

/// Body of `POST /images/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
}

/// Body of `POST /images`: a generated image plus what the user typed.
#[derive(Debug, Clone, Serialize)]
pub struct SaveImageRequest<'a> {
    pub id: &'a str,
    pub prompt: &'a str,
    pub url: &'a str,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub is_suggested: bool,
    pub suggested_animal: Option<&'a str>,
    pub original_input: &'a str,
}

impl<'a> SaveImageRequest<'a> {
    pub fn new(image: &'a Image, original_input: &'a str) -> Self {
        Self {
            id: &image.id,
            prompt: &image.prompt,
            url: &image.url,
            likes: 0,
            created_at: Utc::now(),
            is_suggested: false,
            suggested_animal: None,
            original_input,
        }
    }
}

/// Response of `POST /images/{id}/like`.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LikeResponse {
    #[serde(default)]
    pub success: bool,
    pub likes: i64,
}
