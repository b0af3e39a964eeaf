use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DraftId, StyleId};

/// A single analysis attribute. The analysis model answers with free-form JSON,
/// so values arrive as a string, a list of strings, or anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisValue {
    Text(String),
    List(Vec<String>),
    Other(Value),
}

impl AnalysisValue {
    /// Display form, or `None` when the value carries nothing worth showing.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Self::List(items) => {
                let items: Vec<&str> = items
                    .iter()
                    .map(|item| item.trim())
                    .filter(|item| !item.is_empty())
                    .collect();
                (!items.is_empty()).then(|| items.join(", "))
            }
            Self::Other(value) => match value {
                Value::Null | Value::Bool(false) => None,
                Value::Bool(true) => Some("yes".to_string()),
                Value::Number(number) => Some(number.to_string()),
                Value::String(text) if text.trim().is_empty() => None,
                Value::String(text) => Some(text.trim().to_string()),
                Value::Array(items) if items.is_empty() => None,
                Value::Object(map) if map.is_empty() => None,
                other => serde_json::to_string_pretty(other).ok(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_tone: Option<AnalysisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_themes: Option<AnalysisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_keywords: Option<AnalysisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_structure: Option<AnalysisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_usage: Option<AnalysisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_cta: Option<AnalysisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<AnalysisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
}

impl StyleAnalysis {
    /// Labelled attributes in display order; absent or empty ones are omitted.
    pub fn display_items(&self) -> Vec<(&'static str, String)> {
        [
            ("Overall Tone", &self.overall_tone),
            ("Key Themes", &self.key_themes),
            ("Common Keywords", &self.common_keywords),
            ("Sentence Structure", &self.sentence_structure),
            ("Emoji Usage", &self.emoji_usage),
            ("Common CTA", &self.common_cta),
            ("Perspective", &self.perspective),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_ref()
                .and_then(AnalysisValue::render)
                .map(|rendered| (label, rendered))
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    #[serde(rename = "_id")]
    pub id: StyleId,
    pub name: String,
    #[serde(flatten)]
    pub analysis: StyleAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(rename = "_id")]
    pub id: DraftId,
    #[serde(rename = "draft_text")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeStyleRequest {
    pub posts_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeStyleResponse {
    #[serde(default)]
    pub analysis: StyleAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<StyleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveDraftRequest {
    pub draft_text: String,
    pub style_id: Option<StyleId>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveDraftResponse {
    pub draft_id: DraftId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratePostRequest {
    pub style_id: StyleId,
    pub topic: String,
    pub key_points: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects_or_angles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratePostResponse {
    #[serde(default)]
    pub generated_posts: Option<Vec<String>>,
}
