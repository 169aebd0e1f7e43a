//! Board models: notices, FAQ entries and one-to-one inquiries.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// A page of results as returned by the board list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqItem {
    pub id: i64,
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Inquiry {
    pub fn is_answered(&self) -> bool {
        self.answer.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false)
    }
}

/// Paging and search parameters for list endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticeDraft {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NoticeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InquiryDraft {
    pub title: String,
    pub content: String,
}

/// Strip the API envelope from a board response.
///
/// `IndeAPIResponse.Result` is preferred, then a top-level `Result`, and
/// otherwise the body is used as-is.
pub fn unwrap_result(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            if let Some(Value::Object(mut envelope)) = map.remove("IndeAPIResponse") {
                if let Some(result) = envelope.remove("Result") {
                    return result;
                }
                map.insert("IndeAPIResponse".to_string(), Value::Object(envelope));
            }
            if let Some(result) = map.remove("Result") {
                return result;
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Unwrap the envelope and deserialize what is inside.
pub fn from_envelope<T: DeserializeOwned>(body: Value) -> serde_json::Result<T> {
    serde_json::from_value(unwrap_result(body))
}
