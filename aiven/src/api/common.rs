//! Common types and utilities for the Aiven API

use serde::Deserialize;

/// Error body returned by the Aiven API:
/// `{"message": "...", "errors": [{"message": "...", "status": 404}]}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorItem {
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error_code: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: message={message:?}, errors={errors:?}")]
pub struct ApiErrorDetails {
    pub message: Option<String>,
    pub errors: Vec<String>,
}

impl From<ApiErrorResponse> for ApiErrorDetails {
    fn from(resp: ApiErrorResponse) -> Self {
        Self {
            message: resp.message,
            errors: resp.errors.into_iter().map(|e| e.message).collect(),
        }
    }
}

/// Query string builder. Keys may repeat, which the v2 topic endpoint relies on
/// (`?topic_name=a&topic_name=b`).
#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_all<K, V, I>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        V: ToString,
        I: IntoIterator<Item = V>,
    {
        let key = key.into();
        for v in values {
            self.params.push((key.clone(), v.to_string()));
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Builds an API path from segments, percent-encoding each one.
pub fn build_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| format!("/{}", urlencoding::encode(s)))
        .collect()
}
