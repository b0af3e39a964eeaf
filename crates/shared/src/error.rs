use serde::{Deserialize, Serialize};

/// Body the backend sends alongside non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    /// Server-provided message, or the generic status fallback.
    pub fn message_or_status(&self, status: u16) -> String {
        match self.error.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => generic_http_error(status),
        }
    }
}

pub fn generic_http_error(status: u16) -> String {
    format!("HTTP error! status: {status}")
}
