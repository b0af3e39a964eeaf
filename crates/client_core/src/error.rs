use thiserror::Error;

/// Failure of a single client operation. Every variant carries the text shown
/// next to the control that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Local input check failed; nothing was sent.
    #[error("{0}")]
    Validation(String),
    /// The request never produced an HTTP response (connect failure, timeout).
    #[error("{0}")]
    Network(String),
    /// Non-2xx response. `message` is the server's `error` field when present.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// Refused locally because the target is unknown or already busy.
    #[error("{0}")]
    Rejected(String),
}

impl ClientError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_timeout() {
            Self::Network("request timed out; check the backend and try again".to_string())
        } else if let Some(status) = err.status() {
            Self::Server {
                status: status.as_u16(),
                message: shared::error::generic_http_error(status.as_u16()),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}
