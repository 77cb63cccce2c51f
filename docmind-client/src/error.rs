use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response body: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClientError {
    /// True when the request never produced an HTTP response (connect, DNS, reset, timeout).
    pub fn is_transport(&self) -> bool {
        match self {
            ClientError::HttpError(e) => !e.is_status() && !e.is_decode(),
            _ => false,
        }
    }

    /// True when reqwest gave up waiting, either on connect or on the response.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::HttpError(e) if e.is_timeout())
    }

    /// Best-effort human message from a FastAPI style `{"detail": ...}` or `{"error": ...}` body.
    pub fn detail(&self) -> String {
        if let ClientError::Status { body, .. } = self
            && let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        {
            for key in ["detail", "error", "message"] {
                if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                    return text.to_string();
                }
            }
        }
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
