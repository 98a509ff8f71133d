use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("{provider} authorization failed: {}", .detail.as_deref().unwrap_or("no detail"))]
    Authorize {
        provider: String,
        detail: Option<String>,
    },

    #[error("{provider} credentials failed: {}", .detail.as_deref().unwrap_or("no detail"))]
    Credentials {
        provider: String,
        detail: Option<String>,
    },

    #[error("{provider} item load failed: {}", .detail.as_deref().unwrap_or("no detail"))]
    Load {
        provider: String,
        detail: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

impl ConnectError {
    /// Detail text carried by the backend's error body, if it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ConnectError::Authorize { detail, .. }
            | ConnectError::Credentials { detail, .. }
            | ConnectError::Load { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ConnectError::Authorize { .. } => "Authorization was rejected by the backend.",
            ConnectError::Credentials { .. } => "Credentials are not available yet.",
            ConnectError::Load { .. } => "Could not load integration items.",
            ConnectError::Network(_) => "Network error. Check that the backend is running.",
            ConnectError::InvalidResponse(_) => "The backend sent an unexpected response.",
            ConnectError::Navigation(_) => "Could not open the authorization page.",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectError::Network(_))
    }
}

pub type ConnectResult<T> = Result<T, ConnectError>;

/// Pulls a string `detail` out of an error body. FastAPI validation errors
/// carry an array there, which is treated as no detail.
pub fn parse_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
}
