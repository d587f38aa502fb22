//! Error classification for calls to the deduplication backend

/// Failure of a single backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response (connection refused, timeout, ...)
    Transport { url: String, message: String },
    /// The backend answered with a non-success status
    Status {
        url: String,
        status: u16,
        message: String,
    },
    /// The response body did not match the expected shape
    Decode { url: String, message: String },
}

impl ApiError {
    /// HTTP status code, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport { url, message } => {
                write!(f, "request to {} failed: {}", url, message)
            }
            ApiError::Status {
                url,
                status,
                message,
            } => {
                write!(f, "backend returned {} for {}: {}", status, url, message)
            }
            ApiError::Decode { url, message } => {
                write!(f, "unexpected response from {}: {}", url, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
