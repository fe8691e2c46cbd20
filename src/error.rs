use thiserror::Error;

/// Type alias for Result with GmailError
pub type Result<T> = std::result::Result<T, GmailError>;

/// Error types for Gmail label and message operations
#[derive(Error, Debug)]
pub enum GmailError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Credentials missing, expired or rejected
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Rate limit exceeded - the remote suggests retrying after the given seconds
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Label id or name no longer exists
    #[error("Label not found: {0}")]
    LabelNotFound(String),

    /// Resource not found (404)
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Invalid message format or parsing error
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// Operation needs a message list that was never loaded
    #[error("Messages not loaded for label '{0}'")]
    MessagesNotLoaded(String),

    /// Label hierarchy could not be built under the configured policies
    #[error("Hierarchy error: {0}")]
    HierarchyError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Coarse classification of errors surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecoverable without user interaction
    Auth,
    /// The label or message id no longer exists remotely
    NotFound,
    /// Network or HTTP failure, potentially transient
    Transport,
    /// Local failures (config, parsing, hierarchy, IO)
    Other,
}

impl GmailError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GmailError::AuthError(_) | GmailError::Forbidden(_) => ErrorKind::Auth,
            GmailError::LabelNotFound(_) | GmailError::MessageNotFound(_) => ErrorKind::NotFound,
            GmailError::NetworkError(_)
            | GmailError::ServerError { .. }
            | GmailError::RateLimitExceeded { .. }
            | GmailError::ApiError(_)
            | GmailError::BadRequest(_) => ErrorKind::Transport,
            _ => ErrorKind::Other,
        }
    }

    /// Check if the error is transient. Nothing in this crate retries, but
    /// callers may use this to decide whether to try again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GmailError::RateLimitExceeded { .. }
                | GmailError::ServerError { .. }
                | GmailError::NetworkError(_)
        )
    }
}

/// Parse the Retry-After header (delay-seconds form) from an HTTP response.
/// Falls back to 5 seconds when missing or not an integer.
fn parse_retry_after_header<B>(response: &hyper::Response<B>) -> u64 {
    const DEFAULT_RETRY_AFTER: u64 = 5;

    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

impl From<google_gmail1::Error> for GmailError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    401 => GmailError::AuthError(message),
                    403 => GmailError::Forbidden(message),
                    404 => GmailError::MessageNotFound("Resource not found".to_string()),
                    429 => GmailError::RateLimitExceeded {
                        retry_after: parse_retry_after_header(response),
                    },
                    400 => GmailError::BadRequest(message),
                    500..=599 => GmailError::ServerError {
                        status: status_code,
                        message,
                    },
                    _ => GmailError::ApiError(message),
                }
            }
            google_gmail1::Error::BadRequest(ref err) => GmailError::BadRequest(format!("{}", err)),
            google_gmail1::Error::MissingToken(ref err) => {
                GmailError::AuthError(format!("No access token: {}", err))
            }
            google_gmail1::Error::HttpError(ref err) => {
                GmailError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => GmailError::NetworkError(err.to_string()),
            _ => GmailError::ApiError(error.to_string()),
        }
    }
}
