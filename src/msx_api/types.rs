use serde::{Deserialize, Serialize};
use std::fmt;

/// Phrase the platform uses when it rejects a token or credentials outright
pub const UNAUTHORIZED_PHRASE: &str = "You are not authorized to make this request";

/// MSX SDK error type
///
/// Represents all possible errors that can occur when interacting with
/// the MSX platform API or preparing a request for it.
#[derive(Debug)]
pub enum MsxError {
    /// No usable identity, or an operation needing email/password was called without them
    MissingCredentials(String),
    /// Response body was not valid JSON or did not match the expected record
    MalformedResponse(String),
    /// The platform returned a recognized error envelope
    ApiResponse(ApiError),
    /// The platform rejected the token or credentials as unauthorized
    InvalidToken,
    /// The request never produced a response (connection, TLS, timeout, ...)
    Transport(reqwest::Error),
    /// Request body could not be built
    Request(String),
    /// Configuration error
    Config(String),
    /// Local file access failed
    Io(std::io::Error),
    /// Dataset file extension is not in the allowed list
    UnsupportedFile(String),
}

impl MsxError {
    /// Whether this error means the caller should re-authenticate
    /// rather than retry the same request.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, MsxError::InvalidToken)
    }

    /// The API error payload, if the platform returned one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            MsxError::ApiResponse(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for MsxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsxError::MissingCredentials(msg) => write!(f, "Missing credentials: {}", msg),
            MsxError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            MsxError::ApiResponse(err) => write!(f, "API error: {}", err),
            MsxError::InvalidToken => write!(f, "Invalid token: {}", UNAUTHORIZED_PHRASE),
            MsxError::Transport(err) => write!(f, "Transport error: {}", err),
            MsxError::Request(msg) => write!(f, "Request error: {}", msg),
            MsxError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MsxError::Io(err) => write!(f, "IO error: {}", err),
            MsxError::UnsupportedFile(msg) => write!(f, "Unsupported file: {}", msg),
        }
    }
}

impl std::error::Error for MsxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MsxError::Transport(err) => Some(err),
            MsxError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for MsxError {
    fn from(err: ApiError) -> Self {
        MsxError::ApiResponse(err)
    }
}

impl From<reqwest::Error> for MsxError {
    fn from(err: reqwest::Error) -> Self {
        MsxError::Transport(err)
    }
}

impl From<std::io::Error> for MsxError {
    fn from(err: std::io::Error) -> Self {
        MsxError::Io(err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for MsxError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        MsxError::Config(format!("Invalid header value: {}", err))
    }
}

impl From<reqwest::header::InvalidHeaderName> for MsxError {
    fn from(err: reqwest::header::InvalidHeaderName) -> Self {
        MsxError::Config(format!("Invalid header name: {}", err))
    }
}

/// Failure envelope returned by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Synthesized error for a body that is neither a success nor a failure envelope
    pub fn unknown_response(context: Option<&str>) -> Self {
        match context {
            Some(context) => Self::new(format!("Unknown response: {}", context)),
            None => Self::new("Unknown response"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// Success envelope returned by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

/// Body of the token request
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response from the token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(alias = "orgId")]
    pub organization_id: String,
}

/// Response from the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Output of a remote command execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
