// Error types for ghsearch.
// Classified API failures travel as data; AppError covers bootstrap, config and persistence.

use thiserror::Error;

/// Title shown above any API failure message.
pub const NETWORK_ERROR_TITLE: &str = "Network Error";

/// Classified failure of a GitHub API request.
///
/// Every transport, status or decoding failure is mapped to exactly one
/// member before it leaves the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("invalid URL")]
    InvalidUrl,

    #[error("invalid request")]
    InvalidRequest,

    #[error("unauthorized")]
    Unauthorized,

    #[error("payment required")]
    PaymentRequired,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("unexpected HTTP status {0}")]
    InvalidHttpStatus(u16),

    #[error("no internet connection")]
    NoConnectivity,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response could not be decoded")]
    Decoding,

    #[error("response had an unexpected shape")]
    InvalidResponseShape,

    #[error("unknown error")]
    Unknown,
}

impl ApiError {
    /// Map a non-success HTTP status code to its taxonomy member.
    ///
    /// Every 4xx without a member of its own (422 included) is `InvalidRequest`,
    /// not only 400; codes outside 4xx keep their number in `InvalidHttpStatus`.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            402 => ApiError::PaymentRequired,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            400..=499 => ApiError::InvalidRequest,
            code => ApiError::InvalidHttpStatus(code),
        }
    }

    /// Classify a reqwest failure that happened before a status was available.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::InvalidUrl
        } else if err.is_connect() {
            ApiError::NoConnectivity
        } else if err.is_decode() {
            ApiError::Decoding
        } else if let Some(status) = err.status() {
            ApiError::from_status(status.as_u16())
        } else {
            ApiError::Transport(err.to_string())
        }
    }

    /// Classify a JSON body that failed to deserialize.
    pub fn from_json(err: &serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => ApiError::InvalidResponseShape,
            serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
                ApiError::Decoding
            }
            serde_json::error::Category::Io => ApiError::Transport(err.to_string()),
        }
    }

    /// Human-readable message for the error alert.
    pub fn message(&self) -> String {
        match self {
            ApiError::InvalidUrl => "The request URL is invalid.".to_string(),
            ApiError::InvalidRequest => "The request was rejected as invalid.".to_string(),
            ApiError::Unauthorized => {
                "Authentication failed. Check your GITHUB_TOKEN.".to_string()
            }
            ApiError::PaymentRequired => "Payment is required for this request.".to_string(),
            ApiError::Forbidden => {
                "Access forbidden. You may have hit the API rate limit.".to_string()
            }
            ApiError::NotFound => "The requested page was not found.".to_string(),
            ApiError::InvalidHttpStatus(code) => {
                format!("The server returned an unexpected status code: {}", code)
            }
            ApiError::NoConnectivity => {
                "No internet connection. Please check your network.".to_string()
            }
            ApiError::Transport(_) => "A network error occurred.".to_string(),
            ApiError::Decoding => "The server response could not be read.".to_string(),
            ApiError::InvalidResponseShape => {
                "The server response was not in the expected format.".to_string()
            }
            ApiError::Unknown => "An unknown error occurred.".to_string(),
        }
    }
}

/// Application-level errors outside the search pipeline.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("GitHub API error: {0}")]
    Api(#[from] ApiError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not resolve a data directory")]
    NoDataDir,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
