//! Errors returned by BaaS calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The access token was rejected; the BaaS session is over.
    #[error("Your session has expired, please sign in again")]
    Unauthorized,

    #[error("no profile found for user {0}")]
    ProfileNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("role {0} cannot be self-assigned")]
    Forbidden(store::Role),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
