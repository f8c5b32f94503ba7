//! Error types for omni-client.

use thiserror::Error;

/// Missing or invalid client configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be set (in the environment or a .env file)")]
    Missing { var: &'static str },

    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// A failed call to the identity API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: &'static str,
        url: String,
        message: String,
    },

    /// The API answered with a non-2xx status.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// A request body could not be encoded.
    #[error("could not encode request for {url}: {message}")]
    Encode { url: String, message: String },

    /// The response body did not match the expected SCIM shape.
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    /// Response body returned by the API, when there was one.
    pub fn response_detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    /// HTTP status code, when the API answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
