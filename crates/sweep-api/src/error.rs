use reqwest::Method;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a status we never retry.
    #[error("[HTTP code: {code}] {details}")]
    Http { code: u16, details: String },

    #[error("Failed to request {method} {path}, although we tried {attempts} times")]
    RateLimitExhausted {
        method: Method,
        path: String,
        attempts: u32,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Token cannot be used as an Authorization header")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),
}

impl TransportError {
    /// HTTP-classified failures are the only ones a single message can absorb.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Http { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Explanation for statuses that fail a call outright, `None` for everything else.
pub fn explain_status(code: u16) -> Option<&'static str> {
    match code {
        400 => Some("The request was improperly formatted, or the server couldn't understand it."),
        401 => Some("The Authorization header was missing or invalid."),
        403 => Some("The Authorization token you passed did not have permission to the resource."),
        404 => Some("The resource at the location specified doesn't exist."),
        405 => Some("The HTTP method used is not valid for the location specified."),
        502 => Some("There was not a gateway available to process your request. Wait a bit and retry."),
        500..=599 => Some("The server had an error processing your request."),
        _ => None,
    }
}
