//! Job server error model
//!
//! Every failure of a grid call lands in one of three places: the transport
//! (no usable HTTP exchange), the server (a non-2xx status or an explicit
//! refusal), or the payload (a 2xx body the node cannot read). Callers in
//! the node only branch on the status class, so the helpers stay small.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or body-transfer failure inside reqwest
    #[error("job server unreachable: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The server answered with a non-success status; `message` is its body
    #[error("job server answered {status}: {message}")]
    ApiError { status: u16, message: String },

    /// A success body that is neither empty, `null`, nor the expected JSON
    #[error("unreadable job server payload: {0}")]
    ParseError(String),

    /// A result post answered with `accepted: false`
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// Caught before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Status code of a server answer, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 4xx: the node sent something the server will never accept
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// 5xx: the server is struggling; worth another attempt
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| s >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ClientError::api_error(404, "missing").is_client_error());
        assert!(!ClientError::api_error(404, "missing").is_server_error());
        assert!(ClientError::api_error(503, "down").is_server_error());
        assert!(!ClientError::ParseError("bad".into()).is_server_error());
        assert_eq!(ClientError::Rejected("stale".into()).status(), None);
    }

    #[test]
    fn test_display_includes_status() {
        let err = ClientError::api_error(500, "boom");
        assert_eq!(err.to_string(), "job server answered 500: boom");
    }
}
