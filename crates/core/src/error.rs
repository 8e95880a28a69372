use thiserror::Error;

/// Failure of a call to the brokerage collaborator.
///
/// Broker calls are single-attempt: callers surface these, they never retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// Non-success HTTP status without a parseable broker error body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Broker answered with `status = error`.
    #[error("{error_type}: {message}")]
    Api { error_type: String, message: String },

    /// The request did not complete within the configured timeout.
    #[error("timed out during {operation}")]
    Timeout { operation: &'static str },

    #[error("network error: {0}")]
    Network(String),

    /// Response arrived but could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl BrokerError {
    #[must_use]
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
