use thiserror::Error;

/// Errors raised at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

/// Requests the controller refuses without touching the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("a request is already in flight")]
    RequestInFlight,

    #[error("no active session")]
    NoSession,

    #[error("not waiting for an answer")]
    NotAwaitingAnswer,

    #[error("option is not offered by the current question")]
    UnknownOption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable or non-2xx status.
    Transport,
    /// Well-formed reply carrying an error or lacking required fields.
    Semantic,
    Timeout,
    /// Reply matched none of the known shapes.
    Unexpected,
}

/// A terminal failure for the current session, already localized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
