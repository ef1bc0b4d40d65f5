use thiserror::Error;

/// All transport IO related errors generated by `marlin-integration`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("deserialising JSON error: {error} for payload: {payload}")]
    Deserialise {
        error: serde_json::Error,
        payload: String,
    },

    #[error("serialising JSON error: {0}")]
    Serialise(serde_json::Error),

    #[error("query string serialisation error: {0}")]
    UrlEncoded(#[from] serde_urlencoded::ser::Error),

    #[error("error parsing Url: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("WebSocket stream terminated: {0}")]
    Terminated(String),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("HTTP request timed out")]
    HttpTimeout(reqwest::Error),

    /// Non-success status with the raw response body for diagnostics.
    #[error("HTTP response (status={0}) error: {1}")]
    HttpResponse(reqwest::StatusCode, String),

    #[error("request signing key rejected")]
    SignKey,
}

impl TransportError {
    /// True for failures worth retrying with backoff: connect errors,
    /// timeouts, and server-side 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpTimeout(_) => true,
            Self::Http(error) => error.is_connect() || error.is_timeout() || error.is_request(),
            Self::HttpResponse(status, _) => status.is_server_error(),
            Self::WebSocket(_) | Self::Terminated(_) => true,
            _ => false,
        }
    }

    /// True when the venue signalled request throttling.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            Self::HttpResponse(status, _) if *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::HttpTimeout(error)
        } else {
            Self::Http(error)
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(error))
    }
}
