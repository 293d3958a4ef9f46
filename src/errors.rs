use axum::http::StatusCode;
use thiserror::Error;

/// Failures on the client side of the pipeline: talking to the bot API,
/// decoding what it sends, and touching the settings file.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed push message: {0}")]
    Push(#[source] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("no bot API URL configured")]
    MissingUrl,

    #[error("invalid bot API URL: {0}")]
    InvalidUrl(String),

    #[error("settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings encoding: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("connect task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        let status = match &err {
            DashboardError::MissingUrl | DashboardError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            DashboardError::Transport { .. }
            | DashboardError::Status { .. }
            | DashboardError::Decode { .. }
            | DashboardError::Push(_)
            | DashboardError::WebSocket(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Io(_) | DashboardError::Encode(_) | DashboardError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
