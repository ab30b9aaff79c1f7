use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::board::PositionError;
use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error("Invalid time_limit: {0}")]
    InvalidTimeLimit(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) => "missing_field",
            ApiError::Position(PositionError::InvalidFen(_)) => "invalid_fen",
            ApiError::Position(PositionError::InvalidMove(_)) => "invalid_move",
            ApiError::Position(PositionError::IllegalMove(_)) => "illegal_move",
            ApiError::InvalidTimeLimit(_) => "invalid_time_limit",
            ApiError::Engine(EngineError::Timeout(_)) => "engine_timeout",
            ApiError::Engine(EngineError::Protocol(_)) => "engine_protocol",
            ApiError::Engine(EngineError::Spawn { .. } | EngineError::Unavailable(_)) => "engine_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::Position(_) | ApiError::InvalidTimeLimit(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(EngineError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Engine(EngineError::Protocol(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Engine(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() { warn!("{status}: {self}"); } else { debug!("{status}: {self}"); }
        (status, Json(ErrorBody { error: self.to_string(), kind: self.kind() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_errors_are_bad_request() {
        let e = ApiError::from(PositionError::IllegalMove("e2e5".into()));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.kind(), "illegal_move");
        assert_eq!(e.to_string(), "Illegal move");
    }

    #[test]
    fn engine_errors_map_to_gateway_statuses() {
        assert_eq!(ApiError::from(EngineError::Timeout(Duration::from_secs(3))).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ApiError::from(EngineError::Protocol("x".into())).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::from(EngineError::Unavailable("gone".into())).kind(), "engine_unavailable");
    }
}
