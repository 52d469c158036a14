use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skywings_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// `context` is what the client sees, `detail` only goes to the log.
    Internal { context: &'static str, detail: String },
}

impl AppError {
    /// Maps a domain failure to a response. Store failures are reported as
    /// `context` without their cause.
    pub fn from_core(err: CoreError, context: &'static str) -> Self {
        match err {
            CoreError::MissingField(_) | CoreError::InvalidAmount(_) | CoreError::InvalidSeat(_) => {
                AppError::BadRequest(err.to_string())
            }
            CoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            CoreError::InvalidTransition { .. } | CoreError::SeatUnavailable(_) => {
                AppError::Conflict(err.to_string())
            }
            CoreError::Store(detail) => AppError::Internal { context, detail },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal { context, detail } => {
                tracing::error!("{}: {}", context, detail);
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywings_core::BookingStatus;

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::MissingField("user_id"), StatusCode::BAD_REQUEST),
            (CoreError::InvalidAmount("abc".into()), StatusCode::BAD_REQUEST),
            (CoreError::InvalidSeat("31A".into()), StatusCode::BAD_REQUEST),
            (CoreError::NotFound("Booking".into()), StatusCode::NOT_FOUND),
            (
                CoreError::InvalidTransition {
                    from: BookingStatus::Cancelled,
                    to: BookingStatus::Cancelled,
                },
                StatusCode::CONFLICT,
            ),
            (CoreError::SeatUnavailable("12C".into()), StatusCode::CONFLICT),
            (CoreError::Store("timeout".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = AppError::from_core(err, "Failed").into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_store_detail_is_not_exposed() {
        match AppError::from_core(CoreError::Store("password=hunter2".into()), "Failed to create booking") {
            AppError::Internal { context, detail } => {
                assert_eq!(context, "Failed to create booking");
                assert_eq!(detail, "password=hunter2");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
