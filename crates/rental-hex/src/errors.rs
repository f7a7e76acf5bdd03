use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rental_types::domain::errors::BookingError;
use rental_types::ports::booking_api::ApiErrorBody;
use rental_types::ports::repository::RepoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("missing or unknown bearer token")]
    Unauthenticated,

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::Booking(e.into())
    }
}

/// Malformed or incomplete request bodies are client input errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Booking(BookingError::Validation(rejection.body_text()))
    }
}

fn status_for(e: &BookingError) -> StatusCode {
    match e {
        BookingError::Validation(_) => StatusCode::BAD_REQUEST,
        BookingError::UnauthorizedActor(_) => StatusCode::FORBIDDEN,
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::Conflict(_) => StatusCode::CONFLICT,
        BookingError::InvalidTransition(_) | BookingError::NotEligible(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BookingError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, body) = match &self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    error: self.to_string(),
                    kind: "unauthenticated".into(),
                },
            ),
            AppError::Booking(BookingError::Internal(detail)) => {
                tracing::error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        error: "internal error".into(),
                        kind: "internal".into(),
                    },
                )
            }
            AppError::Booking(e) => (status_for(e), ApiErrorBody::from(e)),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        error: "internal error".into(),
                        kind: "internal".into(),
                    },
                )
            }
        };

        let body = serde_json::to_string(&body)
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\",\"kind\":\"internal\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
