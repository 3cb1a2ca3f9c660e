use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roleta_core::WheelError;
use roleta_shared::ErrorBody;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error(transparent)]
    Wheel(#[from] WheelError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized".to_string(),
                    message: self.to_string(),
                },
            ),
            ApiError::Wheel(err) => {
                let status = match err {
                    WheelError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    WheelError::NotFound(_) => StatusCode::NOT_FOUND,
                    WheelError::Conflict(_) => StatusCode::CONFLICT,
                    WheelError::UpstreamFailure(_) => {
                        error!(%err, "store failure");
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, ErrorBody::from_wheel(err))
            }
        };
        (status, Json(body)).into_response()
    }
}
