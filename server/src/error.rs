use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use supportdesk::SupportDeskError;

/// Handler error: unknown ids become 404, everything else 500.
#[derive(Debug)]
pub struct ApiError(pub SupportDeskError);

impl From<SupportDeskError> for ApiError {
    fn from(err: SupportDeskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            SupportDeskError::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
            err => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
