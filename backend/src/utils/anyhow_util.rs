use common::errors::ApiError;
use warp::http::StatusCode;

/// Unwraps an [`ApiError`] carried inside an `anyhow::Error`, or logs the
/// error and degrades it to a bare 500 so no internal detail reaches the
/// client.
pub fn from_anyhow(e: anyhow::Error) -> ApiError {
    let e = match e.downcast::<ApiError>() {
        Ok(api_error) => return api_error,
        Err(e) => e,
    };

    log::error!("unhandled error: {:?}", e);
    ApiError::new_with_message_and_status("Server error", StatusCode::INTERNAL_SERVER_ERROR)
}
