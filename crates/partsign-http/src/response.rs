//! Response serialization and error formatting.

use serde::Serialize;

use partsign_model::error::UploadError;
use partsign_model::output::ErrorBody;

use crate::body::UploadResponseBody;

/// Content type for JSON responses.
pub const CONTENT_TYPE: &str = "application/json";

/// Serialize an upload error into the JSON error body.
///
/// ```json
/// { "code": "ValidationError", "message": "partNumber must be between 1 and 10000" }
/// ```
#[must_use]
pub fn error_to_json(error: &UploadError) -> Vec<u8> {
    serde_json::to_vec(&ErrorBody {
        code: error.code.as_str().to_owned(),
        message: error.message.clone(),
    })
    .expect("JSON serialization of error cannot fail")
}

/// Convert an `UploadError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &UploadError) -> http::Response<UploadResponseBody> {
    http::Response::builder()
        .status(error.status_code)
        .header("content-type", CONTENT_TYPE)
        .body(UploadResponseBody::from_json(error_to_json(error)))
        .expect("valid error response")
}

/// Build a `200 OK` response from a serializable value.
///
/// # Errors
///
/// Returns an internal error if the value cannot be serialized.
pub fn json_response<T: Serialize>(value: &T) -> Result<http::Response<UploadResponseBody>, UploadError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| UploadError::internal_error(format!("Failed to serialize response: {e}")))?;
    Ok(http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .body(UploadResponseBody::from_json(json))
        .expect("valid JSON response"))
}

/// Build a bodiless response with the given status.
#[must_use]
pub fn empty_response(status: http::StatusCode) -> http::Response<UploadResponseBody> {
    http::Response::builder()
        .status(status)
        .body(UploadResponseBody::empty())
        .expect("valid empty response")
}
