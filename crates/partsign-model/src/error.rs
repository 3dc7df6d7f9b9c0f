//! Upload API error types.
//!
//! Errors are returned to the browser as `{"code": "...", "message": "..."}`
//! with the status carried by the error.

use std::fmt;

/// Error codes returned by the upload API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum UploadErrorCode {
    /// Bad key, upload ID, part number, or signing input.
    #[default]
    ValidationError,
    /// The server has no access key or secret configured.
    MissingCredentials,
    /// The request body is not valid JSON for the operation.
    SerializationError,
    /// No route matches the request path.
    UnknownOperation,
    /// The path is known but the method is not accepted.
    MethodNotAllowed,
    /// The object store rejected the call.
    UpstreamError,
    /// The object store did not answer in time.
    RequestTimeout,
    /// Internal server error.
    InternalError,
}

impl UploadErrorCode {
    /// Returns the code string used in the JSON body.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::MissingCredentials => "MissingCredentials",
            Self::SerializationError => "SerializationError",
            Self::UnknownOperation => "UnknownOperation",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::UpstreamError => "UpstreamError",
            Self::RequestTimeout => "RequestTimeout",
            Self::InternalError => "InternalError",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::ValidationError | Self::SerializationError => http::StatusCode::BAD_REQUEST,
            Self::UnknownOperation => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::UpstreamError => http::StatusCode::BAD_GATEWAY,
            Self::RequestTimeout => http::StatusCode::GATEWAY_TIMEOUT,
            Self::MissingCredentials | Self::InternalError => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upload API error response.
#[derive(Debug)]
pub struct UploadError {
    /// The error code.
    pub code: UploadErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UploadError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl UploadError {
    /// Create a new `UploadError` from an error code.
    #[must_use]
    pub fn new(code: UploadErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `UploadError` with a custom message.
    #[must_use]
    pub fn with_message(code: UploadErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Override the HTTP status code.
    #[must_use]
    pub fn with_status(mut self, status_code: http::StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(UploadErrorCode::ValidationError, message)
    }

    /// Server credentials are not configured.
    #[must_use]
    pub fn missing_credentials(message: impl Into<String>) -> Self {
        Self::with_message(UploadErrorCode::MissingCredentials, message)
    }

    /// Serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::with_message(UploadErrorCode::SerializationError, message)
    }

    /// Unknown operation.
    #[must_use]
    pub fn unknown_operation(method: &http::Method, path: &str) -> Self {
        Self::with_message(
            UploadErrorCode::UnknownOperation,
            format!("No route for {method} {path}"),
        )
    }

    /// Method not allowed on a known path.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, path: &str) -> Self {
        Self::with_message(
            UploadErrorCode::MethodNotAllowed,
            format!("Method {method} is not allowed on {path}"),
        )
    }

    /// The object store rejected a call. The upstream status is kept.
    #[must_use]
    pub fn upstream(status_code: http::StatusCode, message: impl Into<String>) -> Self {
        Self::with_message(UploadErrorCode::UpstreamError, message).with_status(status_code)
    }

    /// The object store timed out.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::with_message(UploadErrorCode::RequestTimeout, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(UploadErrorCode::InternalError, message)
    }
}
