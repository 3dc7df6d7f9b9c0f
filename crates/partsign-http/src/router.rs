//! Upload API request router.
//!
//! Every upload operation is `POST /api/upload/<name>`. `GET /health` reports
//! liveness and any `OPTIONS` request is answered as a CORS preflight.

use partsign_model::error::UploadError;
use partsign_model::operations::UploadOperation;

/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Where a request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /health`.
    Health,
    /// `OPTIONS` on any path.
    Preflight,
    /// One of the upload operations.
    Operation(UploadOperation),
}

/// Resolve the route for a request.
///
/// # Errors
///
/// Returns `UnknownOperation` for an unrouted path and `MethodNotAllowed` for
/// a known path hit with the wrong method.
pub fn resolve_route(method: &http::Method, path: &str) -> Result<Route, UploadError> {
    if method == http::Method::OPTIONS {
        return Ok(Route::Preflight);
    }

    if path == HEALTH_PATH {
        return if method == http::Method::GET {
            Ok(Route::Health)
        } else {
            Err(UploadError::method_not_allowed(method, path))
        };
    }

    let op = UploadOperation::from_path(path)
        .ok_or_else(|| UploadError::unknown_operation(method, path))?;

    if method == http::Method::POST {
        Ok(Route::Operation(op))
    } else {
        Err(UploadError::method_not_allowed(method, path))
    }
}

#[cfg(test)]
mod tests {
    use partsign_model::error::UploadErrorCode;

    use super::*;

    #[test]
    fn test_should_resolve_all_operations() {
        let ops = [
            ("/api/upload/initiate", UploadOperation::Initiate),
            ("/api/upload/part-signature", UploadOperation::PartSignature),
            ("/api/upload/complete", UploadOperation::Complete),
            ("/api/upload/abort", UploadOperation::Abort),
        ];
        for (path, expected) in ops {
            let route = resolve_route(&http::Method::POST, path).unwrap();
            assert_eq!(route, Route::Operation(expected), "failed for path: {path}");
        }
    }

    #[test]
    fn test_should_resolve_health_and_preflight() {
        assert_eq!(
            resolve_route(&http::Method::GET, "/health").unwrap(),
            Route::Health
        );
        assert_eq!(
            resolve_route(&http::Method::OPTIONS, "/api/upload/initiate").unwrap(),
            Route::Preflight
        );
    }

    #[test]
    fn test_should_reject_wrong_method_on_known_path() {
        let err = resolve_route(&http::Method::GET, "/api/upload/initiate").unwrap_err();
        assert_eq!(err.code, UploadErrorCode::MethodNotAllowed);

        let err = resolve_route(&http::Method::POST, "/health").unwrap_err();
        assert_eq!(err.code, UploadErrorCode::MethodNotAllowed);
    }

    #[test]
    fn test_should_reject_unknown_path() {
        let err = resolve_route(&http::Method::POST, "/api/upload/list").unwrap_err();
        assert_eq!(err.code, UploadErrorCode::UnknownOperation);
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
