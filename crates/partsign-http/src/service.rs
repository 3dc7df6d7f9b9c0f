//! Upload HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;

use partsign_model::error::UploadError;
use partsign_model::output::HealthOutput;

use crate::body::UploadResponseBody;
use crate::dispatch::{UploadHandler, dispatch_operation};
use crate::response::{CONTENT_TYPE, empty_response, error_to_response, json_response};
use crate::router::{Route, resolve_route};

/// Configuration for the upload HTTP service.
#[derive(Debug, Clone)]
pub struct UploadHttpConfig {
    /// Version reported by the health endpoint.
    pub version: String,
    /// Value of `access-control-allow-origin`.
    pub allowed_origin: String,
}

impl Default for UploadHttpConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            allowed_origin: "*".to_owned(),
        }
    }
}

/// Hyper `Service` implementation for the upload API.
///
/// Wraps an [`UploadHandler`] and routes incoming HTTP requests to it.
#[derive(Debug)]
pub struct UploadHttpService<H: UploadHandler> {
    handler: Arc<H>,
    config: Arc<UploadHttpConfig>,
}

impl<H: UploadHandler> UploadHttpService<H> {
    /// Create a new `UploadHttpService`.
    pub fn new(handler: Arc<H>, config: UploadHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }
}

impl<H: UploadHandler> Clone for UploadHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H, B> hyper::service::Service<http::Request<B>> for UploadHttpService<H>
where
    H: UploadHandler,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Display,
{
    type Response = http::Response<UploadResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();

            let response = match process_request(req, handler.as_ref(), &config).await {
                Ok(response) => response,
                Err(err) => {
                    if err.status_code.is_server_error() {
                        tracing::warn!(%request_id, %method, %path, error = %err, "request failed");
                    } else {
                        tracing::debug!(%request_id, %method, %path, error = %err, "request rejected");
                    }
                    error_to_response(&err)
                }
            };

            tracing::info!(
                %request_id,
                %method,
                %path,
                status = response.status().as_u16(),
                "handled request"
            );
            Ok(add_common_headers(response, &request_id, &config))
        })
    }
}

/// Process a single request through routing, body collection, and dispatch.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    config: &UploadHttpConfig,
) -> Result<http::Response<UploadResponseBody>, UploadError>
where
    H: UploadHandler,
    B: http_body::Body<Data = Bytes>,
    B::Error: Display,
{
    let (parts, incoming) = req.into_parts();

    match resolve_route(&parts.method, parts.uri.path())? {
        Route::Preflight => Ok(empty_response(http::StatusCode::NO_CONTENT)),
        Route::Health => json_response(&HealthOutput {
            status: "running".to_owned(),
            version: config.version.clone(),
        }),
        Route::Operation(op) => {
            let body = collect_body(incoming).await?;
            dispatch_operation(handler, op, body).await
        }
    }
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body<B>(incoming: B) -> Result<Bytes, UploadError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Display,
{
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| UploadError::internal_error(format!("Failed to read request body: {e}")))
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<UploadResponseBody>,
    request_id: &str,
    config: &UploadHttpConfig,
) -> http::Response<UploadResponseBody> {
    let has_body = !matches!(response.body(), UploadResponseBody::Empty);
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }

    if has_body {
        headers
            .entry("content-type")
            .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));
    }

    headers.insert("server", http::HeaderValue::from_static("partsign"));

    // CORS headers.
    if let Ok(origin) = http::HeaderValue::from_str(&config.allowed_origin) {
        headers.insert("access-control-allow-origin", origin);
    }
    headers.insert(
        "access-control-allow-methods",
        http::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        http::HeaderValue::from_static("content-type"),
    );
    headers.insert(
        "access-control-expose-headers",
        http::HeaderValue::from_static("x-request-id"),
    );

    response
}
