//! Upload handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use partsign_model::error::UploadError;
use partsign_model::operations::UploadOperation;

use crate::body::UploadResponseBody;

/// Boxed future returned by [`UploadHandler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<UploadResponseBody>, UploadError>> + Send>>;

/// Trait the upload business logic must implement.
///
/// The handler receives the routed operation and the raw JSON body and
/// returns a complete HTTP response.
pub trait UploadHandler: Send + Sync + 'static {
    /// Handle an upload operation and produce an HTTP response.
    fn handle_operation(&self, op: UploadOperation, body: Bytes) -> HandlerFuture;
}

/// Dispatch an upload operation to the handler.
pub async fn dispatch_operation<H: UploadHandler>(
    handler: &H,
    op: UploadOperation,
    body: Bytes,
) -> Result<http::Response<UploadResponseBody>, UploadError> {
    tracing::debug!(operation = %op, "dispatching upload operation");
    handler.handle_operation(op, body).await
}
