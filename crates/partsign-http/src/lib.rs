//! HTTP service layer for the partsign upload API.
//!
//! - **Router**: maps method and path to an [`UploadOperation`](partsign_model::UploadOperation),
//!   the health check, or a CORS preflight
//! - **Handler trait**: the boundary between HTTP and the upload coordinator
//! - **Service**: hyper `Service` adding request IDs and CORS headers
//! - **Response helpers**: JSON success/error response formatting

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::UploadResponseBody;
pub use dispatch::UploadHandler;
pub use service::{UploadHttpConfig, UploadHttpService};
