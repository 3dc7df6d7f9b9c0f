//! Object-store boundary.
//!
//! The coordinator only ever opens, finalizes, and aborts multipart sessions;
//! part bytes go straight from the browser to the store. [`ObjectStore`] is
//! that narrow contract, implemented by [`S3ObjectStore`] for real buckets and
//! [`MemoryObjectStore`] for local runs and tests.

mod memory;
mod s3;

use std::fmt;

use async_trait::async_trait;

use partsign_model::error::UploadError;

pub use memory::{MemoryObjectStore, StoredObject};
pub use s3::S3ObjectStore;

/// One `(partNumber, ETag)` entry of a completion manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// 1-based part number.
    pub part_number: i32,
    /// ETag as the client reported it, quoted or not.
    pub e_tag: String,
}

/// Multipart operations the coordinator needs from an object store.
///
/// Uses `#[async_trait]` so the coordinator can hold it as `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Open a multipart session and return its upload ID.
    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> Result<String, StoreError>;

    /// Assemble the listed parts into the final object.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StoreError>;

    /// Discard a session and any parts uploaded to it.
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError>;
}

/// Errors returned by an object store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store answered with an error response.
    #[error("{code}: {message}")]
    Service {
        /// Upstream HTTP status.
        status: http::StatusCode,
        /// Upstream error code, e.g. `NoSuchUpload`.
        code: String,
        /// Upstream message.
        message: String,
    },

    /// The call did not finish within the configured deadline.
    #[error("object store call timed out: {0}")]
    Timeout(String),

    /// The call never got a response.
    #[error("object store transport failure: {0}")]
    Transport(String),
}

impl StoreError {
    /// Create a service error.
    pub fn service(
        status: http::StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Service {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// The specified upload does not exist.
    pub fn no_such_upload(upload_id: &str) -> Self {
        Self::service(
            http::StatusCode::NOT_FOUND,
            "NoSuchUpload",
            format!(
                "The specified upload does not exist. The upload ID may be invalid, or the upload \
                 may have been aborted or completed: {upload_id}"
            ),
        )
    }
}

impl From<StoreError> for UploadError {
    fn from(err: StoreError) -> Self {
        let upload = match &err {
            StoreError::Service { status, .. } => UploadError::upstream(*status, err.to_string()),
            StoreError::Timeout(_) => UploadError::timeout(err.to_string()),
            StoreError::Transport(_) => UploadError::internal_error(err.to_string()),
        };
        upload.with_source(err)
    }
}
