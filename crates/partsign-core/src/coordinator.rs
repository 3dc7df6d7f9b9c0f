//! Multipart upload coordination.
//!
//! [`UploadCoordinator`] serves the three-phase browser protocol:
//!
//! 1. `initiate` opens a session in the object store.
//! 2. `sign_part` signs a `PUT` of one chunk straight to the store.
//! 3. `complete` hands the client's part manifest to the store.
//!
//! The coordinator keeps no per-upload state. Everything needed to sign a part
//! comes from the request, so any instance can serve any call.
//!
//! Part requests are signed with `x-amz-content-sha256: UNSIGNED-PAYLOAD`: the
//! server never sees the chunk bytes, so the signature does not bind the body.

use std::sync::Arc;

use tracing::{debug, info};

use partsign_auth::request::format_amz_date;
use partsign_auth::{
    AuthError, Credentials, S3_SERVICE, SigningRequest, SigningResult, UNSIGNED_PAYLOAD,
    encode_object_key, encode_uri_component,
};
use partsign_model::error::UploadError;
use partsign_model::input::CompletedPartInfo;
use partsign_model::output::InitiateUploadOutput;

use crate::clock::Clock;
use crate::config::UploadConfig;
use crate::store::{CompletedPart, ObjectStore};

/// Highest part number S3 accepts.
pub const MAX_PART_NUMBER: i32 = 10_000;

/// Stateless broker between the browser and the object store.
#[derive(Debug)]
pub struct UploadCoordinator {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    bucket: String,
    region: String,
    host: String,
    scheme: &'static str,
    path_style: bool,
    credentials: Credentials,
}

impl UploadCoordinator {
    /// Create a coordinator for the configured bucket.
    pub fn new(config: &UploadConfig, store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            bucket: config.bucket_name.clone(),
            region: config.region.clone(),
            host: config.part_host(),
            scheme: config.part_scheme(),
            path_style: config.force_path_style,
            credentials: config.credentials(),
        }
    }

    /// Open a multipart session for `key`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty key, or the object store's
    /// error unchanged.
    pub async fn initiate(&self, key: &str) -> Result<InitiateUploadOutput, UploadError> {
        require_non_empty("key", key)?;

        let upload_id = self.store.create_multipart_upload(&self.bucket, key).await?;
        info!(bucket = %self.bucket, key, upload_id = %upload_id, "initiated multipart upload");

        Ok(InitiateUploadOutput {
            upload_id,
            key: key.to_owned(),
            bucket: self.bucket.clone(),
            region: self.region.clone(),
        })
    }

    /// Sign the `PUT` of one part, timestamped with the current clock.
    ///
    /// Never calls the object store. Two calls under the same clock reading
    /// return the same result.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty key or upload ID or a part
    /// number outside `1..=10000`, and `MissingCredentials` when the server
    /// has no access key or secret.
    pub fn sign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<SigningResult, UploadError> {
        require_non_empty("key", key)?;
        require_non_empty("uploadId", upload_id)?;
        if !(1..=MAX_PART_NUMBER).contains(&part_number) {
            return Err(UploadError::validation(format!(
                "partNumber must be between 1 and {MAX_PART_NUMBER}, got {part_number}"
            )));
        }

        let request = self.part_signing_request(key, upload_id, part_number);
        let signed = partsign_auth::sign(&request, &self.credentials, &self.region, S3_SERVICE)
            .map_err(auth_error)?;

        debug!(key, upload_id, part_number, amz_date = %signed.amz_date, "signed part upload");
        Ok(signed)
    }

    /// Finalize a session with the client's manifest.
    ///
    /// The manifest is passed through as sent; the object store decides
    /// whether it is complete and correctly ordered.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty key or upload ID, or the object
    /// store's error unchanged.
    pub async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> Result<(), UploadError> {
        require_non_empty("key", key)?;
        require_non_empty("uploadId", upload_id)?;

        let manifest = parts
            .iter()
            .map(|p| CompletedPart {
                part_number: p.part_number,
                e_tag: p.e_tag.clone(),
            })
            .collect::<Vec<_>>();

        self.store
            .complete_multipart_upload(&self.bucket, key, upload_id, &manifest)
            .await?;
        info!(bucket = %self.bucket, key, upload_id, parts = parts.len(), "completed multipart upload");
        Ok(())
    }

    /// Discard a session the client gave up on.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty key or upload ID, or the object
    /// store's error unchanged.
    pub async fn abort(&self, key: &str, upload_id: &str) -> Result<(), UploadError> {
        require_non_empty("key", key)?;
        require_non_empty("uploadId", upload_id)?;

        self.store
            .abort_multipart_upload(&self.bucket, key, upload_id)
            .await?;
        info!(bucket = %self.bucket, key, upload_id, "aborted multipart upload");
        Ok(())
    }

    /// The request a part upload is signed as, at the current clock reading.
    #[must_use]
    pub fn part_signing_request(&self, key: &str, upload_id: &str, part_number: i32) -> SigningRequest {
        let now = self.clock.now();
        SigningRequest::new("PUT", self.part_path(key), now)
            .with_header("host", self.host.as_str())
            .with_header("x-amz-content-sha256", UNSIGNED_PAYLOAD)
            .with_header("x-amz-date", format_amz_date(&now))
            .with_query("partNumber", part_number.to_string())
            .with_query("uploadId", encode_uri_component(upload_id))
    }

    /// The URL the browser must `PUT` a part to for the signature to verify.
    #[must_use]
    pub fn part_url(&self, key: &str, upload_id: &str, part_number: i32) -> String {
        format!(
            "{}://{}{}?partNumber={part_number}&uploadId={}",
            self.scheme,
            self.host,
            self.part_path(key),
            encode_uri_component(upload_id)
        )
    }

    /// Encoded object path; path-style addressing puts the bucket first.
    fn part_path(&self, key: &str) -> String {
        if self.path_style {
            format!("/{}{}", encode_uri_component(&self.bucket), encode_object_key(key))
        } else {
            encode_object_key(key)
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), UploadError> {
    if value.is_empty() {
        Err(UploadError::validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

fn auth_error(err: AuthError) -> UploadError {
    let upload = match &err {
        AuthError::MissingSecret(_) => UploadError::missing_credentials(err.to_string()),
        AuthError::InvalidInput(_) => UploadError::validation(err.to_string()),
        _ => UploadError::internal_error(err.to_string()),
    };
    upload.with_source(err)
}
