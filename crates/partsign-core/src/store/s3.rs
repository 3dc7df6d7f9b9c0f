//! Object store backed by Amazon S3 (or any S3-compatible endpoint).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use tracing::{debug, warn};

use crate::config::UploadConfig;
use crate::store::{CompletedPart, ObjectStore, StoreError};

/// `aws-sdk-s3` client wrapper.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from the upload configuration.
    ///
    /// Uses the configured static credentials, region, optional endpoint, and
    /// applies `store_timeout_secs` as the per-operation deadline.
    pub async fn from_config(config: &UploadConfig) -> Self {
        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "partsign",
        );

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.store_timeout_secs))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .timeout_config(timeouts);
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let aws_config = loader.load().await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(config.force_path_style)
                .build(),
        );
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateMultipartUpload", e))?;

        let upload_id = output.upload_id().map(ToOwned::to_owned).ok_or_else(|| {
            StoreError::Transport("CreateMultipartUpload returned no upload ID".to_owned())
        })?;
        debug!(bucket, key, upload_id = %upload_id, "create_multipart_upload completed");
        Ok(upload_id)
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StoreError> {
        let completed = parts
            .iter()
            .map(|p| {
                S3CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.e_tag)
                    .build()
            })
            .collect::<Vec<_>>();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| map_sdk_error("CompleteMultipartUpload", e))?;

        debug!(bucket, key, upload_id, parts = parts.len(), "complete_multipart_upload completed");
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| map_sdk_error("AbortMultipartUpload", e))?;

        debug!(bucket, key, upload_id, "abort_multipart_upload completed");
        Ok(())
    }
}

/// Map an SDK failure to a [`StoreError`], keeping the upstream status, code,
/// and message for service errors.
fn map_sdk_error<E>(operation: &'static str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let mapped = match &err {
        SdkError::TimeoutError(_) => StoreError::Timeout(operation.to_owned()),
        SdkError::DispatchFailure(failure) if failure.is_timeout() => {
            StoreError::Timeout(operation.to_owned())
        }
        SdkError::ServiceError(ctx) => {
            let status = http::StatusCode::from_u16(ctx.raw().status().as_u16())
                .unwrap_or(http::StatusCode::BAD_GATEWAY);
            StoreError::service(
                status,
                err.code().unwrap_or("Unknown"),
                err.message().unwrap_or(operation),
            )
        }
        _ => StoreError::Transport(format!("{operation}: {}", DisplayErrorContext(&err))),
    };
    warn!(operation, error = %mapped, "object store call failed");
    mapped
}
