//! Handler bridging the HTTP layer to the upload coordinator.

use std::sync::Arc;

use bytes::Bytes;

use partsign_http::body::UploadResponseBody;
use partsign_http::dispatch::{HandlerFuture, UploadHandler};
use partsign_http::response::{empty_response, json_response};
use partsign_model::error::UploadError;
use partsign_model::input::{
    AbortUploadInput, CompleteUploadInput, InitiateUploadInput, PartSignatureInput,
};
use partsign_model::operations::UploadOperation;

use crate::coordinator::UploadCoordinator;

/// Handler that bridges the HTTP layer to the [`UploadCoordinator`].
#[derive(Debug)]
pub struct PartsignHandler {
    coordinator: Arc<UploadCoordinator>,
}

impl PartsignHandler {
    /// Create a new handler wrapping a coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<UploadCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl UploadHandler for PartsignHandler {
    fn handle_operation(&self, op: UploadOperation, body: Bytes) -> HandlerFuture {
        let coordinator = Arc::clone(&self.coordinator);
        Box::pin(async move { dispatch(coordinator.as_ref(), op, &body).await })
    }
}

/// Dispatch an upload operation to the matching coordinator method.
async fn dispatch(
    coordinator: &UploadCoordinator,
    op: UploadOperation,
    body: &[u8],
) -> Result<http::Response<UploadResponseBody>, UploadError> {
    match op {
        UploadOperation::Initiate => {
            let input: InitiateUploadInput = deserialize(body)?;
            let output = coordinator.initiate(&input.key).await?;
            json_response(&output)
        }
        UploadOperation::PartSignature => {
            let input: PartSignatureInput = deserialize(body)?;
            let output = coordinator.sign_part(&input.key, &input.upload_id, input.part_number)?;
            json_response(&output)
        }
        UploadOperation::Complete => {
            let input: CompleteUploadInput = deserialize(body)?;
            coordinator
                .complete(&input.key, &input.upload_id, &input.parts)
                .await?;
            Ok(empty_response(http::StatusCode::OK))
        }
        UploadOperation::Abort => {
            let input: AbortUploadInput = deserialize(body)?;
            coordinator.abort(&input.key, &input.upload_id).await?;
            Ok(empty_response(http::StatusCode::OK))
        }
    }
}

/// Deserialize a JSON request body into the input type.
fn deserialize<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, UploadError> {
    serde_json::from_slice(body).map_err(|e| {
        UploadError::serialization(format!("Failed to deserialize request body: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use partsign_model::error::UploadErrorCode;

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::UploadConfig;
    use crate::store::MemoryObjectStore;

    async fn collect_json(response: http::Response<UploadResponseBody>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        }
    }

    fn handler() -> PartsignHandler {
        let config = UploadConfig::builder()
            .access_key("AKID".into())
            .secret_key("secret".into())
            .build();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryObjectStore::new(&config.credentials(), clock.clone()));
        PartsignHandler::new(Arc::new(UploadCoordinator::new(&config, store, clock)))
    }

    #[tokio::test]
    async fn test_should_initiate_and_sign_through_handler() {
        let handler = handler();

        let resp = handler
            .handle_operation(UploadOperation::Initiate, Bytes::from_static(br#"{"key":"a.bin"}"#))
            .await
            .unwrap();
        let initiated = collect_json(resp).await;
        assert_eq!(initiated["bucket"], "uploads");
        let upload_id = initiated["uploadId"].as_str().unwrap().to_owned();

        let body = serde_json::to_vec(&serde_json::json!({
            "key": "a.bin",
            "uploadId": upload_id,
            "partNumber": 1
        }))
        .unwrap();
        let resp = handler
            .handle_operation(UploadOperation::PartSignature, Bytes::from(body))
            .await
            .unwrap();
        let signed = collect_json(resp).await;
        assert_eq!(signed["amzDate"], "20240101T000000Z");
        assert!(
            signed["authorizationHeader"]
                .as_str()
                .unwrap()
                .starts_with("AWS4-HMAC-SHA256 Credential=AKID/20240101/us-east-1/s3/aws4_request")
        );
    }

    #[tokio::test]
    async fn test_should_reject_malformed_json() {
        let err = handler()
            .handle_operation(UploadOperation::Complete, Bytes::from_static(b"{not json"))
            .await
            .unwrap_err();
        assert_eq!(err.code, UploadErrorCode::SerializationError);
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_should_return_empty_ok_on_abort() {
        let handler = handler();
        let resp = handler
            .handle_operation(UploadOperation::Initiate, Bytes::from_static(br#"{"key":"a.bin"}"#))
            .await
            .unwrap();
        let upload_id = collect_json(resp).await["uploadId"].as_str().unwrap().to_owned();

        let body = serde_json::to_vec(&serde_json::json!({"key": "a.bin", "uploadId": upload_id})).unwrap();
        let resp = handler
            .handle_operation(UploadOperation::Abort, Bytes::from(body))
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(collect_json(resp).await, serde_json::Value::Null);
    }
}
