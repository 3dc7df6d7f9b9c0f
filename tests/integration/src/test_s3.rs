//! Real-bucket round trip.
//!
//! Needs `AWS_S3_BUCKET_NAME`, `AWS_S3_REGION`, and credentials allowed to
//! create, complete, and abort multipart uploads. The bucket's CORS rules are
//! irrelevant here since parts are PUT from the test process.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use partsign_auth::UNSIGNED_PAYLOAD;
    use partsign_core::{S3ObjectStore, SystemClock, UploadConfig, UploadCoordinator};
    use partsign_model::input::CompletedPartInfo;

    use crate::test_key;

    #[tokio::test]
    #[ignore = "requires real bucket"]
    async fn test_should_upload_part_directly_to_bucket() {
        let config = UploadConfig::from_env().expect("valid config");
        let store = Arc::new(S3ObjectStore::from_config(&config).await);
        let coordinator = UploadCoordinator::new(&config, store, Arc::new(SystemClock));
        let key = test_key("partsign-it");

        let initiated = coordinator.initiate(&key).await.expect("initiate");
        let upload_id = initiated.upload_id;

        let signed = coordinator
            .sign_part(&key, &upload_id, 1)
            .expect("sign part 1");
        let resp = reqwest::Client::new()
            .put(coordinator.part_url(&key, &upload_id, 1))
            .header("authorization", &signed.authorization_header)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", UNSIGNED_PAYLOAD)
            .body(b"partsign integration".to_vec())
            .send()
            .await
            .expect("part PUT");
        assert!(resp.status().is_success(), "part PUT failed: {}", resp.status());

        let e_tag = resp
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .expect("etag header")
            .trim_matches('"')
            .to_owned();

        coordinator
            .complete(
                &key,
                &upload_id,
                &[CompletedPartInfo {
                    part_number: 1,
                    e_tag,
                }],
            )
            .await
            .expect("complete");
    }

    #[tokio::test]
    #[ignore = "requires real bucket"]
    async fn test_should_surface_no_such_upload_from_bucket() {
        let config = UploadConfig::from_env().expect("valid config");
        let store = Arc::new(S3ObjectStore::from_config(&config).await);
        let coordinator = UploadCoordinator::new(&config, store, Arc::new(SystemClock));

        let err = coordinator
            .abort(&test_key("partsign-it"), "not-a-real-upload-id")
            .await
            .expect_err("abort of unknown upload should fail");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
