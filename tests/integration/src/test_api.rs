//! Routing, CORS, and error-shape integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::spawn_server;

    #[tokio::test]
    async fn test_should_report_health() {
        let server = spawn_server().await;

        let resp = reqwest::get(server.url("/health")).await.expect("health");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.headers()["server"], "partsign");
        assert!(resp.headers().contains_key("x-request-id"));

        let body: serde_json::Value = resp.json().await.expect("health json");
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_should_answer_preflight_with_cors_headers() {
        let server = spawn_server().await;

        let resp = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, server.url("/api/upload/initiate"))
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .send()
            .await
            .expect("preflight");

        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        let methods = resp.headers()["access-control-allow-methods"]
            .to_str()
            .expect("ascii header");
        assert!(methods.contains("POST"));
    }

    #[tokio::test]
    async fn test_should_return_404_for_unknown_operation() {
        let server = spawn_server().await;

        let resp = server.post("rename", &json!({})).await;
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let body: serde_json::Value = resp.json().await.expect("error json");
        assert_eq!(body["code"], "UnknownOperation");
    }

    #[tokio::test]
    async fn test_should_return_405_for_wrong_method() {
        let server = spawn_server().await;

        let resp = reqwest::get(server.url("/api/upload/initiate"))
            .await
            .expect("get");
        assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
        let body: serde_json::Value = resp.json().await.expect("error json");
        assert_eq!(body["code"], "MethodNotAllowed");
    }

    #[tokio::test]
    async fn test_should_reject_malformed_json() {
        let server = spawn_server().await;

        let resp = reqwest::Client::new()
            .post(server.url("/api/upload/initiate"))
            .header("content-type", "application/json")
            .body("{\"key\":")
            .send()
            .await
            .expect("post");
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = resp.json().await.expect("error json");
        assert_eq!(body["code"], "SerializationError");
    }

    #[tokio::test]
    async fn test_should_reject_invalid_signing_input() {
        let server = spawn_server().await;

        for body in [
            json!({"key": "", "uploadId": "u-1", "partNumber": 1}),
            json!({"key": "a.bin", "uploadId": "", "partNumber": 1}),
            json!({"key": "a.bin", "uploadId": "u-1", "partNumber": 0}),
            json!({"key": "a.bin", "uploadId": "u-1", "partNumber": 10_001}),
        ] {
            let resp = server.post("part-signature", &body).await;
            assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST, "{body}");
            let err: serde_json::Value = resp.json().await.expect("error json");
            assert_eq!(err["code"], "ValidationError");
        }
    }

    #[tokio::test]
    async fn test_should_reject_empty_initiate_key() {
        let server = spawn_server().await;

        let resp = server.post("initiate", &json!({"key": ""})).await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(server.store.open_uploads(), 0);
    }
}
