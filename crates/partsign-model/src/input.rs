//! Request bodies for the upload API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/upload/initiate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadInput {
    /// Object key to upload to.
    pub key: String,
}

/// Body of `POST /api/upload/part-signature`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartSignatureInput {
    /// Object key.
    pub key: String,
    /// Upload ID returned by initiate.
    pub upload_id: String,
    /// 1-based part number.
    pub part_number: i32,
}

/// One entry of the completion manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPartInfo {
    /// 1-based part number.
    pub part_number: i32,
    /// ETag the object store returned for the part PUT.
    #[serde(rename = "eTag")]
    pub e_tag: String,
}

/// Body of `POST /api/upload/complete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadInput {
    /// Object key.
    pub key: String,
    /// Upload ID returned by initiate.
    pub upload_id: String,
    /// Parts in the order the client collected them.
    pub parts: Vec<CompletedPartInfo>,
}

/// Body of `POST /api/upload/abort`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortUploadInput {
    /// Object key.
    pub key: String,
    /// Upload ID returned by initiate.
    pub upload_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_complete_manifest() {
        let json = r#"{
            "key": "a.bin",
            "uploadId": "u-1",
            "parts": [{"partNumber": 1, "eTag": "abc"}, {"partNumber": 2, "eTag": "\"def\""}]
        }"#;
        let input: CompleteUploadInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.upload_id, "u-1");
        assert_eq!(input.parts.len(), 2);
        assert_eq!(input.parts[1].e_tag, "\"def\"");
    }

    #[test]
    fn test_should_reject_part_signature_without_part_number() {
        let json = r#"{"key": "a.bin", "uploadId": "u-1"}"#;
        assert!(serde_json::from_str::<PartSignatureInput>(json).is_err());
    }
}
