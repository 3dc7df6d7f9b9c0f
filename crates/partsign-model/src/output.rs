//! Response bodies for the upload API.
//!
//! The part-signature response is `partsign_auth::SigningResult`, which
//! already serializes as `{signature, authorizationHeader, amzDate}`.

use serde::{Deserialize, Serialize};

/// Response of `POST /api/upload/initiate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadOutput {
    /// Upload ID the client passes to every later call.
    pub upload_id: String,
    /// Object key, echoed back.
    pub key: String,
    /// Bucket the session lives in.
    pub bucket: String,
    /// Region of the bucket.
    pub region: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthOutput {
    /// Always `running`.
    pub status: String,
    /// Server version.
    pub version: String,
}

/// Error body written for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}
