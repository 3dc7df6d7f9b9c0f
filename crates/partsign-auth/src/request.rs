//! Signing input and output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload hash sentinel for requests whose body is not hashed.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// The value signed in place of the request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PayloadHash {
    /// `UNSIGNED-PAYLOAD`: the signature does not cover the body.
    #[default]
    Unsigned,
    /// Lowercase hex SHA-256 digest of the body.
    Sha256(String),
}

impl PayloadHash {
    /// The literal placed on the last line of the canonical request.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unsigned => UNSIGNED_PAYLOAD,
            Self::Sha256(hex) => hex,
        }
    }
}

/// A request description to be signed.
///
/// Headers and query parameters are kept in insertion order; ordering and
/// duplicate checks happen when the request is signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// HTTP method, e.g. `PUT`.
    pub method: String,
    /// Canonical URI path, already percent-encoded.
    pub uri: String,
    /// Query parameters, values already percent-encoded.
    pub query: Vec<(String, String)>,
    /// Headers to sign.
    pub headers: Vec<(String, String)>,
    /// Payload hash marker.
    pub payload_hash: PayloadHash,
    /// Request timestamp; formatted into `x-amz-date` form and the scope date.
    pub timestamp: DateTime<Utc>,
}

impl SigningRequest {
    /// Create a request with no headers, no query, and an unsigned payload.
    pub fn new(method: impl Into<String>, uri: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            query: Vec::new(),
            headers: Vec::new(),
            payload_hash: PayloadHash::Unsigned,
            timestamp,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the payload hash marker.
    #[must_use]
    pub fn with_payload_hash(mut self, payload_hash: PayloadHash) -> Self {
        self.payload_hash = payload_hash;
        self
    }

    /// The timestamp in `YYYYMMDD'T'HHMMSS'Z'` form.
    #[must_use]
    pub fn amz_date(&self) -> String {
        format_amz_date(&self.timestamp)
    }
}

/// The output of [`sign`](crate::sigv4::sign).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningResult {
    /// Lowercase hex HMAC-SHA256 signature.
    pub signature: String,
    /// Complete `Authorization` header value.
    pub authorization_header: String,
    /// The `x-amz-date` value the signature was computed with.
    pub amz_date: String,
}

/// Format a timestamp as `YYYYMMDD'T'HHMMSS'Z'`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use partsign_auth::request::format_amz_date;
///
/// let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(format_amz_date(&ts), "20240101T000000Z");
/// ```
#[must_use]
pub fn format_amz_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format the date-only prefix used in the credential scope (`YYYYMMDD`).
#[must_use]
pub fn format_date_stamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d").to_string()
}

/// Parse an `x-amz-date` value back into a timestamp.
#[must_use]
pub fn parse_amz_date(value: &str) -> Option<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_should_default_to_unsigned_payload() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let req = SigningRequest::new("PUT", "/a.bin", ts);
        assert_eq!(req.payload_hash.as_str(), "UNSIGNED-PAYLOAD");
    }

    #[test]
    fn test_should_format_date_stamp_as_prefix_of_amz_date() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(format_amz_date(&ts), "20231231T235958Z");
        assert_eq!(format_date_stamp(&ts), "20231231");
    }

    #[test]
    fn test_should_parse_amz_date() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap();
        assert_eq!(parse_amz_date("20240615T083000Z"), Some(ts));
        assert_eq!(parse_amz_date("2024-06-15"), None);
    }

    #[test]
    fn test_should_serialize_signing_result_in_camel_case() {
        let result = SigningResult {
            signature: "abc".to_owned(),
            authorization_header: "AWS4-HMAC-SHA256 ...".to_owned(),
            amz_date: "20240101T000000Z".to_owned(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["signature"], "abc");
        assert_eq!(json["authorizationHeader"], "AWS4-HMAC-SHA256 ...");
        assert_eq!(json["amzDate"], "20240101T000000Z");
    }
}
