//! Error types for SigV4 signing and verification.
//!
//! All failures are represented by [`AuthError`]. The first two variants come
//! from the signing side and are raised before any network call is made; the
//! rest are raised when an incoming signed request is checked.

/// Errors that can occur while signing or verifying an AWS SigV4 request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A header or query key is empty, or appears twice after case-folding.
    #[error("Invalid signing input: {0}")]
    InvalidInput(String),

    /// The access key ID or the secret access key is empty.
    #[error("Missing credential: {0}")]
    MissingSecret(&'static str),

    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required HTTP header referenced in `SignedHeaders` is missing.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `Credential` component does not match
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// `x-amz-date` is further from the verifier's clock than the allowed skew.
    #[error("Request has expired")]
    RequestExpired,
}
