//! Upload API operation enum.

use std::fmt;

/// Path prefix shared by every upload operation.
pub const API_PREFIX: &str = "/api/upload/";

/// All supported upload operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadOperation {
    /// Open a multipart session.
    Initiate,
    /// Sign one part PUT.
    PartSignature,
    /// Finalize a multipart session.
    Complete,
    /// Discard a multipart session.
    Abort,
}

impl UploadOperation {
    /// Returns the path segment naming this operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiate => "initiate",
            Self::PartSignature => "part-signature",
            Self::Complete => "complete",
            Self::Abort => "abort",
        }
    }

    /// Parse a request path such as `/api/upload/initiate`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path.strip_prefix(API_PREFIX)?.trim_end_matches('/') {
            "initiate" => Some(Self::Initiate),
            "part-signature" => Some(Self::PartSignature),
            "complete" => Some(Self::Complete),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }

    /// The full request path for this operation.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{API_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for UploadOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
