//! Upload service configuration.
//!
//! Provides [`UploadConfig`] for configuring the partsign server. Values are
//! loaded from environment variables using the same names the browser upload
//! page's deployment already uses for its bucket and credentials.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;

use partsign_auth::Credentials;

/// Which object-store backend the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Amazon S3 or an S3-compatible endpoint.
    #[default]
    S3,
    /// Process-local store, for development and tests.
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store kind: {other}")),
        }
    }
}

/// A configuration variable that is set but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The value does not parse as the variable's type.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Upload service configuration.
///
/// Secrets are skipped when serializing and redacted from `Debug` output.
///
/// # Examples
///
/// ```
/// use partsign_core::config::UploadConfig;
///
/// let config = UploadConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8080");
/// assert_eq!(config.part_host(), "uploads.s3.us-east-1.amazonaws.com");
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    /// Bind address for the HTTP server.
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Bucket that receives uploads.
    #[builder(default = String::from("uploads"))]
    pub bucket_name: String,

    /// Region of the bucket; also the region in every credential scope.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Access key ID used to sign part uploads and call the object store.
    #[builder(default)]
    #[serde(skip_serializing, default)]
    pub access_key: String,

    /// Secret access key.
    #[builder(default)]
    #[serde(skip_serializing, default)]
    pub secret_key: String,

    /// Custom object-store endpoint (MinIO, LocalStack, ...).
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing against the custom endpoint.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Host the browser PUTs parts to, when not the virtual-hosted S3 name.
    #[builder(default)]
    pub public_host: Option<String>,

    /// Object-store backend.
    #[builder(default)]
    pub store: StoreKind,

    /// Deadline for a single object-store call, in seconds.
    #[builder(default = 30)]
    pub store_timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:8080"),
            bucket_name: String::from("uploads"),
            region: String::from("us-east-1"),
            access_key: String::new(),
            secret_key: String::new(),
            endpoint_url: None,
            force_path_style: false,
            public_host: None,
            store: StoreKind::S3,
            store_timeout_secs: 30,
            log_level: String::from("info"),
        }
    }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("gateway_listen", &self.gateway_listen)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint_url", &self.endpoint_url)
            .field("force_path_style", &self.force_path_style)
            .field("public_host", &self.public_host)
            .field("store", &self.store)
            .field("store_timeout_secs", &self.store_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl UploadConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `AWS_S3_BUCKET_NAME` | `uploads` |
    /// | `AWS_S3_REGION`, `AWS_REGION`, `DEFAULT_REGION` | `us-east-1` |
    /// | `AWS_S3_ACCESS_KEY`, `AWS_ACCESS_KEY_ID` | empty |
    /// | `AWS_S3_SECRET_KEY`, `AWS_SECRET_ACCESS_KEY` | empty |
    /// | `AWS_S3_ENDPOINT_URL` | unset |
    /// | `AWS_S3_FORCE_PATH_STYLE` | `false` |
    /// | `AWS_S3_PUBLIC_HOST` | unset |
    /// | `PARTSIGN_STORE` | `s3` |
    /// | `PARTSIGN_STORE_TIMEOUT_SECS` | `30` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Examples
    ///
    /// ```
    /// use partsign_core::config::UploadConfig;
    ///
    /// let config = UploadConfig::from_env()?;
    /// assert!(!config.gateway_listen.is_empty());
    /// # Ok::<(), partsign_core::config::ConfigError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `PARTSIGN_STORE` or
    /// `PARTSIGN_STORE_TIMEOUT_SECS` is set to something unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`UploadConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let first = |names: &[&str]| names.iter().find_map(|&name| lookup(name));
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("AWS_S3_BUCKET_NAME") {
            config.bucket_name = v;
        }
        if let Some(v) = first(&["AWS_S3_REGION", "AWS_REGION", "DEFAULT_REGION"]) {
            config.region = v;
        }
        if let Some(v) = first(&["AWS_S3_ACCESS_KEY", "AWS_ACCESS_KEY_ID"]) {
            config.access_key = v;
        }
        if let Some(v) = first(&["AWS_S3_SECRET_KEY", "AWS_SECRET_ACCESS_KEY"]) {
            config.secret_key = v;
        }
        config.endpoint_url = lookup("AWS_S3_ENDPOINT_URL").filter(|v| !v.is_empty());
        if let Some(v) = lookup("AWS_S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        config.public_host = lookup("AWS_S3_PUBLIC_HOST").filter(|v| !v.is_empty());
        if let Some(v) = lookup("PARTSIGN_STORE") {
            config.store = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PARTSIGN_STORE",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("PARTSIGN_STORE_TIMEOUT_SECS") {
            config.store_timeout_secs = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PARTSIGN_STORE_TIMEOUT_SECS",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// The signing credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.access_key.clone(), self.secret_key.clone())
    }

    /// The `host` header value part uploads are signed for.
    ///
    /// `AWS_S3_PUBLIC_HOST` wins. Otherwise the host is derived from the
    /// custom endpoint or the regional S3 name, with the bucket as a
    /// subdomain unless path-style addressing is on.
    #[must_use]
    pub fn part_host(&self) -> String {
        if let Some(host) = &self.public_host {
            return host.clone();
        }
        let base = self
            .endpoint_authority()
            .map_or_else(|| format!("s3.{}.amazonaws.com", self.region), str::to_owned);
        if self.force_path_style {
            base
        } else {
            format!("{}.{base}", self.bucket_name)
        }
    }

    /// URL scheme of part uploads: `http` only for a plain-HTTP endpoint.
    #[must_use]
    pub fn part_scheme(&self) -> &'static str {
        match &self.endpoint_url {
            Some(url) if url.starts_with("http://") => "http",
            _ => "https",
        }
    }

    /// `host[:port]` of the custom endpoint, without scheme or path.
    fn endpoint_authority(&self) -> Option<&str> {
        let url = self.endpoint_url.as_deref()?;
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        rest.split('/').next().filter(|authority| !authority.is_empty())
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
