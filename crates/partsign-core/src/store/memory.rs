//! In-memory object store.
//!
//! Holds multipart sessions and assembled objects in process memory. Besides
//! the [`ObjectStore`] calls the coordinator makes, it accepts the browser's
//! direct part PUTs through [`MemoryObjectStore::upload_part`] and checks
//! their SigV4 signature the way S3 does, so a signed part request can be
//! exercised end to end without a real bucket.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use percent_encoding::percent_decode_str;
use tracing::debug;

use partsign_auth::{AuthError, Credentials, StaticCredentialProvider, UNSIGNED_PAYLOAD};

use crate::checksums::{compute_md5, compute_multipart_etag, strip_quotes};
use crate::clock::Clock;
use crate::coordinator::MAX_PART_NUMBER;
use crate::store::{CompletedPart, ObjectStore, StoreError};

/// An object assembled by a completed multipart upload.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object bytes, parts concatenated in manifest order.
    pub data: Bytes,
    /// Multipart ETag, `"<md5-of-md5s>-<count>"`.
    pub e_tag: String,
    /// Number of parts the object was assembled from.
    pub parts_count: usize,
}

#[derive(Debug)]
struct Session {
    bucket: String,
    key: String,
    parts: BTreeMap<i32, StoredPart>,
}

#[derive(Debug)]
struct StoredPart {
    md5_hex: String,
    data: Bytes,
}

/// In-memory multipart object store.
#[derive(Debug)]
pub struct MemoryObjectStore {
    uploads: DashMap<String, Session>,
    objects: DashMap<(String, String), StoredObject>,
    credentials: StaticCredentialProvider,
    clock: Arc<dyn Clock>,
}

impl MemoryObjectStore {
    /// Create a store that accepts part PUTs signed with `credentials`.
    pub fn new(credentials: &Credentials, clock: Arc<dyn Clock>) -> Self {
        Self {
            uploads: DashMap::new(),
            objects: DashMap::new(),
            credentials: StaticCredentialProvider::from(credentials),
            clock,
        }
    }

    /// Accept a direct part upload.
    ///
    /// `parts` is the PUT request as the browser sent it: path is the encoded
    /// object key (prefixed by the bucket for path-style requests; otherwise
    /// the bucket is the first label of `host`), query carries `partNumber` and `uploadId`, and the
    /// `Authorization` header is the one issued by the part-signature call.
    /// Returns the quoted MD5 ETag of the stored part.
    ///
    /// # Errors
    ///
    /// Returns a 403 error if the signature does not verify, 400 for a bad
    /// part number or a body that does not match a signed `x-amz-content-sha256`,
    /// and 404 `NoSuchUpload` if no session exists for that bucket and key.
    pub fn upload_part(&self, parts: &http::request::Parts, body: Bytes) -> Result<String, StoreError> {
        let payload_hash = parts
            .headers
            .get("x-amz-content-sha256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNSIGNED_PAYLOAD);
        if payload_hash != UNSIGNED_PAYLOAD && payload_hash != partsign_auth::hash_payload(&body) {
            return Err(StoreError::service(
                http::StatusCode::BAD_REQUEST,
                "XAmzContentSHA256Mismatch",
                "The provided 'x-amz-content-sha256' header does not match what was computed.",
            ));
        }

        partsign_auth::verify_signed_request(parts, payload_hash, &self.credentials, self.clock.now())
            .map_err(auth_failure)?;

        let query = parse_query(parts.uri.query().unwrap_or(""));
        let upload_id = query.get("uploadId").cloned().unwrap_or_default();
        let part_number = query
            .get("partNumber")
            .and_then(|n| n.parse::<i32>().ok())
            .filter(|n| (1..=MAX_PART_NUMBER).contains(n))
            .ok_or_else(|| {
                StoreError::service(
                    http::StatusCode::BAD_REQUEST,
                    "InvalidArgument",
                    format!("Part number must be an integer between 1 and {MAX_PART_NUMBER}"),
                )
            })?;

        let target = PartTarget::from_request(parts);
        let mut session = self
            .uploads
            .get_mut(&upload_id)
            .filter(|s| target.matches(s))
            .ok_or_else(|| StoreError::no_such_upload(&upload_id))?;

        let md5_hex = compute_md5(&body);
        let e_tag = format!("\"{md5_hex}\"");
        debug!(
            upload_id = %upload_id,
            part_number,
            size = body.len(),
            "upload_part stored"
        );
        session
            .parts
            .insert(part_number, StoredPart { md5_hex, data: body });

        Ok(e_tag)
    }

    /// Fetch an assembled object.
    #[must_use]
    pub fn get_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .map(|o| o.value().clone())
    }

    /// Number of sessions that are neither completed nor aborted.
    #[must_use]
    pub fn open_uploads(&self) -> usize {
        self.uploads.len()
    }

    /// Detach a session so no other call can see it.
    fn take_session(&self, bucket: &str, key: &str, upload_id: &str) -> Result<Session, StoreError> {
        self.uploads
            .remove_if(upload_id, |_, s| s.bucket == bucket && s.key == key)
            .map(|(_, session)| session)
            .ok_or_else(|| StoreError::no_such_upload(upload_id))
    }
}

/// Bucket and key a part PUT is addressed to.
struct PartTarget<'a> {
    path_bucket: Option<String>,
    host: &'a str,
    key: String,
}

impl<'a> PartTarget<'a> {
    fn from_request(parts: &'a http::request::Parts) -> Self {
        let host = parts
            .headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        // Keys are sent with `/` encoded, so a raw `/` separates the bucket.
        let path = parts.uri.path().trim_start_matches('/');
        match path.split_once('/') {
            Some((bucket, key)) => Self {
                path_bucket: Some(decode(bucket)),
                host,
                key: decode(key),
            },
            None => Self {
                path_bucket: None,
                host,
                key: decode(path),
            },
        }
    }

    fn matches(&self, session: &Session) -> bool {
        let bucket_matches = match &self.path_bucket {
            Some(bucket) => *bucket == session.bucket,
            None => self
                .host
                .strip_prefix(session.bucket.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
        };
        bucket_matches && self.key == session.key
    }
}

/// Check a manifest against a session's stored parts and concatenate them.
fn assemble(session: &Session, parts: &[CompletedPart]) -> Result<StoredObject, StoreError> {
    if parts.is_empty() {
        return Err(StoreError::service(
            http::StatusCode::BAD_REQUEST,
            "MalformedXML",
            "The XML you provided was not well-formed or did not validate against our \
             published schema",
        ));
    }

    if parts.windows(2).any(|w| w[1].part_number <= w[0].part_number) {
        return Err(StoreError::service(
            http::StatusCode::BAD_REQUEST,
            "InvalidPartOrder",
            "The list of parts was not in ascending order. Parts must be ordered by part \
             number.",
        ));
    }

    let mut data = BytesMut::new();
    let mut md5s = Vec::with_capacity(parts.len());
    for cp in parts {
        let stored = session
            .parts
            .get(&cp.part_number)
            .filter(|p| p.md5_hex == strip_quotes(&cp.e_tag))
            .ok_or_else(|| {
                StoreError::service(
                    http::StatusCode::BAD_REQUEST,
                    "InvalidPart",
                    format!(
                        "One or more of the specified parts could not be found: part {}",
                        cp.part_number
                    ),
                )
            })?;
        data.extend_from_slice(&stored.data);
        md5s.push(stored.md5_hex.as_str());
    }

    Ok(StoredObject {
        data: data.freeze(),
        e_tag: compute_multipart_etag(&md5s),
        parts_count: parts.len(),
    })
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        let upload_id = uuid::Uuid::new_v4().simple().to_string();
        self.uploads.insert(
            upload_id.clone(),
            Session {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                parts: BTreeMap::new(),
            },
        );
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
        let session = self.take_session(bucket, key, upload_id)?;
        let object = match assemble(&session, parts) {
            Ok(object) => object,
            Err(e) => {
                self.uploads.insert(upload_id.to_owned(), session);
                return Err(e);
            }
        };
        self.objects
            .insert((bucket.to_owned(), key.to_owned()), object);

        debug!(bucket, key, upload_id, parts = parts.len(), "complete_multipart_upload completed");
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StoreError> {
        self.take_session(bucket, key, upload_id)?;
        debug!(bucket, key, upload_id, "abort_multipart_upload completed");
        Ok(())
    }
}

fn auth_failure(err: AuthError) -> StoreError {
    let code = match err {
        AuthError::SignatureDoesNotMatch => "SignatureDoesNotMatch",
        AuthError::RequestExpired => "RequestTimeTooSkewed",
        AuthError::AccessKeyNotFound(_) => "InvalidAccessKeyId",
        _ => "AccessDenied",
    };
    StoreError::service(http::StatusCode::FORBIDDEN, code, err.to_string())
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| {
            let (k, v) = param.split_once('=').unwrap_or((param, ""));
            (decode(k), decode(v))
        })
        .collect()
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
