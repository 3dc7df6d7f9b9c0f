//! Canonical request construction for AWS Signature Version 4.
//!
//! This module implements the canonical request format as specified by AWS:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Header and query pairs are first normalized into sorted maps by
//! [`canonicalize_headers`] and [`canonicalize_query`], which also reject empty
//! or duplicated keys. The `build_*` functions then render each block.

use std::collections::{BTreeMap, HashSet};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::AuthError;

/// The set of characters that must be percent-encoded.
///
/// All characters except unreserved characters (A-Z, a-z, 0-9, `-`, `_`, `.`,
/// `~`) are encoded. Space becomes `%20`, never `+`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Normalize header pairs into a map keyed by lowercase name.
///
/// Values are trimmed and runs of inner whitespace collapse to a single space.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if a name is empty or if two names are
/// equal once lowercased.
pub fn canonicalize_headers<K, V>(headers: &[(K, V)]) -> Result<BTreeMap<String, String>, AuthError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(AuthError::InvalidInput("empty header name".to_owned()));
        }
        let lower = name.to_ascii_lowercase();
        let value = collapse_whitespace(value.as_ref().trim());
        if map.insert(lower.clone(), value).is_some() {
            return Err(AuthError::InvalidInput(format!(
                "duplicate header name: {lower}"
            )));
        }
    }
    Ok(map)
}

/// Normalize query pairs into a map sorted by key.
///
/// Keys and values are kept exactly as given (they are expected to be
/// percent-encoded already). Keys that differ only in case are rejected.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if a key is empty or duplicated after
/// case-folding.
pub fn canonicalize_query<K, V>(query: &[(K, V)]) -> Result<BTreeMap<String, String>, AuthError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut seen = HashSet::with_capacity(query.len());
    let mut map = BTreeMap::new();
    for (key, value) in query {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(AuthError::InvalidInput("empty query parameter name".to_owned()));
        }
        if !seen.insert(key.to_ascii_lowercase()) {
            return Err(AuthError::InvalidInput(format!(
                "duplicate query parameter: {key}"
            )));
        }
        map.insert(key.to_owned(), value.as_ref().to_owned());
    }
    Ok(map)
}

/// Build the full canonical request string from its rendered components.
///
/// # Examples
///
/// ```
/// use partsign_auth::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request(
///     "PUT",
///     "/test.txt",
///     "partNumber=1&uploadId=abc123",
///     "host:bucket.s3.us-east-1.amazonaws.com",
///     "host",
///     "UNSIGNED-PAYLOAD",
/// );
/// assert!(canonical.starts_with("PUT\n/test.txt\npartNumber=1&uploadId=abc123\n"));
/// assert!(canonical.ends_with("\n\nhost\nUNSIGNED-PAYLOAD"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    canonical_headers: &str,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers}\n{payload_hash}"
    )
}

/// Render the canonical headers block: one `name:value` line per header,
/// sorted by name.
///
/// The result does NOT include a trailing newline; [`build_canonical_request`]
/// adds it as part of the blank line separating headers from signed headers.
#[must_use]
pub fn build_canonical_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the signed headers list: sorted lowercase names joined by `;`.
#[must_use]
pub fn build_signed_headers_string(headers: &BTreeMap<String, String>) -> String {
    headers.keys().map(String::as_str).collect::<Vec<_>>().join(";")
}

/// Render the canonical query string: `key=value` pairs sorted by key, joined by `&`.
#[must_use]
pub fn build_canonical_query_string(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sort a raw query string as received on the wire.
///
/// Values are preserved as-is (no decode/re-encode): the verifier must use the
/// exact encoding the signer used, which is whatever appears in the request.
///
/// # Examples
///
/// ```
/// use partsign_auth::canonical::canonical_query_from_raw;
///
/// assert_eq!(canonical_query_from_raw(""), "");
/// assert_eq!(canonical_query_from_raw("uploadId=abc&partNumber=2"), "partNumber=2&uploadId=abc");
/// ```
#[must_use]
pub fn canonical_query_from_raw(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();

    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a single URI component with the SigV4 rules.
///
/// # Examples
///
/// ```
/// use partsign_auth::canonical::encode_uri_component;
///
/// assert_eq!(encode_uri_component("my file.bin"), "my%20file.bin");
/// assert_eq!(encode_uri_component("a/b"), "a%2Fb");
/// ```
#[must_use]
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Build the canonical URI for an object key: `/` followed by the whole key
/// encoded as one component, so `/` inside the key becomes `%2F`.
///
/// # Examples
///
/// ```
/// use partsign_auth::canonical::encode_object_key;
///
/// assert_eq!(encode_object_key("test.txt"), "/test.txt");
/// assert_eq!(encode_object_key("videos/my clip.mp4"), "/videos%2Fmy%20clip.mp4");
/// ```
#[must_use]
pub fn encode_object_key(key: &str) -> String {
    format!("/{}", encode_uri_component(key))
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
