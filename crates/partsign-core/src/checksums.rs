//! ETag computation for stored parts and assembled objects.

use md5::Digest;

/// Compute the hex-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use partsign_core::checksums::compute_md5;
///
/// assert_eq!(compute_md5(b"hello"), "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    hex::encode(md5::Md5::digest(data))
}

/// Compute the quoted hex-encoded MD5 digest of `data`, the ETag of a part.
///
/// # Examples
///
/// ```
/// use partsign_core::checksums::compute_etag;
///
/// assert_eq!(compute_etag(b""), "\"d41d8cd98f00b204e9800998ecf8427e\"");
/// ```
#[must_use]
pub fn compute_etag(data: &[u8]) -> String {
    format!("\"{}\"", compute_md5(data))
}

/// Compute the ETag of an object assembled from parts.
///
/// The result is the MD5 of the concatenated binary part digests, formatted as
/// `"<hex>-<part_count>"`. Entries may be quoted or bare hex.
#[must_use]
pub fn compute_multipart_etag(part_md5_hexes: &[impl AsRef<str>]) -> String {
    let mut combined = Vec::with_capacity(part_md5_hexes.len() * 16);
    for hex_str in part_md5_hexes {
        if let Ok(bytes) = hex::decode(strip_quotes(hex_str.as_ref())) {
            combined.extend_from_slice(&bytes);
        }
    }
    let final_md5 = hex::encode(md5::Md5::digest(&combined));
    format!("\"{final_md5}-{}\"", part_md5_hexes.len())
}

/// Remove one pair of surrounding double quotes, if present.
#[must_use]
pub fn strip_quotes(etag: &str) -> &str {
    etag.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(etag)
}
