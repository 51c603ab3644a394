//! Presigned PUT URLs so clients upload job photos straight to object storage.
//!
//! URLs are signed with AWS Signature Version 4 in query-string form. The
//! API never sees the image bytes.
//!
//! Photo URLs sign `content-type` alongside `host`, so the upload must carry
//! the MIME type the URL was issued for. Host-only signers such as
//! `object_store`'s `signed_url` cannot express that, hence the signer here.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::UploadConfig;
use crate::error::{Result, YardworkError};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    #[serde(default)]
    pub job_id: String,
    /// e.g. `before` or `after`
    #[serde(default)]
    pub photo_type: String,
    #[serde(default)]
    pub file_number: i64,
    /// Extension including the dot, e.g. `.jpg`
    #[serde(default)]
    pub file_extension: String,
}

impl PresignRequest {
    /// Object key: `<jobId>_<photoType>_<fileNumber><ext>`
    pub fn object_key(&self) -> String {
        format!(
            "{}_{}_{}{}",
            self.job_id, self.photo_type, self.file_number, self.file_extension
        )
    }

    fn is_complete(&self) -> bool {
        !self.job_id.is_empty()
            && !self.photo_type.is_empty()
            && !self.file_extension.is_empty()
            && self.file_number > 0
    }
}

/// MIME type for an image extension, falling back to a generic binary type.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".webp" => "image/webp",
        ".tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct Presigner {
    config: UploadConfig,
}

impl Presigner {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Presigned PUT URL for one job photo, valid for the configured lifetime.
    pub fn presign_photo_upload(&self, request: &PresignRequest, now: DateTime<Utc>) -> Result<String> {
        if !request.is_complete() {
            return Err(YardworkError::invalid("Invalid request parameters."));
        }
        let key = request.object_key();
        let url = self.presign(
            "PUT",
            &key,
            Some(content_type_for(&request.file_extension)),
            now,
        )?;
        tracing::info!(job_id = %request.job_id, key = %key, "Presigned photo upload");
        Ok(url)
    }

    /// Presign `method` on `key`. When `content_type` is given the uploader
    /// must send exactly that `Content-Type` header.
    pub fn presign(
        &self,
        method: &str,
        key: &str,
        content_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let host = self.config.host();
        let date = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{}/{}/{}/aws4_request", date, self.config.region, SERVICE);

        let (canonical_headers, signed_headers) = match content_type {
            Some(ct) => (
                format!("content-type:{}\nhost:{}\n", ct, host),
                "content-type;host",
            ),
            None => (format!("host:{}\n", host), "host"),
        };

        // Already in sorted order, as SigV4 requires.
        let params = [
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{}", self.config.access_key_id, scope),
            ),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", self.config.expires_secs.to_string()),
            ("X-Amz-SignedHeaders", signed_headers.to_string()),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k, false), uri_encode(v, false)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_uri = format!("/{}", uri_encode(key, true));
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, canonical_uri, query, canonical_headers, signed_headers, UNSIGNED_PAYLOAD
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let secret = format!("AWS4{}", self.config.secret_access_key);
        let mut signing_key = hmac_sha256(secret.as_bytes(), &date)?;
        for part in [self.config.region.as_str(), SERVICE, "aws4_request"] {
            signing_key = hmac_sha256(&signing_key, part)?;
        }
        let signature = hex::encode(hmac_sha256(&signing_key, &string_to_sign)?);

        Ok(format!(
            "https://{}{}?{}&X-Amz-Signature={}",
            host, canonical_uri, query, signature
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| YardworkError::Internal(format!("hmac key rejected: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// RFC 3986 encoding as SigV4 expects: unreserved characters pass through,
/// everything else becomes upper-case `%XX`.
fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
