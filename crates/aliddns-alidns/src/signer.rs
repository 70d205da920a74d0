//! ACS3-HMAC-SHA256 request signing for Alibaba Cloud OpenAPI
//!
//! Only `GET /` RPC calls with an empty body are signed here, which is all
//! the DNS client needs.
//!
//! ```text
//! CanonicalRequest = "GET\n/\n" + CanonicalQuery + "\n"
//!                    + CanonicalHeaders + "\n" + SignedHeaders + "\n"
//!                    + HashedPayload
//! StringToSign     = "ACS3-HMAC-SHA256\n" + hex(sha256(CanonicalRequest))
//! Signature        = hex(hmac_sha256(AccessKeySecret, StringToSign))
//! ```

use aliddns_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name
pub const ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// OpenAPI version of the DNS product
pub const API_VERSION: &str = "2015-01-09";

/// Per-request values that change between calls
#[derive(Debug, Clone)]
pub struct RequestStamp {
    /// UTC timestamp formatted as `%Y-%m-%dT%H:%M:%SZ`
    pub date: String,
    /// Unique nonce
    pub nonce: String,
}

impl RequestStamp {
    /// Stamp for a request sent now
    pub fn now() -> Self {
        Self {
            date: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            nonce: format!("{:032x}", rand::random::<u128>()),
        }
    }
}

/// RFC 3986 percent-encoding: unreserved characters pass through, all other
/// bytes become `%XX` with uppercase hex
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Encode and sort query parameters
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Signs RPC requests with an AccessKey pair
pub struct Signer<'a> {
    access_key_id: &'a str,
    access_secret: &'a str,
}

impl<'a> Signer<'a> {
    pub fn new(access_key_id: &'a str, access_secret: &'a str) -> Self {
        Self {
            access_key_id,
            access_secret,
        }
    }

    /// Produce the signed header set for `GET /?{query}` on `host`
    ///
    /// The returned map includes `host` and `authorization`; every entry
    /// must be sent as-is.
    pub fn sign(
        &self,
        host: &str,
        action: &str,
        query: &str,
        stamp: &RequestStamp,
    ) -> Result<BTreeMap<String, String>> {
        let hashed_payload = sha256_hex(b"");

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), host.to_string());
        headers.insert("x-acs-action".to_string(), action.to_string());
        headers.insert("x-acs-content-sha256".to_string(), hashed_payload.clone());
        headers.insert("x-acs-date".to_string(), stamp.date.clone());
        headers.insert("x-acs-signature-nonce".to_string(), stamp.nonce.clone());
        headers.insert("x-acs-version".to_string(), API_VERSION.to_string());

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

        let canonical_request = format!(
            "GET\n/\n{}\n{}\n{}\n{}",
            query, canonical_headers, signed_headers, hashed_payload
        );
        let string_to_sign = format!(
            "{}\n{}",
            ALGORITHM,
            sha256_hex(canonical_request.as_bytes())
        );

        let mut mac = HmacSha256::new_from_slice(self.access_secret.as_bytes())
            .map_err(|e| Error::auth(format!("unusable AccessKey secret: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        headers.insert(
            "authorization".to_string(),
            format!(
                "{} Credential={},SignedHeaders={},Signature={}",
                ALGORITHM, self.access_key_id, signed_headers, signature
            ),
        );

        Ok(headers)
    }
}
