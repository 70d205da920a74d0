//! Response bodies of the DNS OpenAPI and error classification

use aliddns_core::traits::{DnsRecord, RecordType};
use aliddns_core::Error;
use serde::Deserialize;

/// Provider name used in error messages
pub(crate) const PROVIDER: &str = "alidns";

/// `DescribeSubDomainRecords` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeSubDomainRecordsResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub domain_records: DomainRecords,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DomainRecords {
    #[serde(rename = "Record", default)]
    pub record: Vec<RecordItem>,
}

/// One record as returned by the API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordItem {
    pub record_id: String,
    #[serde(rename = "RR")]
    pub rr: String,
    pub domain_name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    pub value: String,
    #[serde(rename = "TTL", default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub line: Option<String>,
}

impl From<RecordItem> for DnsRecord {
    fn from(item: RecordItem) -> Self {
        DnsRecord {
            record_type: RecordType::parse(&item.record_type),
            id: item.record_id,
            rr: item.rr,
            domain_name: item.domain_name,
            value: item.value,
            ttl: item.ttl,
            line: item.line,
        }
    }
}

/// `AddDomainRecord` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddDomainRecordResponse {
    pub record_id: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// `UpdateDomainRecord` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDomainRecordResponse {
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

fn is_auth_code(code: &str) -> bool {
    code.starts_with("InvalidAccessKeyId")
        || code.starts_with("Forbidden")
        || code == "SignatureDoesNotMatch"
        || code == "IncompleteSignature"
        || code == "InvalidAccessKeySecret"
}

/// Map a failed API response to an error
///
/// Credential and signature problems become `Error::Authentication`,
/// throttling becomes `Error::RateLimited`, everything else is reported as a
/// provider error carrying the API code, message and request id.
pub fn classify_error(status: u16, body: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let detail = match parsed.code.as_deref() {
        Some(code) => {
            let mut detail = format!(
                "{}: {}",
                code,
                parsed.message.as_deref().unwrap_or("no message")
            );
            if let Some(ref id) = parsed.request_id {
                detail.push_str(&format!(" (RequestId: {})", id));
            }
            detail
        }
        None => format!("HTTP {}: {}", status, body.trim()),
    };

    let code = parsed.code.as_deref().unwrap_or_default();

    if status == 401 || status == 403 || is_auth_code(code) {
        Error::auth(detail)
    } else if status == 429 || code.starts_with("Throttling") {
        Error::rate_limited(detail)
    } else {
        Error::provider(PROVIDER, detail)
    }
}
