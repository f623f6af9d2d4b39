//! Core types for the ingestion gateway
//!
//! All wire types use camelCase JSON serialization, matching the field
//! names consumers downstream of the transports expect.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved sentinel marking a configuration value as unset
///
/// Deployment templating writes this into environment variables for
/// backends that are not enabled.
pub const UNSET: &str = "__NOT_SET__";

/// The canonical normalized representation of one ingested request
///
/// Built once per inbound request by [`normalize`](crate::normalize::normalize)
/// and handed read-only to every transport driver. `request_id` doubles as
/// the partition key for the partitioned-stream backend and as the
/// correlation id echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Unique per-request identifier (random UUID, or the platform-assigned
    /// request id when the caller supplies one)
    pub request_id: String,

    /// Capture time — ISO-8601 UTC with millisecond precision and explicit offset
    pub received_at: String,

    /// Original request verb
    pub http_method: String,

    /// Request path without query string
    pub path: String,

    /// Path plus re-serialized query string
    pub uri: String,

    /// Client address from the forwarded-for header
    #[serde(default)]
    pub client_ip: Option<String>,

    /// User agent header value
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Caller-supplied application identifier
    #[serde(default)]
    pub app_id: String,

    /// Caller-supplied platform tag
    #[serde(default)]
    pub platform: String,

    /// Caller-supplied payload compression tag
    #[serde(default)]
    pub compression: String,

    /// Request body; blank bodies normalize to absent
    #[serde(default)]
    pub payload: Option<String>,
}

/// Caller-supplied classification fields, taken from query parameters
///
/// All fields default to the empty string — absence is never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub platform: String,

    #[serde(default)]
    pub compression: String,
}

/// A structured description of one inbound request
///
/// This is the contract between the HTTP/Lambda entry points and the core:
/// the adapters parse their native event shape into this and hand it to
/// [`IngestGateway::ingest`](crate::gateway::IngestGateway::ingest).
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Request verb
    pub method: String,

    /// Request path without query string
    pub path: String,

    /// Parsed query parameters
    ///
    /// A sorted map, so the rebuilt query string is deterministic per
    /// request. The rebuilt order need not match the original wire order.
    pub query_params: BTreeMap<String, String>,

    /// Request headers; looked up case-insensitively
    pub headers: BTreeMap<String, String>,

    /// Raw request body, possibly base64-encoded
    pub body: Option<String>,

    /// Whether `body` is base64-encoded and must be decoded to UTF-8 text
    pub body_is_base64: bool,

    /// Platform-assigned request id, when the entry point has one
    /// (Lambda invocations); `None` makes the normalizer generate a UUID
    pub request_id: Option<String>,

    /// Caller-supplied classification fields
    pub classification: Classification,
}

impl InboundRequest {
    /// Look up a header value, ignoring ASCII case of the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Per-request delivery semantics for the fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Block until every backend acknowledges; first failure aborts
    Sync,
    /// Fire-and-forget; backend failures are logged inside the drivers
    Async,
}

impl DeliveryMode {
    /// Parse the caller-supplied `sync` flag
    ///
    /// Exactly `"1"` or `"true"` (case-sensitive) selects synchronous
    /// delivery; anything else is asynchronous.
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "1" | "true" => DeliveryMode::Sync,
            _ => DeliveryMode::Async,
        }
    }
}

impl Default for DeliveryMode {
    fn default() -> Self {
        DeliveryMode::Async
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> EventRecord {
        EventRecord {
            request_id: "rid-123".to_string(),
            received_at: "2024-05-01T09:30:00.123Z".to_string(),
            http_method: "POST".to_string(),
            path: "/collect".to_string(),
            uri: "/collect?appId=web".to_string(),
            client_ip: Some("203.0.113.9".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            app_id: "web".to_string(),
            platform: "Android".to_string(),
            compression: "gzip".to_string(),
            payload: Some("{\"events\":[]}".to_string()),
        }
    }

    #[test]
    fn test_record_wire_field_names() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"requestId\":\"rid-123\""));
        assert!(json.contains("\"receivedAt\":\"2024-05-01T09:30:00.123Z\""));
        assert!(json.contains("\"httpMethod\":\"POST\""));
        assert!(json.contains("\"clientIp\":\"203.0.113.9\""));
        assert!(json.contains("\"userAgent\":\"Mozilla/5.0\""));
        assert!(json.contains("\"appId\":\"web\""));
        assert!(json.contains("\"platform\":\"Android\""));
        assert!(json.contains("\"compression\":\"gzip\""));
        assert!(json.contains("\"payload\":\"{\\\"events\\\":[]}\""));
    }

    #[test]
    fn test_record_serialization_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, record.request_id);
        assert_eq!(parsed.uri, record.uri);
        assert_eq!(parsed.payload, record.payload);
    }

    #[test]
    fn test_record_tree_preserves_field_names() {
        let tree = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(tree["requestId"], "rid-123");
        assert_eq!(tree["path"], "/collect");
        assert!(tree.get("request_id").is_none());
    }

    #[test]
    fn test_delivery_mode_flag_parsing() {
        assert_eq!(DeliveryMode::from_flag("1"), DeliveryMode::Sync);
        assert_eq!(DeliveryMode::from_flag("true"), DeliveryMode::Sync);
        assert_eq!(DeliveryMode::from_flag(""), DeliveryMode::Async);
        assert_eq!(DeliveryMode::from_flag("0"), DeliveryMode::Async);
        assert_eq!(DeliveryMode::from_flag("yes"), DeliveryMode::Async);
        // Case-sensitive on purpose
        assert_eq!(DeliveryMode::from_flag("TRUE"), DeliveryMode::Async);
        assert_eq!(DeliveryMode::from_flag("True"), DeliveryMode::Async);
    }

    #[test]
    fn test_delivery_mode_default_is_async() {
        assert_eq!(DeliveryMode::default(), DeliveryMode::Async);
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let mut request = InboundRequest::default();
        request
            .headers
            .insert("X-Forwarded-For".to_string(), "198.51.100.7".to_string());
        request
            .headers
            .insert("user-agent".to_string(), "curl/8.0".to_string());

        assert_eq!(request.header("x-forwarded-for"), Some("198.51.100.7"));
        assert_eq!(request.header("USER-AGENT"), Some("curl/8.0"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn test_classification_defaults_empty() {
        let c = Classification::default();
        assert_eq!(c.app_id, "");
        assert_eq!(c.platform, "");
        assert_eq!(c.compression, "");

        let parsed: Classification = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.app_id, "");
    }
}
