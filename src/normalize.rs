//! Request normalization — turn an inbound request description into an
//! [`EventRecord`]
//!
//! Absent optional inputs default to empty/`None`; the only caller-visible
//! failure is a body that claims to be base64 but does not decode to UTF-8
//! text.

use crate::error::{IngestError, Result};
use crate::types::{EventRecord, InboundRequest};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;

/// Build the canonical record for one inbound request
pub fn normalize(request: &InboundRequest) -> Result<EventRecord> {
    let request_id = request
        .request_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let payload = decode_body(request)?;
    let uri = build_uri(&request.path, &request.query_params);

    let record = EventRecord {
        request_id,
        received_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        http_method: request.method.clone(),
        path: request.path.clone(),
        uri,
        client_ip: request.header("x-forwarded-for").map(str::to_string),
        user_agent: request.header("user-agent").map(str::to_string),
        app_id: request.classification.app_id.clone(),
        platform: request.classification.platform.clone(),
        compression: request.classification.compression.clone(),
        payload,
    };

    tracing::debug!(rid = %record.request_id, uri = %record.uri, "Request normalized");
    Ok(record)
}

/// Reassemble `path?k=v&k=v` from the parsed query map
///
/// Iterates the map in its own (sorted-key) order, so the result is stable
/// per request even though it may not match the original wire order.
pub fn build_uri(path: &str, query: &BTreeMap<String, String>) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let mut uri = String::with_capacity(path.len() + 16);
    uri.push_str(path);
    uri.push('?');
    for (key, value) in query {
        uri.push_str(key);
        uri.push('=');
        uri.push_str(value);
        uri.push('&');
    }
    uri.pop();
    uri
}

/// Decode the request body into payload text
///
/// Blank bodies normalize to `None`. A base64-marked body must decode to
/// UTF-8 text; either failure surfaces as [`IngestError::BodyDecode`].
fn decode_body(request: &InboundRequest) -> Result<Option<String>> {
    let body = match request.body.as_deref() {
        Some(b) if !b.trim().is_empty() => b,
        _ => return Ok(None),
    };

    if !request.body_is_base64 {
        return Ok(Some(body.to_string()));
    }

    let bytes = BASE64
        .decode(body.trim())
        .map_err(|e| IngestError::BodyDecode(format!("invalid base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| IngestError::BodyDecode(format!("decoded body is not UTF-8: {}", e)))?;

    if text.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Classification;

    fn collect_request() -> InboundRequest {
        let mut request = InboundRequest {
            method: "GET".to_string(),
            path: "/collect".to_string(),
            ..Default::default()
        };
        request
            .query_params
            .insert("a".to_string(), "1".to_string());
        request
            .query_params
            .insert("b".to_string(), "2".to_string());
        request
    }

    #[test]
    fn test_normalize_generates_request_id_and_timestamp() {
        let record = normalize(&collect_request()).unwrap();

        assert!(!record.request_id.is_empty());
        // UUID v4 text form
        assert_eq!(record.request_id.len(), 36);

        // ISO-8601 UTC with milliseconds and explicit offset
        let ts = chrono::DateTime::parse_from_rfc3339(&record.received_at).unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert!(record.received_at.ends_with('Z'));
        let fractional = record.received_at.split('.').nth(1).unwrap();
        assert_eq!(fractional, format!("{:03}Z", ts.timestamp_subsec_millis()));
    }

    #[test]
    fn test_normalize_keeps_caller_request_id() {
        let mut request = collect_request();
        request.request_id = Some("lambda-rid-42".to_string());
        let record = normalize(&request).unwrap();
        assert_eq!(record.request_id, "lambda-rid-42");
    }

    #[test]
    fn test_normalize_blank_caller_request_id_regenerates() {
        let mut request = collect_request();
        request.request_id = Some("   ".to_string());
        let record = normalize(&request).unwrap();
        assert_eq!(record.request_id.len(), 36);
    }

    #[test]
    fn test_uri_reconstruction_is_deterministic() {
        let record = normalize(&collect_request()).unwrap();
        assert_eq!(record.uri, "/collect?a=1&b=2");

        // Re-parsing the rebuilt query yields the same map
        let (_, query) = record.uri.split_once('?').unwrap();
        let reparsed: BTreeMap<String, String> = query
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (k.to_string(), v.to_string())
            })
            .collect();
        assert_eq!(reparsed, collect_request().query_params);
        assert_eq!(build_uri("/collect", &reparsed), record.uri);
    }

    #[test]
    fn test_uri_without_query() {
        let mut request = collect_request();
        request.query_params.clear();
        let record = normalize(&request).unwrap();
        assert_eq!(record.uri, "/collect");
    }

    #[test]
    fn test_base64_body_decodes() {
        let mut request = collect_request();
        request.body = Some("aGVsbG8=".to_string());
        request.body_is_base64 = true;
        let record = normalize(&request).unwrap();
        assert_eq!(record.payload.as_deref(), Some("hello"));
    }

    #[test]
    fn test_invalid_base64_body_is_an_error() {
        let mut request = collect_request();
        request.body = Some("not base64 at all!".to_string());
        request.body_is_base64 = true;
        let err = normalize(&request).unwrap_err();
        assert!(matches!(err, IngestError::BodyDecode(_)));
    }

    #[test]
    fn test_non_utf8_decoded_body_is_an_error() {
        let mut request = collect_request();
        // 0xFF 0xFE is valid base64 input but not valid UTF-8 output
        request.body = Some(BASE64.encode([0xFFu8, 0xFE]));
        request.body_is_base64 = true;
        let err = normalize(&request).unwrap_err();
        assert!(matches!(err, IngestError::BodyDecode(_)));
    }

    #[test]
    fn test_blank_body_normalizes_to_absent() {
        let mut request = collect_request();
        request.body = Some("   ".to_string());
        let record = normalize(&request).unwrap();
        assert_eq!(record.payload, None);

        request.body = None;
        let record = normalize(&request).unwrap();
        assert_eq!(record.payload, None);
    }

    #[test]
    fn test_plain_body_passes_through() {
        let mut request = collect_request();
        request.method = "POST".to_string();
        request.body = Some("{\"events\":[1,2]}".to_string());
        let record = normalize(&request).unwrap();
        assert_eq!(record.payload.as_deref(), Some("{\"events\":[1,2]}"));
        assert_eq!(record.http_method, "POST");
    }

    #[test]
    fn test_headers_and_classification_flow_through() {
        let mut request = collect_request();
        request
            .headers
            .insert("X-Forwarded-For".to_string(), "203.0.113.9".to_string());
        request
            .headers
            .insert("User-Agent".to_string(), "test-agent".to_string());
        request.classification = Classification {
            app_id: "shop".to_string(),
            platform: "iOS".to_string(),
            compression: "gzip".to_string(),
        };

        let record = normalize(&request).unwrap();
        assert_eq!(record.client_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(record.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(record.app_id, "shop");
        assert_eq!(record.platform, "iOS");
        assert_eq!(record.compression, "gzip");
    }

    #[test]
    fn test_missing_optionals_never_fail() {
        let record = normalize(&InboundRequest::default()).unwrap();
        assert_eq!(record.client_ip, None);
        assert_eq!(record.user_agent, None);
        assert_eq!(record.app_id, "");
        assert_eq!(record.platform, "");
        assert_eq!(record.compression, "");
        assert_eq!(record.payload, None);
    }
}
