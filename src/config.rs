//! Gateway configuration — which transport backends exist and where
//!
//! Deployment wires backends through environment variables; a backend is
//! configured only when its required values are present, non-blank, and
//! not the reserved `__NOT_SET__` sentinel.

use crate::types::UNSET;
use serde::{Deserialize, Serialize};

/// Partitioned-stream backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamConfig {
    /// Stream name records are appended to
    pub stream_name: String,

    /// AWS region the stream lives in
    #[serde(default = "default_region")]
    pub region: String,
}

/// Topic-broker backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfig {
    /// Comma-separated bootstrap broker addresses
    pub brokers: String,

    /// Topic records are published to
    pub topic: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Full gateway configuration — zero, one, or both backends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<BrokerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamConfig>,
}

impl GatewayConfig {
    /// Load configuration from process environment variables
    ///
    /// Reads `AWS_MSK_BROKERS`/`AWS_MSK_TOPIC` for the broker backend and
    /// `AWS_KINESIS_STREAM_NAME`/`AWS_REGION` for the stream backend.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let broker = match (configured(lookup("AWS_MSK_BROKERS")), lookup("AWS_MSK_TOPIC")) {
            (Some(brokers), Some(topic)) => Some(BrokerConfig { brokers, topic }),
            _ => None,
        };

        let stream = configured(lookup("AWS_KINESIS_STREAM_NAME")).map(|stream_name| StreamConfig {
            stream_name,
            region: lookup("AWS_REGION").unwrap_or_else(default_region),
        });

        Self { broker, stream }
    }

    /// Whether at least one backend is configured
    pub fn has_backend(&self) -> bool {
        self.broker.is_some() || self.stream.is_some()
    }
}

/// Filter out blank and sentinel values
fn configured(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && v != UNSET)
}
