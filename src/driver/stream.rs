//! Partitioned-stream driver — append records to a named Kinesis stream
//!
//! Records partition by `request_id`, which is unique per request, so the
//! stream imposes no meaningful inter-record ordering.

use crate::config::StreamConfig;
use crate::driver::TransportDriver;
use crate::error::{IngestError, Result};
use crate::types::EventRecord;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kinesis::primitives::Blob;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Backend acknowledgement for one appended record
#[derive(Debug, Clone)]
pub struct StreamAck {
    /// Sequence position assigned by the stream
    pub sequence_number: String,

    /// Shard the record landed on
    pub shard_id: String,
}

/// Minimal contract the stream driver needs from a transport client
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// Append one record, keyed by `partition_key`, and wait for the ack
    async fn put_record(&self, data: Bytes, partition_key: &str) -> Result<StreamAck>;

    /// Release the connection
    async fn close(&self) -> Result<()>;
}

/// Kinesis implementation of [`StreamClient`]
pub struct KinesisStreamClient {
    client: aws_sdk_kinesis::Client,
    stream_name: String,
}

impl KinesisStreamClient {
    /// Build a client for the configured stream and region
    pub async fn connect(config: &StreamConfig) -> Result<Self> {
        tracing::info!(
            stream = %config.stream_name,
            region = %config.region,
            "Connecting Kinesis client"
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        Ok(Self {
            client: aws_sdk_kinesis::Client::new(&aws_config),
            stream_name: config.stream_name.clone(),
        })
    }
}

#[async_trait]
impl StreamClient for KinesisStreamClient {
    async fn put_record(&self, data: Bytes, partition_key: &str) -> Result<StreamAck> {
        let output = self
            .client
            .put_record()
            .stream_name(&self.stream_name)
            .data(Blob::new(data.to_vec()))
            .partition_key(partition_key)
            .send()
            .await
            .map_err(|e| IngestError::Publish {
                driver: "kinesis".to_string(),
                reason: e.to_string(),
            })?;

        Ok(StreamAck {
            sequence_number: output.sequence_number().to_string(),
            shard_id: output.shard_id().to_string(),
        })
    }

    async fn close(&self) -> Result<()> {
        // The SDK client holds no connection that needs explicit teardown
        tracing::info!(stream = %self.stream_name, "Kinesis client released");
        Ok(())
    }
}

/// Transport driver over a partitioned append-only stream
pub struct StreamDriver {
    client: Arc<dyn StreamClient>,
    closed: AtomicBool,
}

impl StreamDriver {
    /// Connect to the configured stream backend
    pub async fn connect(config: &StreamConfig) -> Result<Self> {
        let client = KinesisStreamClient::connect(config).await?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Build a driver over an existing transport client
    pub fn with_client(client: Arc<dyn StreamClient>) -> Self {
        Self {
            client,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TransportDriver for StreamDriver {
    async fn publish_sync(&self, record: &EventRecord) -> Result<()> {
        let Some(data) = encode(record) else {
            return Ok(());
        };

        let ack = self.client.put_record(data, &record.request_id).await?;
        tracing::info!(
            rid = %record.request_id,
            sequence = %ack.sequence_number,
            shard = %ack.shard_id,
            "Record appended"
        );
        Ok(())
    }

    async fn publish_async(&self, record: &EventRecord) {
        let Some(data) = encode(record) else {
            return;
        };

        tracing::info!(rid = %record.request_id, "Appending record");
        let client = Arc::clone(&self.client);
        let rid = record.request_id.clone();
        tokio::spawn(async move {
            if let Err(e) = client.put_record(data, &rid).await {
                tracing::error!(rid = %rid, error = %e, "Async stream append failed");
            }
        });
    }

    fn name(&self) -> &str {
        "kinesis"
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.client.close().await?;
        tracing::info!(driver = self.name(), "Driver closed");
        Ok(())
    }
}

/// Serialize a record to its stream payload
///
/// Failure is a logged no-op send, never fatal to the request.
fn encode(record: &EventRecord) -> Option<Bytes> {
    match serde_json::to_vec(record) {
        Ok(bytes) => Some(Bytes::from(bytes)),
        Err(e) => {
            tracing::warn!(
                rid = %record.request_id,
                error = %e,
                "Could not serialize record, dropping send"
            );
            None
        }
    }
}
