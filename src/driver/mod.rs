//! Transport driver trait — the core abstraction for outbound backends
//!
//! Each driver wraps one backend connection and knows how to publish a
//! single record to it, synchronously or asynchronously, and how to shut
//! down cleanly. The set of implementers is closed: the partitioned-stream
//! driver, the topic-broker driver, and an in-memory driver for tests.

use crate::error::Result;
use crate::types::EventRecord;
use async_trait::async_trait;

pub mod broker;
pub mod memory;
pub mod stream;

pub use broker::{BrokerClient, BrokerDriver, KafkaBrokerClient};
pub use memory::MemoryDriver;
pub use stream::{KinesisStreamClient, StreamAck, StreamClient, StreamDriver};

/// Core trait for transport backends
///
/// Drivers are owned by the
/// [`ProducerRegistry`](crate::registry::ProducerRegistry) and must be safe
/// for concurrent publish calls from multiple requests. Records are handed
/// in read-only and never mutated.
#[async_trait]
pub trait TransportDriver: Send + Sync {
    /// Publish one record and wait for the backend to acknowledge it
    ///
    /// Failures surface as [`IngestError::Publish`](crate::error::IngestError)
    /// and the caller is expected to propagate them.
    async fn publish_sync(&self, record: &EventRecord) -> Result<()>;

    /// Publish one record without waiting for delivery
    ///
    /// Returns once the record is enqueued. Delivery failures are logged
    /// inside the driver and never reach the request path.
    async fn publish_async(&self, record: &EventRecord);

    /// Driver name (e.g., "kafka", "kinesis", "memory")
    ///
    /// Used in logs and to identify registry slots.
    fn name(&self) -> &str;

    /// Release the backend connection
    ///
    /// Idempotent; a second call is a no-op. The broker driver flushes
    /// buffered records before disconnecting.
    async fn close(&self) -> Result<()>;
}
