//! # clickstream-ingest
//!
//! Multi-backend fan-out producer core for clickstream ingestion gateways.
//!
//! ## Overview
//!
//! `clickstream-ingest` normalizes web analytics requests into canonical
//! event records and forwards each record to every configured transport
//! backend — a partitioned append-only stream, a topic-based broker, or
//! both. Delivery is synchronous or asynchronous per request, chosen by
//! the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use clickstream_ingest::{
//!     BackendKind, DeliveryMode, InboundRequest, IngestGateway, MemoryDriver,
//!     ProducerRegistry, TransportDriver,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> clickstream_ingest::Result<()> {
//! // One registry per process; here with the in-memory driver
//! let mut registry = ProducerRegistry::new();
//! registry.register(BackendKind::Broker, || {
//!     Box::pin(async { Ok(Arc::new(MemoryDriver::new()) as Arc<dyn TransportDriver>) })
//! });
//! let gateway = IngestGateway::new(registry);
//!
//! // Ingest one request
//! let request = InboundRequest {
//!     method: "GET".to_string(),
//!     path: "/collect".to_string(),
//!     ..Default::default()
//! };
//! let record = gateway.ingest(&request, DeliveryMode::Async).await?;
//!
//! println!("Ingested: {}", record.request_id);
//! gateway.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Drivers
//!
//! - **memory** — In-memory driver for testing and single-process use
//! - **kafka** — Topic broker via `rdkafka`, batched and snappy-compressed
//! - **kinesis** — Partitioned stream via the AWS SDK, keyed by request id
//!
//! ## Architecture
//!
//! - **TransportDriver** trait — core abstraction all backends implement
//! - **ProducerRegistry** — lazy per-backend driver lifecycle, one slot each
//! - **IngestGateway** — normalize-then-fan-out API for the entry points
//! - **EventRecord** — canonical normalized request record

pub mod config;
pub mod driver;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod registry;
pub mod types;

// Re-export core types
pub use config::{BrokerConfig, GatewayConfig, StreamConfig};
pub use driver::{
    BrokerClient, BrokerDriver, KafkaBrokerClient, KinesisStreamClient, MemoryDriver, StreamAck,
    StreamClient, StreamDriver, TransportDriver,
};
pub use error::{IngestError, Result};
pub use gateway::IngestGateway;
pub use normalize::{build_uri, normalize};
pub use registry::{BackendKind, DriverFactory, ProducerRegistry};
pub use types::{Classification, DeliveryMode, EventRecord, InboundRequest, UNSET};
