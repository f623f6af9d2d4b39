//! High-level ingestion gateway — normalize one request, fan it out
//!
//! `IngestGateway` is what the HTTP and Lambda entry points call: it turns
//! a request description into a canonical record, forwards the record to
//! every available driver, and returns the record so callers can echo its
//! `requestId` as a correlation header.

use crate::error::Result;
use crate::normalize::normalize;
use crate::registry::ProducerRegistry;
use crate::types::{DeliveryMode, EventRecord, InboundRequest};

/// Fan-out dispatcher over the producer registry
pub struct IngestGateway {
    registry: ProducerRegistry,
}

impl IngestGateway {
    /// Create a gateway over a registry
    pub fn new(registry: ProducerRegistry) -> Self {
        Self { registry }
    }

    /// Normalize one inbound request and dispatch it
    ///
    /// Returns the normalized record on success; the caller surfaces
    /// `request_id` to the client. Body decode failures surface before any
    /// dispatch attempt.
    pub async fn ingest(
        &self,
        request: &InboundRequest,
        mode: DeliveryMode,
    ) -> Result<EventRecord> {
        let record = normalize(request)?;
        self.dispatch(&record, mode).await?;
        Ok(record)
    }

    /// Send one record to every available driver
    ///
    /// Sync mode propagates the first publish failure and does not attempt
    /// the remaining drivers. Async mode never lets a driver's failure
    /// abort the loop — those are contained inside the drivers.
    pub async fn dispatch(&self, record: &EventRecord, mode: DeliveryMode) -> Result<()> {
        let drivers = self.registry.available_drivers().await?;

        for driver in &drivers {
            match mode {
                DeliveryMode::Sync => driver.publish_sync(record).await?,
                DeliveryMode::Async => driver.publish_async(record).await,
            }
        }

        tracing::debug!(
            rid = %record.request_id,
            drivers = drivers.len(),
            sync = matches!(mode, DeliveryMode::Sync),
            "Record dispatched"
        );
        Ok(())
    }

    /// The underlying registry
    pub fn registry(&self) -> &ProducerRegistry {
        &self.registry
    }

    /// Close every constructed driver, exactly once
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}
