//! In-memory transport driver for testing and single-process use
//!
//! Records every publish with its delivery mode and exposes a failure
//! toggle so tests can instrument publish errors.

use crate::driver::TransportDriver;
use crate::error::{IngestError, Result};
use crate::types::{DeliveryMode, EventRecord};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory driver — no backend, publishes land in a `Vec`
pub struct MemoryDriver {
    name: String,
    published: RwLock<Vec<(EventRecord, DeliveryMode)>>,
    fail: AtomicBool,
    closes: AtomicUsize,
    closed: AtomicBool,
}

impl MemoryDriver {
    /// Create a driver named "memory"
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create a driver with a custom name, for multi-driver tests
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            published: RwLock::new(Vec::new()),
            fail: AtomicBool::new(false),
            closes: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Make subsequent publishes fail (sync) or drop with a log (async)
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of everything published so far
    pub async fn published(&self) -> Vec<(EventRecord, DeliveryMode)> {
        self.published.read().await.clone()
    }

    /// Number of records published so far
    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }

    /// How many times the underlying close ran
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportDriver for MemoryDriver {
    async fn publish_sync(&self, record: &EventRecord) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(IngestError::Publish {
                driver: self.name.clone(),
                reason: "instrumented failure".to_string(),
            });
        }
        self.published
            .write()
            .await
            .push((record.clone(), DeliveryMode::Sync));
        Ok(())
    }

    async fn publish_async(&self, record: &EventRecord) {
        if self.fail.load(Ordering::SeqCst) {
            tracing::error!(
                rid = %record.request_id,
                driver = %self.name,
                "Async memory publish failed"
            );
            return;
        }
        self.published
            .write()
            .await
            .push((record.clone(), DeliveryMode::Async));
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
