//! Producer registry — process-wide driver lifecycle
//!
//! Owns at most one transport driver per configured backend. Drivers are
//! constructed lazily: a backend that is unreachable when the process
//! starts gets a fresh construction attempt on the next request instead of
//! being permanently disabled.

use crate::config::GatewayConfig;
use crate::driver::{BrokerDriver, StreamDriver, TransportDriver};
use crate::error::{IngestError, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Closed set of backend kinds a slot can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Broker,
    Stream,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Broker => "broker",
            BackendKind::Stream => "stream",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deferred driver construction for one backend slot
pub type DriverFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn TransportDriver>>> + Send + Sync>;

struct BackendSlot {
    kind: BackendKind,
    factory: DriverFactory,
    /// The slot lock doubles as the construction guard: concurrent first
    /// requests cannot race to build duplicate clients
    driver: Mutex<Option<Arc<dyn TransportDriver>>>,
}

/// Owner of zero-or-more transport drivers, keyed by backend kind
///
/// The composition root builds one registry per process, passes it (by
/// reference or inside an `Arc`) into the gateway, and defers
/// [`shutdown`](ProducerRegistry::shutdown) so every constructed driver is
/// flushed and closed exactly once on all exit paths.
pub struct ProducerRegistry {
    slots: Vec<BackendSlot>,
    shut_down: AtomicBool,
}

impl ProducerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Create a registry with a slot per configured backend
    ///
    /// Broker before stream, which is also the fan-out delivery order.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut registry = Self::new();

        if let Some(broker) = config.broker.clone() {
            registry.register(BackendKind::Broker, move || {
                let broker = broker.clone();
                Box::pin(async move {
                    let driver = BrokerDriver::connect(&broker)?;
                    Ok(Arc::new(driver) as Arc<dyn TransportDriver>)
                })
            });
        }

        if let Some(stream) = config.stream.clone() {
            registry.register(BackendKind::Stream, move || {
                let stream = stream.clone();
                Box::pin(async move {
                    let driver = StreamDriver::connect(&stream).await?;
                    Ok(Arc::new(driver) as Arc<dyn TransportDriver>)
                })
            });
        }

        registry
    }

    /// Add a backend slot with its construction factory
    pub fn register<F>(&mut self, kind: BackendKind, factory: F)
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn TransportDriver>>> + Send + Sync + 'static,
    {
        self.slots.push(BackendSlot {
            kind,
            factory: Box::new(factory),
            driver: Mutex::new(None),
        });
    }

    /// Number of configured backend slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The currently available drivers, in registration order
    ///
    /// Lazily constructs any empty slot. Construction failure is logged and
    /// leaves the slot empty for this call; the next call retries. Zero
    /// available drivers is [`IngestError::NoTransportConfigured`].
    pub async fn available_drivers(&self) -> Result<Vec<Arc<dyn TransportDriver>>> {
        let mut drivers = Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            let mut guard = slot.driver.lock().await;
            if guard.is_none() {
                match (slot.factory)().await {
                    Ok(driver) => {
                        tracing::info!(
                            backend = %slot.kind,
                            driver = driver.name(),
                            "Driver constructed"
                        );
                        *guard = Some(driver);
                    }
                    Err(e) => {
                        tracing::error!(
                            backend = %slot.kind,
                            error = %e,
                            "Driver construction failed, slot retries on next request"
                        );
                    }
                }
            }
            if let Some(driver) = guard.as_ref() {
                drivers.push(Arc::clone(driver));
            }
        }

        if drivers.is_empty() {
            tracing::error!("No transport configured");
            return Err(IngestError::NoTransportConfigured);
        }
        Ok(drivers)
    }

    /// Close every constructed driver, exactly once
    ///
    /// Re-entrant safe: a second call is a no-op. Drivers flush internally
    /// as applicable before disconnecting.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        for slot in &self.slots {
            let guard = slot.driver.lock().await;
            if let Some(driver) = guard.as_ref() {
                match driver.close().await {
                    Ok(()) => tracing::info!(driver = driver.name(), "Shutdown"),
                    Err(e) => tracing::warn!(
                        driver = driver.name(),
                        error = %e,
                        "Driver close failed during shutdown"
                    ),
                }
            }
        }
    }
}

impl Default for ProducerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
