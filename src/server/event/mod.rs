//! Lifecycle event delivery.
//!
//! Services hand events to an [`EventDispatcher`] after the state change they describe is
//! committed. Delivery is at-most-once and fire-and-forget: a sink error is logged and never
//! reaches the operation that produced the event.

pub mod tracing_sink;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::server::model::event::{LicenseCreated, LicenseExpired, LicenseRedeemed, LicenseStopped};

pub use tracing_sink::TracingEventSink;

/// Failure reported by an event consumer.
#[derive(Error, Debug)]
#[error("{sink} failed to handle {event}: {message}")]
pub struct SinkError {
    pub sink: &'static str,
    pub event: &'static str,
    pub message: String,
}

/// Consumer of lifecycle events. Every method defaults to ignoring the event.
#[async_trait]
pub trait EventSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn license_created(&self, _event: &LicenseCreated) -> Result<(), SinkError> {
        Ok(())
    }

    async fn license_redeemed(&self, _event: &LicenseRedeemed) -> Result<(), SinkError> {
        Ok(())
    }

    async fn license_expired(&self, _event: &LicenseExpired) -> Result<(), SinkError> {
        Ok(())
    }

    async fn license_stopped(&self, _event: &LicenseStopped) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Fans events out to every registered sink in registration order.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventDispatcher {
    /// Creates a dispatcher with no sinks
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub async fn license_created(&self, event: LicenseCreated) {
        for sink in &self.sinks {
            log_failure(sink.license_created(&event).await);
        }
    }

    pub async fn license_redeemed(&self, event: LicenseRedeemed) {
        for sink in &self.sinks {
            log_failure(sink.license_redeemed(&event).await);
        }
    }

    pub async fn license_expired(&self, event: LicenseExpired) {
        for sink in &self.sinks {
            log_failure(sink.license_expired(&event).await);
        }
    }

    pub async fn license_stopped(&self, event: LicenseStopped) {
        for sink in &self.sinks {
            log_failure(sink.license_stopped(&event).await);
        }
    }
}

fn log_failure(result: Result<(), SinkError>) {
    if let Err(e) = result {
        tracing::error!(sink = e.sink, event = e.event, "{}", e);
    }
}
