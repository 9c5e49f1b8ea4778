use async_trait::async_trait;

use crate::server::{
    event::{EventSink, SinkError},
    model::event::{LicenseCreated, LicenseExpired, LicenseRedeemed, LicenseStopped},
};

/// Writes every lifecycle event as a structured log line.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn license_created(&self, event: &LicenseCreated) -> Result<(), SinkError> {
        tracing::info!(
            guild_id = event.guild_id,
            count = event.licenses.len(),
            duration = %event.duration_label,
            "Licenses created"
        );
        Ok(())
    }

    async fn license_redeemed(&self, event: &LicenseRedeemed) -> Result<(), SinkError> {
        tracing::info!(
            guild_id = event.guild_id,
            key = %event.license.key,
            redeemer_id = event.redeemer_id,
            expires = %event.expiry_label,
            "License redeemed"
        );
        Ok(())
    }

    async fn license_expired(&self, event: &LicenseExpired) -> Result<(), SinkError> {
        tracing::info!(
            guild_id = event.guild_id,
            key = %event.license.key,
            redeemer_id = event.redeemer_id,
            "License expired"
        );
        Ok(())
    }

    async fn license_stopped(&self, event: &LicenseStopped) -> Result<(), SinkError> {
        tracing::info!(
            guild_id = event.guild_id,
            key = %event.license.key,
            redeemer_id = event.redeemer_id,
            actor_id = event.actor_id,
            locale = %event.locale,
            "License stopped"
        );
        Ok(())
    }
}
