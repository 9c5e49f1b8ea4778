use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::server::{
    data::license::LicenseRepository,
    discord::{
        best_effort::{notify_member, revoke_role},
        GuildGateway,
    },
    error::Error,
    event::EventDispatcher,
    model::{db::LicenseModel, event::LicenseExpired},
    scheduler::sweep::{ExpirySweep, Retirement, SweepReport},
};

/// Deletes expired licenses, removing the role from members still in the guild.
///
/// Licenses are processed strictly one after another. A license whose guild or redeemer is
/// gone is deleted with no other side effect.
pub struct LicenseExpirySweep {
    db: DatabaseConnection,
    gateway: Arc<dyn GuildGateway>,
    events: EventDispatcher,
}

impl LicenseExpirySweep {
    /// Creates a new instance of [`LicenseExpirySweep`]
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn GuildGateway>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            db,
            gateway,
            events,
        }
    }

    async fn retire(&self, license: &LicenseModel) -> Result<Retirement, Error> {
        let license_repo = LicenseRepository::new(&self.db);

        let member = match license.redeemer_id {
            Some(redeemer_id) => match self.gateway.fetch_guild(license.guild_id).await? {
                Some(_) => {
                    self.gateway
                        .fetch_member(license.guild_id, redeemer_id)
                        .await?
                }
                None => None,
            },
            None => None,
        };

        let Some(member) = member else {
            license_repo.delete_by_id(license.id).await?;
            tracing::info!(
                guild_id = license.guild_id,
                key = %license.key,
                "Deleted orphaned expired license"
            );

            return Ok(Retirement::Orphaned);
        };

        self.events
            .license_expired(LicenseExpired {
                guild_id: license.guild_id,
                license: license.clone(),
                redeemer_id: member.user_id,
            })
            .await;

        let message = format!(
            "Your license key `{}` has expired.\nAnd the role <@&{}> has been removed from you.",
            license.key, license.role_id
        );
        notify_member(self.gateway.as_ref(), member.user_id, &message).await;

        revoke_role(
            self.gateway.as_ref(),
            license.guild_id,
            member.user_id,
            license.role_id,
            "License expired.",
        )
        .await;

        license_repo.delete_by_id(license.id).await?;
        tracing::info!(
            guild_id = license.guild_id,
            key = %license.key,
            redeemer_id = member.user_id,
            "Retired expired license"
        );

        Ok(Retirement::Retired)
    }
}

#[async_trait]
impl ExpirySweep for LicenseExpirySweep {
    fn name(&self) -> &'static str {
        "licenses"
    }

    async fn sweep(&self, now_ms: i64) -> Result<SweepReport, Error> {
        let expired = LicenseRepository::new(&self.db)
            .list_expired(now_ms)
            .await?;

        let mut report = SweepReport::default();

        for license in &expired {
            let outcome = self.retire(license).await;

            if let Err(e) = &outcome {
                tracing::error!(
                    guild_id = license.guild_id,
                    key = %license.key,
                    error = %e,
                    "Failed to retire expired license"
                );
            }

            report.record(&outcome);
        }

        Ok(report)
    }
}
