use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::server::{
    data::premium::PremiumRepository,
    discord::{best_effort::notify_member, GuildGateway},
    error::Error,
    model::db::PremiumModel,
    scheduler::sweep::{ExpirySweep, Retirement, SweepReport},
};

/// Deletes expired premium grants, notifying holders who are still in the guild.
pub struct PremiumExpirySweep {
    db: DatabaseConnection,
    gateway: Arc<dyn GuildGateway>,
}

impl PremiumExpirySweep {
    /// Creates a new instance of [`PremiumExpirySweep`]
    pub fn new(db: DatabaseConnection, gateway: Arc<dyn GuildGateway>) -> Self {
        Self { db, gateway }
    }

    async fn retire(&self, premium: &PremiumModel) -> Result<Retirement, Error> {
        let premium_repo = PremiumRepository::new(&self.db);

        let guild = self.gateway.fetch_guild(premium.guild_id).await?;
        let member = match &guild {
            Some(_) => {
                self.gateway
                    .fetch_member(premium.guild_id, premium.user_id)
                    .await?
            }
            None => None,
        };

        let (Some(guild), Some(member)) = (guild, member) else {
            premium_repo.delete_by_id(premium.id).await?;
            tracing::info!(
                guild_id = premium.guild_id,
                user_id = premium.user_id,
                "Deleted orphaned expired premium"
            );

            return Ok(Retirement::Orphaned);
        };

        let message = format!(
            "Your premium on Licensy has expired.\nYou no longer have premium in the guild `{}`.",
            guild.name
        );
        notify_member(self.gateway.as_ref(), member.user_id, &message).await;

        premium_repo.delete_by_id(premium.id).await?;
        tracing::info!(
            guild_id = premium.guild_id,
            user_id = premium.user_id,
            "Retired expired premium"
        );

        Ok(Retirement::Retired)
    }
}

#[async_trait]
impl ExpirySweep for PremiumExpirySweep {
    fn name(&self) -> &'static str {
        "premium"
    }

    async fn sweep(&self, now_ms: i64) -> Result<SweepReport, Error> {
        let expired = PremiumRepository::new(&self.db)
            .list_expired(now_ms)
            .await?;

        let mut report = SweepReport::default();

        for premium in &expired {
            let outcome = self.retire(premium).await;

            if let Err(e) = &outcome {
                tracing::error!(
                    guild_id = premium.guild_id,
                    user_id = premium.user_id,
                    error = %e,
                    "Failed to retire expired premium"
                );
            }

            report.record(&outcome);
        }

        Ok(report)
    }
}
