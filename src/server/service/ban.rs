use sea_orm::DatabaseConnection;

use crate::server::{
    data::ban::BanRepository,
    error::{access::AccessError, Error},
    model::db::LicenseBanModel,
};

/// Whether a ban no longer applies at `now_ms`. Permanent bans never lapse.
pub fn is_inert(ban: &LicenseBanModel, now_ms: i64) -> bool {
    ban.expires_at.is_some_and(|expires_at| expires_at <= now_ms)
}

pub struct BanService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BanService<'a> {
    /// Creates a new instance of [`BanService`]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Bans a user from license commands, permanently when `duration_ms` is `None`
    ///
    /// A lapsed ban of the same user is purged first.
    pub async fn ban(
        &self,
        guild_id: i64,
        user_id: i64,
        reason: Option<String>,
        duration_ms: Option<i64>,
        now_ms: i64,
    ) -> Result<LicenseBanModel, Error> {
        let expires_at = match duration_ms {
            Some(duration_ms) if duration_ms <= 0 => {
                return Err(AccessError::InvalidDuration(duration_ms).into())
            }
            Some(duration_ms) => Some(
                now_ms
                    .checked_add(duration_ms)
                    .ok_or(AccessError::InvalidDuration(duration_ms))?,
            ),
            None => None,
        };

        if self.active_ban(guild_id, user_id, now_ms).await?.is_some() {
            return Err(AccessError::AlreadyBanned(user_id).into());
        }

        let ban = BanRepository::new(self.db)
            .create(guild_id, user_id, reason, expires_at)
            .await?;

        tracing::info!(guild_id, user_id, ?expires_at, "Banned user from license commands");

        Ok(ban)
    }

    pub async fn unban(&self, guild_id: i64, user_id: i64) -> Result<(), Error> {
        let result = BanRepository::new(self.db)
            .delete_by_user(guild_id, user_id)
            .await?;

        if result.rows_affected == 0 {
            return Err(AccessError::BanNotFound(user_id).into());
        }

        tracing::info!(guild_id, user_id, "Lifted license command ban");

        Ok(())
    }

    /// Active bans of the guild, purging lapsed bans of every guild on the way
    pub async fn list_active(
        &self,
        guild_id: i64,
        now_ms: i64,
    ) -> Result<Vec<LicenseBanModel>, Error> {
        let ban_repo = BanRepository::new(self.db);

        ban_repo.delete_inert(now_ms).await?;

        Ok(ban_repo.list_by_guild(guild_id).await?)
    }

    /// The ban that currently applies to a user, deleting it instead if it has lapsed
    pub async fn active_ban(
        &self,
        guild_id: i64,
        user_id: i64,
        now_ms: i64,
    ) -> Result<Option<LicenseBanModel>, Error> {
        let ban_repo = BanRepository::new(self.db);

        let Some(ban) = ban_repo.find(guild_id, user_id).await? else {
            return Ok(None);
        };

        if is_inert(&ban, now_ms) {
            ban_repo.delete_by_id(ban.id).await?;
            tracing::debug!(guild_id, user_id, "Purged lapsed license ban");

            return Ok(None);
        }

        Ok(Some(ban))
    }
}
