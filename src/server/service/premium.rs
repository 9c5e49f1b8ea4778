use sea_orm::DatabaseConnection;

use crate::server::{
    data::premium::PremiumRepository,
    error::{access::AccessError, Error},
    model::db::PremiumModel,
};

pub struct PremiumService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PremiumService<'a> {
    /// Creates a new instance of [`PremiumService`]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Grants premium to a user in a guild for `duration_ms`
    ///
    /// A grant that already lapsed but was not swept yet is replaced.
    pub async fn grant(
        &self,
        guild_id: i64,
        user_id: i64,
        duration_ms: i64,
        now_ms: i64,
    ) -> Result<PremiumModel, Error> {
        let valid_until = valid_until(duration_ms, now_ms)?;
        let premium_repo = PremiumRepository::new(self.db);

        if let Some(existing) = premium_repo.find(guild_id, user_id).await? {
            if existing.valid_until > now_ms {
                return Err(AccessError::PremiumExists(user_id).into());
            }
            premium_repo.delete_by_id(existing.id).await?;
        }

        let premium = premium_repo.create(guild_id, user_id, valid_until).await?;

        tracing::info!(guild_id, user_id, valid_until, "Granted premium");

        Ok(premium)
    }

    /// Resets a grant to expire `duration_ms` from now
    pub async fn edit(
        &self,
        guild_id: i64,
        user_id: i64,
        duration_ms: i64,
        now_ms: i64,
    ) -> Result<PremiumModel, Error> {
        let valid_until = valid_until(duration_ms, now_ms)?;

        let premium = PremiumRepository::new(self.db)
            .set_valid_until(guild_id, user_id, valid_until)
            .await?
            .ok_or(AccessError::PremiumNotFound(user_id))?;

        tracing::info!(guild_id, user_id, valid_until, "Edited premium");

        Ok(premium)
    }

    pub async fn revoke(&self, guild_id: i64, user_id: i64) -> Result<(), Error> {
        let result = PremiumRepository::new(self.db)
            .delete(guild_id, user_id)
            .await?;

        if result.rows_affected == 0 {
            return Err(AccessError::PremiumNotFound(user_id).into());
        }

        tracing::info!(guild_id, user_id, "Revoked premium");

        Ok(())
    }

    pub async fn info(&self, guild_id: i64, user_id: i64) -> Result<PremiumModel, Error> {
        Ok(PremiumRepository::new(self.db)
            .find(guild_id, user_id)
            .await?
            .ok_or(AccessError::PremiumNotFound(user_id))?)
    }

    pub async fn list(&self, guild_id: i64) -> Result<Vec<PremiumModel>, Error> {
        Ok(PremiumRepository::new(self.db)
            .list_by_guild(guild_id)
            .await?)
    }

    /// Whether the guild has at least one unexpired grant
    pub async fn is_guild_premium(&self, guild_id: i64, now_ms: i64) -> Result<bool, Error> {
        Ok(PremiumRepository::new(self.db)
            .has_active(guild_id, now_ms)
            .await?)
    }
}

fn valid_until(duration_ms: i64, now_ms: i64) -> Result<i64, AccessError> {
    if duration_ms <= 0 {
        return Err(AccessError::InvalidDuration(duration_ms));
    }

    now_ms
        .checked_add(duration_ms)
        .ok_or(AccessError::InvalidDuration(duration_ms))
}
