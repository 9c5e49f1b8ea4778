use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, DeleteResult, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::server::model::db::LicenseBanModel;

use entity::license_ban::Column;

pub struct BanRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> BanRepository<'a, C> {
    /// Creates a new instance of [`BanRepository`]
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        guild_id: i64,
        user_id: i64,
        reason: Option<String>,
        expires_at: Option<i64>,
    ) -> Result<LicenseBanModel, DbErr> {
        let ban = entity::license_ban::ActiveModel {
            guild_id: ActiveValue::Set(guild_id),
            user_id: ActiveValue::Set(user_id),
            reason: ActiveValue::Set(reason),
            expires_at: ActiveValue::Set(expires_at),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        ban.insert(self.db).await
    }

    pub async fn find(&self, guild_id: i64, user_id: i64) -> Result<Option<LicenseBanModel>, DbErr> {
        entity::prelude::LicenseBan::find()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::UserId.eq(user_id))
            .one(self.db)
            .await
    }

    pub async fn list_by_guild(&self, guild_id: i64) -> Result<Vec<LicenseBanModel>, DbErr> {
        entity::prelude::LicenseBan::find()
            .filter(Column::GuildId.eq(guild_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.db)
            .await
    }

    /// Deletes a ban by primary key
    pub async fn delete_by_id(&self, id: i32) -> Result<DeleteResult, DbErr> {
        entity::prelude::LicenseBan::delete_by_id(id)
            .exec(self.db)
            .await
    }

    /// Deletes every ban of a user in a guild
    pub async fn delete_by_user(&self, guild_id: i64, user_id: i64) -> Result<DeleteResult, DbErr> {
        entity::prelude::LicenseBan::delete_many()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::UserId.eq(user_id))
            .exec(self.db)
            .await
    }

    /// Deletes every ban whose expiry has passed, permanent bans are kept
    pub async fn delete_inert(&self, now_ms: i64) -> Result<DeleteResult, DbErr> {
        entity::prelude::LicenseBan::delete_many()
            .filter(Column::ExpiresAt.is_not_null())
            .filter(Column::ExpiresAt.lte(now_ms))
            .exec(self.db)
            .await
    }
}

#[cfg(test)]
mod tests {

    mod delete_inert {
        use licensy_test_utils::prelude::*;

        use crate::server::data::ban::BanRepository;

        /// Expect expired bans to be deleted while permanent and future bans stay
        #[tokio::test]
        async fn deletes_only_expired_bans() -> Result<(), TestError> {
            let now = 1_000_000;
            let test = TestBuilder::new()
                .with_license_tables()
                .with_ban(TEST_GUILD_ID, 1, Some(now - 1))
                .with_ban(TEST_GUILD_ID, 2, Some(now + 1))
                .with_ban(TEST_GUILD_ID, 3, None)
                .build()
                .await?;

            let ban_repo = BanRepository::new(&test.db);
            let result = ban_repo.delete_inert(now).await?;

            assert_eq!(result.rows_affected, 1);
            assert!(ban_repo.find(TEST_GUILD_ID, 1).await?.is_none());
            assert!(ban_repo.find(TEST_GUILD_ID, 2).await?.is_some());
            assert!(ban_repo.find(TEST_GUILD_ID, 3).await?.is_some());

            Ok(())
        }
    }
}
