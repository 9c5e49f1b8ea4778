use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, DeleteResult, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::server::model::db::PremiumModel;

use entity::premium::Column;

pub struct PremiumRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> PremiumRepository<'a, C> {
    /// Creates a new instance of [`PremiumRepository`]
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        guild_id: i64,
        user_id: i64,
        valid_until: i64,
    ) -> Result<PremiumModel, DbErr> {
        let now = Utc::now().naive_utc();

        let premium = entity::premium::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            guild_id: ActiveValue::Set(guild_id),
            valid_until: ActiveValue::Set(valid_until),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };

        premium.insert(self.db).await
    }

    pub async fn find(&self, guild_id: i64, user_id: i64) -> Result<Option<PremiumModel>, DbErr> {
        entity::prelude::Premium::find()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::UserId.eq(user_id))
            .one(self.db)
            .await
    }

    /// Replaces the deadline of a grant, returning `Ok(None)` if the grant does not exist
    pub async fn set_valid_until(
        &self,
        guild_id: i64,
        user_id: i64,
        valid_until: i64,
    ) -> Result<Option<PremiumModel>, DbErr> {
        let premium = match self.find(guild_id, user_id).await? {
            Some(premium) => premium,
            None => return Ok(None),
        };

        let mut premium_am = premium.into_active_model();
        premium_am.valid_until = ActiveValue::Set(valid_until);
        premium_am.updated_at = ActiveValue::Set(Utc::now().naive_utc());

        let premium = premium_am.update(self.db).await?;

        Ok(Some(premium))
    }

    pub async fn list_by_guild(&self, guild_id: i64) -> Result<Vec<PremiumModel>, DbErr> {
        entity::prelude::Premium::find()
            .filter(Column::GuildId.eq(guild_id))
            .order_by_asc(Column::ValidUntil)
            .all(self.db)
            .await
    }

    /// Grants whose deadline is at or before `now_ms`
    pub async fn list_expired(&self, now_ms: i64) -> Result<Vec<PremiumModel>, DbErr> {
        entity::prelude::Premium::find()
            .filter(Column::ValidUntil.lte(now_ms))
            .order_by_asc(Column::ValidUntil)
            .all(self.db)
            .await
    }

    /// Whether any grant in the guild is still valid at `now_ms`
    pub async fn has_active(&self, guild_id: i64, now_ms: i64) -> Result<bool, DbErr> {
        let count = entity::prelude::Premium::find()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::ValidUntil.gt(now_ms))
            .count(self.db)
            .await?;

        Ok(count > 0)
    }

    pub async fn delete(&self, guild_id: i64, user_id: i64) -> Result<DeleteResult, DbErr> {
        entity::prelude::Premium::delete_many()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::UserId.eq(user_id))
            .exec(self.db)
            .await
    }

    pub async fn delete_by_id(&self, id: i32) -> Result<DeleteResult, DbErr> {
        entity::prelude::Premium::delete_by_id(id)
            .exec(self.db)
            .await
    }
}
