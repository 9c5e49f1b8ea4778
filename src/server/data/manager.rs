use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, DeleteResult, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::server::model::db::LicenseManagerModel;

use entity::license_manager::Column;

pub struct ManagerRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ManagerRepository<'a, C> {
    /// Creates a new instance of [`ManagerRepository`]
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts a manager role, failing with a unique violation if the role is already present
    pub async fn create(&self, guild_id: i64, role_id: i64) -> Result<LicenseManagerModel, DbErr> {
        let manager = entity::license_manager::ActiveModel {
            guild_id: ActiveValue::Set(guild_id),
            role_id: ActiveValue::Set(role_id),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        manager.insert(self.db).await
    }

    pub async fn find(
        &self,
        guild_id: i64,
        role_id: i64,
    ) -> Result<Option<LicenseManagerModel>, DbErr> {
        entity::prelude::LicenseManager::find()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::RoleId.eq(role_id))
            .one(self.db)
            .await
    }

    pub async fn list_by_guild(&self, guild_id: i64) -> Result<Vec<LicenseManagerModel>, DbErr> {
        entity::prelude::LicenseManager::find()
            .filter(Column::GuildId.eq(guild_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db)
            .await
    }

    pub async fn delete(&self, guild_id: i64, role_id: i64) -> Result<DeleteResult, DbErr> {
        entity::prelude::LicenseManager::delete_many()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::RoleId.eq(role_id))
            .exec(self.db)
            .await
    }
}
