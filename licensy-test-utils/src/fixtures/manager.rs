use chrono::Utc;
use sea_orm::{ActiveValue, EntityTrait};

use crate::{error::TestError, model::LicenseManagerModel, TestContext};

impl TestContext {
    pub fn manager<'a>(&'a mut self) -> ManagerFixtures<'a> {
        ManagerFixtures { setup: self }
    }
}

pub struct ManagerFixtures<'a> {
    setup: &'a mut TestContext,
}

impl<'a> ManagerFixtures<'a> {
    pub async fn insert_manager(
        &self,
        guild_id: i64,
        role_id: i64,
    ) -> Result<LicenseManagerModel, TestError> {
        Ok(
            entity::prelude::LicenseManager::insert(entity::license_manager::ActiveModel {
                guild_id: ActiveValue::Set(guild_id),
                role_id: ActiveValue::Set(role_id),
                created_at: ActiveValue::Set(Utc::now().naive_utc()),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }
}
