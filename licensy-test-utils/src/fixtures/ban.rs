use chrono::Utc;
use sea_orm::{ActiveValue, EntityTrait};

use crate::{error::TestError, model::LicenseBanModel, TestContext};

impl TestContext {
    pub fn ban<'a>(&'a mut self) -> BanFixtures<'a> {
        BanFixtures { setup: self }
    }
}

pub struct BanFixtures<'a> {
    setup: &'a mut TestContext,
}

impl<'a> BanFixtures<'a> {
    pub async fn insert_ban(
        &self,
        guild_id: i64,
        user_id: i64,
        expires_at: Option<i64>,
    ) -> Result<LicenseBanModel, TestError> {
        Ok(
            entity::prelude::LicenseBan::insert(entity::license_ban::ActiveModel {
                guild_id: ActiveValue::Set(guild_id),
                user_id: ActiveValue::Set(user_id),
                reason: ActiveValue::Set(Some("Abusing license commands".to_string())),
                expires_at: ActiveValue::Set(expires_at),
                created_at: ActiveValue::Set(Utc::now().naive_utc()),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }
}
