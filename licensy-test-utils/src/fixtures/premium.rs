use chrono::Utc;
use sea_orm::{ActiveValue, EntityTrait};

use crate::{error::TestError, model::PremiumModel, TestContext};

impl TestContext {
    pub fn premium<'a>(&'a mut self) -> PremiumFixtures<'a> {
        PremiumFixtures { setup: self }
    }
}

pub struct PremiumFixtures<'a> {
    setup: &'a mut TestContext,
}

impl<'a> PremiumFixtures<'a> {
    pub async fn insert_premium(
        &self,
        guild_id: i64,
        user_id: i64,
        valid_until: i64,
    ) -> Result<PremiumModel, TestError> {
        let now = Utc::now().naive_utc();

        Ok(
            entity::prelude::Premium::insert(entity::premium::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                guild_id: ActiveValue::Set(guild_id),
                valid_until: ActiveValue::Set(valid_until),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }
}
