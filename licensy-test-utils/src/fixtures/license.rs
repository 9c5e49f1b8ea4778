use chrono::Utc;
use entity::license_history::LicenseAction;
use sea_orm::{ActiveValue, EntityTrait};

use crate::{
    constant::{TEST_AUTHOR_ID, TEST_ROLE_ID},
    error::TestError,
    model::{LicenseHistoryModel, LicenseModel},
    TestContext,
};

impl TestContext {
    pub fn license<'a>(&'a mut self) -> LicenseFixtures<'a> {
        LicenseFixtures { setup: self }
    }
}

pub struct LicenseFixtures<'a> {
    setup: &'a mut TestContext,
}

impl<'a> LicenseFixtures<'a> {
    /// Insert a license with full control over its redemption state.
    pub async fn insert_license(
        &self,
        guild_id: i64,
        key: &str,
        redeemer_id: Option<i64>,
        activated: bool,
        valid_until: i64,
    ) -> Result<LicenseModel, TestError> {
        let now = Utc::now().naive_utc();

        Ok(
            entity::prelude::License::insert(entity::license::ActiveModel {
                guild_id: ActiveValue::Set(guild_id),
                key: ActiveValue::Set(key.to_string()),
                role_id: ActiveValue::Set(TEST_ROLE_ID),
                author_id: ActiveValue::Set(TEST_AUTHOR_ID),
                redeemer_id: ActiveValue::Set(redeemer_id),
                activated: ActiveValue::Set(activated),
                valid_until: ActiveValue::Set(valid_until),
                template_id: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }

    /// Insert a license that has not been redeemed.
    pub async fn insert_pending(
        &self,
        guild_id: i64,
        key: &str,
        valid_until: i64,
    ) -> Result<LicenseModel, TestError> {
        self.insert_license(guild_id, key, None, false, valid_until)
            .await
    }

    /// Insert a license already redeemed by `redeemer_id`.
    pub async fn insert_active(
        &self,
        guild_id: i64,
        key: &str,
        redeemer_id: i64,
        valid_until: i64,
    ) -> Result<LicenseModel, TestError> {
        self.insert_license(guild_id, key, Some(redeemer_id), true, valid_until)
            .await
    }

    pub async fn insert_history(
        &self,
        guild_id: i64,
        key: &str,
        action: LicenseAction,
        actor_id: Option<i64>,
        target_id: Option<i64>,
    ) -> Result<LicenseHistoryModel, TestError> {
        Ok(
            entity::prelude::LicenseHistory::insert(entity::license_history::ActiveModel {
                guild_id: ActiveValue::Set(guild_id),
                license_key: ActiveValue::Set(key.to_string()),
                action: ActiveValue::Set(action),
                actor_id: ActiveValue::Set(actor_id),
                target_id: ActiveValue::Set(target_id),
                details: ActiveValue::Set(None),
                created_at: ActiveValue::Set(Utc::now().naive_utc()),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }
}
