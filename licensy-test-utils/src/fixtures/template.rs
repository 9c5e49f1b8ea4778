use chrono::Utc;
use sea_orm::{ActiveValue, EntityTrait};

use crate::{
    constant::{TEST_AUTHOR_ID, TEST_GUILD_ID, TEST_ROLE_ID},
    error::TestError,
    model::LicenseTemplateModel,
    TestContext,
};

/// Duration given to fixture templates (one day).
pub const TEST_TEMPLATE_DURATION_MS: i64 = 86_400_000;

impl TestContext {
    pub fn template<'a>(&'a mut self) -> TemplateFixtures<'a> {
        TemplateFixtures { setup: self }
    }
}

pub struct TemplateFixtures<'a> {
    setup: &'a mut TestContext,
}

impl<'a> TemplateFixtures<'a> {
    /// Insert a template into the test guild granting the test role for one day.
    pub async fn insert_template(
        &self,
        name: &str,
        stock: Option<i32>,
        generated_count: i32,
    ) -> Result<LicenseTemplateModel, TestError> {
        let now = Utc::now().naive_utc();

        Ok(
            entity::prelude::LicenseTemplate::insert(entity::license_template::ActiveModel {
                guild_id: ActiveValue::Set(TEST_GUILD_ID),
                name: ActiveValue::Set(name.to_string()),
                name_key: ActiveValue::Set(name.trim().to_lowercase()),
                role_id: ActiveValue::Set(TEST_ROLE_ID),
                duration_ms: ActiveValue::Set(TEST_TEMPLATE_DURATION_MS),
                stock: ActiveValue::Set(stock),
                generated_count: ActiveValue::Set(generated_count),
                created_by: ActiveValue::Set(TEST_AUTHOR_ID),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }

    /// Re-read a template, returning `None` once it has been deleted.
    pub async fn reload(&self, id: i32) -> Result<Option<LicenseTemplateModel>, TestError> {
        Ok(entity::prelude::LicenseTemplate::find_by_id(id)
            .one(&self.setup.db)
            .await?)
    }
}
