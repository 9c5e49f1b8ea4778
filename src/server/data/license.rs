use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait,
    DbErr, DeleteResult, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::server::model::{
    db::LicenseModel,
    license::{LicenseFilter, NewLicense},
};

use entity::license::Column;

pub struct LicenseRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LicenseRepository<'a, C> {
    /// Creates a new instance of [`LicenseRepository`]
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts a pending license
    ///
    /// Fails with a unique constraint violation if the key already exists in the guild.
    pub async fn create(&self, license: NewLicense) -> Result<LicenseModel, DbErr> {
        let license = entity::license::ActiveModel {
            guild_id: ActiveValue::Set(license.guild_id),
            key: ActiveValue::Set(license.key),
            role_id: ActiveValue::Set(license.role_id),
            author_id: ActiveValue::Set(license.author_id),
            redeemer_id: ActiveValue::Set(None),
            activated: ActiveValue::Set(false),
            valid_until: ActiveValue::Set(license.valid_until),
            template_id: ActiveValue::Set(license.template_id),
            created_at: ActiveValue::Set(license.created_at),
            updated_at: ActiveValue::Set(license.created_at),
            ..Default::default()
        };

        license.insert(self.db).await
    }

    /// Inserts pending licenses one by one, returning them in insertion order
    pub async fn create_many(&self, licenses: Vec<NewLicense>) -> Result<Vec<LicenseModel>, DbErr> {
        let mut created = Vec::with_capacity(licenses.len());

        for license in licenses {
            created.push(self.create(license).await?);
        }

        Ok(created)
    }

    pub async fn find(&self, guild_id: i64, key: &str) -> Result<Option<LicenseModel>, DbErr> {
        entity::prelude::License::find()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::Key.eq(key))
            .one(self.db)
            .await
    }

    /// Sets role and/or deadline of a license, only while it is still pending
    ///
    /// Returns `Ok(None)` when no pending license with this key exists.
    pub async fn update_pending(
        &self,
        guild_id: i64,
        key: &str,
        role_id: Option<i64>,
        valid_until: Option<i64>,
    ) -> Result<Option<LicenseModel>, DbErr> {
        let mut update = entity::prelude::License::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().naive_utc()));

        if let Some(role_id) = role_id {
            update = update.col_expr(Column::RoleId, Expr::value(role_id));
        }
        if let Some(valid_until) = valid_until {
            update = update.col_expr(Column::ValidUntil, Expr::value(valid_until));
        }

        let result = update
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::Key.eq(key))
            .filter(Column::Activated.eq(false))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.find(guild_id, key).await
    }

    /// Marks a pending license as redeemed by `redeemer_id`
    ///
    /// Returns `false` when the license does not exist or was already redeemed, in which case
    /// nothing is written.
    pub async fn redeem(&self, guild_id: i64, key: &str, redeemer_id: i64) -> Result<bool, DbErr> {
        let result = entity::prelude::License::update_many()
            .col_expr(Column::Activated, Expr::value(true))
            .col_expr(Column::RedeemerId, Expr::value(Some(redeemer_id)))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::Key.eq(key))
            .filter(Column::Activated.eq(false))
            .filter(Column::RedeemerId.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Pushes the deadline of an active license forward by `add_ms`
    ///
    /// Returns `false` when the license does not exist or is not active.
    pub async fn extend(&self, guild_id: i64, key: &str, add_ms: i64) -> Result<bool, DbErr> {
        let result = entity::prelude::License::update_many()
            .col_expr(
                Column::ValidUntil,
                Expr::col(Column::ValidUntil).add(add_ms),
            )
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::Key.eq(key))
            .filter(Column::Activated.eq(true))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Deletes a license regardless of state
    ///
    /// Returns OK regardless of the license existing, check [`DeleteResult::rows_affected`].
    pub async fn delete(&self, guild_id: i64, key: &str) -> Result<DeleteResult, DbErr> {
        entity::prelude::License::delete_many()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::Key.eq(key))
            .exec(self.db)
            .await
    }

    /// Deletes a license only while it is pending
    pub async fn delete_pending(&self, guild_id: i64, key: &str) -> Result<DeleteResult, DbErr> {
        entity::prelude::License::delete_many()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::Key.eq(key))
            .filter(Column::Activated.eq(false))
            .exec(self.db)
            .await
    }

    /// Deletes every pending license of a guild
    pub async fn delete_all_pending(&self, guild_id: i64) -> Result<DeleteResult, DbErr> {
        entity::prelude::License::delete_many()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::Activated.eq(false))
            .exec(self.db)
            .await
    }

    /// Deletes a license by primary key, used by the reconciler
    pub async fn delete_by_id(&self, id: i32) -> Result<DeleteResult, DbErr> {
        entity::prelude::License::delete_by_id(id)
            .exec(self.db)
            .await
    }

    /// Detaches every license from a template about to be deleted
    pub async fn clear_template(&self, template_id: i32) -> Result<u64, DbErr> {
        let result = entity::prelude::License::update_many()
            .col_expr(Column::TemplateId, Expr::value(Option::<i32>::None))
            .filter(Column::TemplateId.eq(template_id))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Number of licenses a guild currently holds in any state
    pub async fn count_by_guild(&self, guild_id: i64) -> Result<u64, DbErr> {
        entity::prelude::License::find()
            .filter(Column::GuildId.eq(guild_id))
            .count(self.db)
            .await
    }

    pub async fn list_by_guild(
        &self,
        guild_id: i64,
        filter: LicenseFilter,
    ) -> Result<Vec<LicenseModel>, DbErr> {
        let mut query = entity::prelude::License::find().filter(Column::GuildId.eq(guild_id));

        query = match filter {
            LicenseFilter::All => query,
            LicenseFilter::Pending => query.filter(Column::Activated.eq(false)),
            LicenseFilter::Active => query.filter(Column::Activated.eq(true)),
        };

        query.order_by_asc(Column::Id).all(self.db).await
    }

    /// Licenses whose deadline has passed and that are eligible for expiry
    ///
    /// A license is eligible when it is active, or pending with a redeemer recorded. Pending
    /// licenses nobody redeemed are never swept by time alone. The `valid_until <= now`
    /// predicate is evaluated by the database against the `valid_until` index.
    pub async fn list_expired(&self, now_ms: i64) -> Result<Vec<LicenseModel>, DbErr> {
        entity::prelude::License::find()
            .filter(Column::ValidUntil.lte(now_ms))
            .filter(
                Condition::any()
                    .add(Column::Activated.eq(true))
                    .add(Column::RedeemerId.is_not_null()),
            )
            .order_by_asc(Column::ValidUntil)
            .all(self.db)
            .await
    }
}

#[cfg(test)]
mod tests {

    mod create {
        use licensy_test_utils::prelude::*;
        use sea_orm::SqlErr;

        use crate::server::{data::license::LicenseRepository, model::license::NewLicense};

        fn new_license(key: &str) -> NewLicense {
            NewLicense {
                guild_id: TEST_GUILD_ID,
                key: key.to_string(),
                role_id: TEST_ROLE_ID,
                author_id: TEST_AUTHOR_ID,
                valid_until: 1_000,
                template_id: None,
                created_at: chrono::Utc::now().naive_utc(),
            }
        }

        /// Expect a pending license to be created
        #[tokio::test]
        async fn creates_pending_license() -> Result<(), TestError> {
            let test = TestBuilder::new().with_license_tables().build().await?;

            let license_repo = LicenseRepository::new(&test.db);
            let license = license_repo.create(new_license("KEY")).await?;

            assert!(!license.activated);
            assert!(license.redeemer_id.is_none());
            assert_eq!(license.valid_until, 1_000);

            Ok(())
        }

        /// Expect a unique constraint violation when the key already exists in the guild
        #[tokio::test]
        async fn fails_for_duplicate_key() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_pending(TEST_GUILD_ID, "KEY", 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo.create(new_license("KEY")).await;

            let err = result.unwrap_err();
            assert!(matches!(
                err.sql_err(),
                Some(SqlErr::UniqueConstraintViolation(_))
            ));

            Ok(())
        }

        /// Expect the same key to be accepted in a different guild
        #[tokio::test]
        async fn allows_same_key_in_other_guild() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license().insert_pending(1, "KEY", 1_000).await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo.create(new_license("KEY")).await;

            assert!(result.is_ok());

            Ok(())
        }

        /// Expect Error when required tables are missing
        #[tokio::test]
        async fn fails_when_tables_missing() -> Result<(), TestError> {
            let test = TestBuilder::new().build().await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo.create(new_license("KEY")).await;

            assert!(result.is_err());

            Ok(())
        }
    }

    mod redeem {
        use licensy_test_utils::prelude::*;

        use crate::server::data::license::LicenseRepository;

        /// Expect a pending license to become active with the redeemer recorded
        #[tokio::test]
        async fn redeems_pending_license() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_pending(TEST_GUILD_ID, "KEY", 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let applied = license_repo
                .redeem(TEST_GUILD_ID, "KEY", TEST_REDEEMER_ID)
                .await?;

            assert!(applied);
            let license = license_repo.find(TEST_GUILD_ID, "KEY").await?.unwrap();
            assert!(license.activated);
            assert_eq!(license.redeemer_id, Some(TEST_REDEEMER_ID));

            Ok(())
        }

        /// Expect a second redemption to apply nothing and keep the first redeemer
        #[tokio::test]
        async fn does_not_redeem_twice() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "KEY", TEST_REDEEMER_ID, 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let applied = license_repo.redeem(TEST_GUILD_ID, "KEY", 42).await?;

            assert!(!applied);
            let license = license_repo.find(TEST_GUILD_ID, "KEY").await?.unwrap();
            assert_eq!(license.redeemer_id, Some(TEST_REDEEMER_ID));

            Ok(())
        }
    }

    mod extend {
        use licensy_test_utils::prelude::*;

        use crate::server::data::license::LicenseRepository;

        /// Expect the deadline of an active license to increase by the added amount
        #[tokio::test]
        async fn extends_active_license() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "KEY", TEST_REDEEMER_ID, 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let applied = license_repo.extend(TEST_GUILD_ID, "KEY", 500).await?;

            assert!(applied);
            let license = license_repo.find(TEST_GUILD_ID, "KEY").await?.unwrap();
            assert_eq!(license.valid_until, 1_500);

            Ok(())
        }

        /// Expect a pending license to be left untouched
        #[tokio::test]
        async fn skips_pending_license() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_pending(TEST_GUILD_ID, "KEY", 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let applied = license_repo.extend(TEST_GUILD_ID, "KEY", 500).await?;

            assert!(!applied);
            let license = license_repo.find(TEST_GUILD_ID, "KEY").await?.unwrap();
            assert_eq!(license.valid_until, 1_000);

            Ok(())
        }
    }

    mod update_pending {
        use licensy_test_utils::prelude::*;

        use crate::server::data::license::LicenseRepository;

        /// Expect role and deadline of a pending license to be replaced
        #[tokio::test]
        async fn updates_pending_license() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_pending(TEST_GUILD_ID, "KEY", 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo
                .update_pending(TEST_GUILD_ID, "KEY", Some(7), Some(9_000))
                .await?;

            let license = result.unwrap();
            assert_eq!(license.role_id, 7);
            assert_eq!(license.valid_until, 9_000);

            Ok(())
        }

        /// Expect Ok(None) for an active license
        #[tokio::test]
        async fn returns_none_for_active_license() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "KEY", TEST_REDEEMER_ID, 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo
                .update_pending(TEST_GUILD_ID, "KEY", Some(7), None)
                .await?;

            assert!(result.is_none());

            Ok(())
        }
    }

    mod delete {
        use licensy_test_utils::prelude::*;

        use crate::server::data::license::LicenseRepository;

        /// Expect one row affected when deleting an existing license
        #[tokio::test]
        async fn deletes_existing_license() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "KEY", TEST_REDEEMER_ID, 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo.delete(TEST_GUILD_ID, "KEY").await?;

            assert_eq!(result.rows_affected, 1);
            assert!(license_repo.find(TEST_GUILD_ID, "KEY").await?.is_none());

            Ok(())
        }

        /// Expect no rows affected when the license is already gone
        #[tokio::test]
        async fn returns_no_rows_for_missing_license() -> Result<(), TestError> {
            let test = TestBuilder::new().with_license_tables().build().await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo.delete(TEST_GUILD_ID, "KEY").await?;

            assert_eq!(result.rows_affected, 0);

            Ok(())
        }

        /// Expect only pending licenses of the guild to be removed
        #[tokio::test]
        async fn deletes_all_pending_only() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_pending(TEST_GUILD_ID, "PENDING1", 1_000)
                .await?;
            test.license()
                .insert_pending(TEST_GUILD_ID, "PENDING2", 1_000)
                .await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "ACTIVE", TEST_REDEEMER_ID, 1_000)
                .await?;
            test.license().insert_pending(1, "OTHER", 1_000).await?;

            let license_repo = LicenseRepository::new(&test.db);
            let result = license_repo.delete_all_pending(TEST_GUILD_ID).await?;

            assert_eq!(result.rows_affected, 2);
            assert_eq!(license_repo.count_by_guild(TEST_GUILD_ID).await?, 1);
            assert_eq!(license_repo.count_by_guild(1).await?, 1);

            Ok(())
        }
    }

    mod list_expired {
        use licensy_test_utils::prelude::*;

        use crate::server::data::license::LicenseRepository;

        /// Expect licenses at or before `now` to be returned and later ones skipped
        #[tokio::test]
        async fn returns_licenses_at_or_before_now() -> Result<(), TestError> {
            let now = 1_000_000;
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "PAST", TEST_REDEEMER_ID, now - 1_000)
                .await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "NOW", TEST_REDEEMER_ID, now)
                .await?;
            test.license()
                .insert_active(TEST_GUILD_ID, "FUTURE", TEST_REDEEMER_ID, now + 5_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let expired = license_repo.list_expired(now).await?;

            let keys: Vec<_> = expired.iter().map(|l| l.key.as_str()).collect();
            assert_eq!(keys, vec!["PAST", "NOW"]);

            Ok(())
        }

        /// Expect pending licenses without a redeemer to never be returned
        #[tokio::test]
        async fn skips_unredeemed_pending_licenses() -> Result<(), TestError> {
            let now = 1_000_000;
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_pending(TEST_GUILD_ID, "PENDING", now - 1_000)
                .await?;
            test.license()
                .insert_license(TEST_GUILD_ID, "ODD", Some(TEST_REDEEMER_ID), false, now - 1_000)
                .await?;

            let license_repo = LicenseRepository::new(&test.db);
            let expired = license_repo.list_expired(now).await?;

            assert_eq!(expired.len(), 1);
            assert_eq!(expired[0].key, "ODD");

            Ok(())
        }
    }
}
