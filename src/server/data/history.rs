use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::server::{
    config::limits::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT},
    model::{
        db::LicenseHistoryModel,
        license::{HistoryQuery, NewHistoryEntry},
    },
};

use entity::license_history::Column;

pub struct HistoryRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> HistoryRepository<'a, C> {
    /// Creates a new instance of [`HistoryRepository`]
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Appends a history entry
    pub async fn append(&self, entry: NewHistoryEntry) -> Result<LicenseHistoryModel, DbErr> {
        let entry = entity::license_history::ActiveModel {
            guild_id: ActiveValue::Set(entry.guild_id),
            license_key: ActiveValue::Set(entry.license_key),
            action: ActiveValue::Set(entry.action),
            actor_id: ActiveValue::Set(entry.actor_id),
            target_id: ActiveValue::Set(entry.target_id),
            details: ActiveValue::Set(entry.details),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        entry.insert(self.db).await
    }

    /// Appends several history entries in order
    pub async fn append_many(
        &self,
        entries: Vec<NewHistoryEntry>,
    ) -> Result<Vec<LicenseHistoryModel>, DbErr> {
        let mut appended = Vec::with_capacity(entries.len());

        for entry in entries {
            appended.push(self.append(entry).await?);
        }

        Ok(appended)
    }

    /// Guild history matching every given filter, newest first
    pub async fn query(
        &self,
        guild_id: i64,
        query: HistoryQuery,
    ) -> Result<Vec<LicenseHistoryModel>, DbErr> {
        let mut select =
            entity::prelude::LicenseHistory::find().filter(Column::GuildId.eq(guild_id));

        if let Some(key) = query.license_key {
            select = select.filter(Column::LicenseKey.eq(key));
        }
        if let Some(action) = query.action {
            select = select.filter(Column::Action.eq(action));
        }
        if let Some(actor_id) = query.actor_id {
            select = select.filter(Column::ActorId.eq(actor_id));
        }
        if let Some(target_id) = query.target_id {
            select = select.filter(Column::TargetId.eq(target_id));
        }

        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(self.db)
            .await
    }
}

#[cfg(test)]
mod tests {

    mod query {
        use entity::license_history::LicenseAction;
        use licensy_test_utils::prelude::*;

        use crate::server::{data::history::HistoryRepository, model::license::HistoryQuery};

        /// Expect entries newest first
        #[tokio::test]
        async fn returns_newest_first() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            for key in ["A", "B", "C"] {
                test.license()
                    .insert_history(TEST_GUILD_ID, key, LicenseAction::Create, None, None)
                    .await?;
            }

            let history_repo = HistoryRepository::new(&test.db);
            let entries = history_repo
                .query(TEST_GUILD_ID, HistoryQuery::default())
                .await?;

            let keys: Vec<_> = entries.iter().map(|e| e.license_key.as_str()).collect();
            assert_eq!(keys, vec!["C", "B", "A"]);

            Ok(())
        }

        /// Expect filters on action and actor to combine
        #[tokio::test]
        async fn filters_by_action_and_actor() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            test.license()
                .insert_history(TEST_GUILD_ID, "A", LicenseAction::Create, Some(1), None)
                .await?;
            test.license()
                .insert_history(TEST_GUILD_ID, "A", LicenseAction::Redeem, Some(2), None)
                .await?;
            test.license()
                .insert_history(TEST_GUILD_ID, "B", LicenseAction::Redeem, Some(1), None)
                .await?;

            let history_repo = HistoryRepository::new(&test.db);
            let entries = history_repo
                .query(
                    TEST_GUILD_ID,
                    HistoryQuery {
                        action: Some(LicenseAction::Redeem),
                        actor_id: Some(1),
                        ..Default::default()
                    },
                )
                .await?;

            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].license_key, "B");

            Ok(())
        }

        /// Expect the limit to be clamped to at most 25 entries
        #[tokio::test]
        async fn clamps_limit() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            for i in 0..30 {
                test.license()
                    .insert_history(
                        TEST_GUILD_ID,
                        &format!("K{}", i),
                        LicenseAction::Create,
                        None,
                        None,
                    )
                    .await?;
            }

            let history_repo = HistoryRepository::new(&test.db);
            let entries = history_repo
                .query(
                    TEST_GUILD_ID,
                    HistoryQuery {
                        limit: Some(100),
                        ..Default::default()
                    },
                )
                .await?;

            assert_eq!(entries.len(), 25);

            Ok(())
        }
    }
}
