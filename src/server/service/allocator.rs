use entity::license_history::LicenseAction;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::server::{
    data::template::TemplateRepository,
    error::{license::LicenseError, Error},
    event::EventDispatcher,
    model::{
        db::{LicenseModel, LicenseTemplateModel},
        event::LicenseCreated,
        license::{NewHistoryEntry, NewLicense},
    },
    service::{license::insert_batch, quota::QuotaService},
    util::{
        key::generate_keys,
        time::{format_duration, from_millis, now_ms},
    },
};

/// Generates licenses from a template under optimistic concurrency.
///
/// The template's `(generated_count, stock)` pair read by the caller is the snapshot. The
/// counter is advanced with a compare-and-swap against that snapshot inside the same
/// transaction that inserts the licenses, so stock can never be oversold and a lost race
/// creates nothing. Conflicts are returned to the caller, never retried here.
pub struct TemplateAllocator<'a> {
    db: &'a DatabaseConnection,
    events: &'a EventDispatcher,
}

impl<'a> TemplateAllocator<'a> {
    /// Creates a new instance of [`TemplateAllocator`]
    pub fn new(db: &'a DatabaseConnection, events: &'a EventDispatcher) -> Self {
        Self { db, events }
    }

    /// Generates `amount` pending licenses from the `template` snapshot
    ///
    /// # Arguments
    /// - `template` - Template as read by the caller, its counter and stock are the CAS snapshot
    /// - `amount` - Number of licenses to generate
    /// - `actor_id` - User generating the licenses, recorded as author
    ///
    /// # Returns
    /// - `Ok(Vec<LicenseModel>)` - Every generated license, all committed together
    /// - `Err(Error::LicenseError(InvalidAmount))` - Zero, or more than the template counter can hold
    /// - `Err(Error::LicenseError(QuotaExceeded))` - A guild or per-command ceiling would be exceeded
    /// - `Err(Error::LicenseError(StockExhausted | InsufficientStock))` - Snapshot has too little stock
    /// - `Err(Error::LicenseError(StockConflict))` - Template changed since the snapshot, nothing created
    pub async fn generate(
        &self,
        template: &LicenseTemplateModel,
        amount: u64,
        actor_id: i64,
    ) -> Result<Vec<LicenseModel>, Error> {
        if amount == 0 {
            return Err(LicenseError::InvalidAmount(amount).into());
        }

        let now = now_ms();
        QuotaService::new(self.db)
            .check(template.guild_id, amount, now)
            .await?;

        let next_generated_count = i32::try_from(amount)
            .ok()
            .and_then(|delta| template.generated_count.checked_add(delta))
            .ok_or(LicenseError::InvalidAmount(amount))?;

        if let Some(stock) = template.stock {
            let remaining = u64::try_from(stock.saturating_sub(template.generated_count)).unwrap_or(0);
            if remaining == 0 {
                return Err(LicenseError::StockExhausted(template.name.clone()).into());
            }
            if amount > remaining {
                return Err(LicenseError::InsufficientStock {
                    name: template.name.clone(),
                    remaining,
                    requested: amount,
                }
                .into());
            }
        }

        let valid_until = now
            .checked_add(template.duration_ms)
            .ok_or(LicenseError::InvalidDuration(template.duration_ms))?;
        let created_at = from_millis(now)
            .ok_or_else(|| Error::InternalError(format!("current time {} out of range", now)))?;

        let txn = self.db.begin().await?;

        let reserved = TemplateRepository::new(&txn)
            .conditional_increment(
                template.id,
                template.generated_count,
                template.stock,
                next_generated_count,
            )
            .await?;

        if !reserved {
            // Dropping the transaction rolls it back
            tracing::debug!(
                template_id = template.id,
                guild_id = template.guild_id,
                "Template changed since snapshot, generation rejected"
            );
            return Err(LicenseError::StockConflict(template.name.clone()).into());
        }

        let keys = generate_keys(amount as usize);
        let history = keys
            .iter()
            .map(|key| NewHistoryEntry {
                guild_id: template.guild_id,
                license_key: key.clone(),
                action: LicenseAction::Create,
                actor_id: Some(actor_id),
                target_id: Some(template.role_id),
                details: Some(format!(
                    "Template: {} | Role: <@&{}> | Created by <@{}>",
                    template.name, template.role_id, actor_id
                )),
            })
            .collect();
        let new_licenses = keys
            .into_iter()
            .map(|key| NewLicense {
                guild_id: template.guild_id,
                key,
                role_id: template.role_id,
                author_id: actor_id,
                valid_until,
                template_id: Some(template.id),
                created_at,
            })
            .collect();

        let licenses = insert_batch(&txn, new_licenses, history).await?;
        txn.commit().await?;

        tracing::info!(
            template_id = template.id,
            guild_id = template.guild_id,
            count = licenses.len(),
            "Generated licenses from template"
        );

        self.events
            .license_created(LicenseCreated {
                guild_id: template.guild_id,
                licenses: licenses.clone(),
                duration_label: format_duration(template.duration_ms),
            })
            .await;

        Ok(licenses)
    }
}

#[cfg(test)]
mod tests {

    mod generate {
        use licensy_test_utils::prelude::*;

        use crate::server::{
            error::{license::LicenseError, Error},
            event::EventDispatcher,
            service::allocator::TemplateAllocator,
        };

        /// Expect generated licenses to reference the template and advance its counter
        #[tokio::test]
        async fn generates_and_advances_counter() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            let template = test
                .template()
                .insert_template("Monthly", Some(5), 0)
                .await?;
            let events = EventDispatcher::new();
            let allocator = TemplateAllocator::new(&test.db, &events);

            let licenses = allocator
                .generate(&template, 3, TEST_AUTHOR_ID)
                .await
                .unwrap();

            assert_eq!(licenses.len(), 3);
            assert!(licenses
                .iter()
                .all(|l| l.template_id == Some(template.id) && !l.activated));

            let reloaded = test.template().reload(template.id).await?.unwrap();
            assert_eq!(reloaded.generated_count, 3);

            Ok(())
        }

        /// Expect a stale snapshot to be rejected without creating anything
        #[tokio::test]
        async fn stale_snapshot_conflicts() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            let snapshot = test
                .template()
                .insert_template("Monthly", Some(5), 0)
                .await?;
            let events = EventDispatcher::new();
            let allocator = TemplateAllocator::new(&test.db, &events);

            allocator
                .generate(&snapshot, 1, TEST_AUTHOR_ID)
                .await
                .unwrap();
            let result = allocator.generate(&snapshot, 1, TEST_AUTHOR_ID).await;

            assert!(matches!(
                result,
                Err(Error::LicenseError(LicenseError::StockConflict(_)))
            ));
            let reloaded = test.template().reload(snapshot.id).await?.unwrap();
            assert_eq!(reloaded.generated_count, 1);

            Ok(())
        }

        /// Expect unlimited templates to skip stock checks
        #[tokio::test]
        async fn unlimited_template_has_no_stock_bound() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            let template = test
                .template()
                .insert_template("Forever", None, 1_000)
                .await?;
            let events = EventDispatcher::new();
            let allocator = TemplateAllocator::new(&test.db, &events);

            let licenses = allocator
                .generate(&template, 2, TEST_AUTHOR_ID)
                .await
                .unwrap();

            assert_eq!(licenses.len(), 2);

            Ok(())
        }

        /// Expect a counter that cannot advance by the amount to be rejected without writing
        #[tokio::test]
        async fn rejects_amount_overflowing_counter() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            let template = test
                .template()
                .insert_template("Forever", None, i32::MAX - 1)
                .await?;
            let events = EventDispatcher::new();
            let allocator = TemplateAllocator::new(&test.db, &events);

            let result = allocator.generate(&template, 2, TEST_AUTHOR_ID).await;

            assert!(matches!(
                result,
                Err(Error::LicenseError(LicenseError::InvalidAmount(2)))
            ));
            let reloaded = test.template().reload(template.id).await?.unwrap();
            assert_eq!(reloaded.generated_count, i32::MAX - 1);

            Ok(())
        }

        /// Expect a zero amount to be rejected
        #[tokio::test]
        async fn rejects_zero_amount() -> Result<(), TestError> {
            let mut test = TestBuilder::new().with_license_tables().build().await?;
            let template = test
                .template()
                .insert_template("Monthly", Some(5), 0)
                .await?;
            let events = EventDispatcher::new();
            let allocator = TemplateAllocator::new(&test.db, &events);

            let result = allocator.generate(&template, 0, TEST_AUTHOR_ID).await;

            assert!(matches!(
                result,
                Err(Error::LicenseError(LicenseError::InvalidAmount(0)))
            ));

            Ok(())
        }
    }
}
