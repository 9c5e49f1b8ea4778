use entity::license_history::LicenseAction;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, SqlErr, TransactionTrait};

use crate::server::{
    data::{history::HistoryRepository, license::LicenseRepository},
    discord::{best_effort, GuildGateway},
    error::{
        external::{ExternalError, ExternalResource},
        license::LicenseError,
        Error,
    },
    event::EventDispatcher,
    model::{
        db::{LicenseHistoryModel, LicenseModel},
        event::{LicenseCreated, LicenseRedeemed, LicenseStopped},
        export::{ExportFormat, LicenseExport, LicenseExportRow},
        license::{
            HistoryQuery, LicenseEdit, LicenseFilter, LicenseState, NewHistoryEntry, NewLicense,
            RedeemOutcome, RoleSyncReport, StopOutcome,
        },
    },
    service::quota::QuotaService,
    util::{
        key::generate_keys,
        time::{expiry_label, format_duration, from_millis, now_ms, to_millis},
    },
};

/// Maps a unique constraint violation on a batch insert to [`LicenseError::DuplicateKey`]
fn map_duplicate_key(err: DbErr, keys: &[String]) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            LicenseError::DuplicateKey(keys.join(", ")).into()
        }
        _ => err.into(),
    }
}

/// Inserts pending licenses and their CREATE history entries through `db`
///
/// Meant to run inside the caller's transaction, so a failed batch leaves nothing behind.
pub(crate) async fn insert_batch<C: ConnectionTrait>(
    db: &C,
    licenses: Vec<NewLicense>,
    history: Vec<NewHistoryEntry>,
) -> Result<Vec<LicenseModel>, Error> {
    let keys: Vec<String> = licenses.iter().map(|l| l.key.clone()).collect();

    let created = LicenseRepository::new(db)
        .create_many(licenses)
        .await
        .map_err(|e| map_duplicate_key(e, &keys))?;
    HistoryRepository::new(db).append_many(history).await?;

    Ok(created)
}

fn not_found(guild_id: i64, key: &str) -> Error {
    LicenseError::NotFound {
        guild_id,
        key: key.to_string(),
    }
    .into()
}

/// License lifecycle: `Pending -> Active -> deleted`.
///
/// Every transition is a single guarded statement, so concurrent callers and the expiration
/// reconciler can never move a license backwards or apply a transition twice.
pub struct LicenseService<'a> {
    db: &'a DatabaseConnection,
    gateway: &'a dyn GuildGateway,
    events: &'a EventDispatcher,
}

impl<'a> LicenseService<'a> {
    /// Creates a new instance of [`LicenseService`]
    pub fn new(
        db: &'a DatabaseConnection,
        gateway: &'a dyn GuildGateway,
        events: &'a EventDispatcher,
    ) -> Self {
        Self { db, gateway, events }
    }

    /// Creates a single pending license valid for `duration_ms` from now
    pub async fn create(
        &self,
        guild_id: i64,
        role_id: i64,
        duration_ms: i64,
        author_id: i64,
    ) -> Result<LicenseModel, Error> {
        self.create_many(guild_id, role_id, duration_ms, author_id, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InternalError("license batch of one came back empty".to_string()))
    }

    /// Creates `amount` pending licenses in one transaction
    ///
    /// Both quota ceilings are checked first. The guild ceiling is not guarded by a conditional
    /// write, unlike template stock.
    pub async fn create_many(
        &self,
        guild_id: i64,
        role_id: i64,
        duration_ms: i64,
        author_id: i64,
        amount: u64,
    ) -> Result<Vec<LicenseModel>, Error> {
        if duration_ms <= 0 {
            return Err(LicenseError::InvalidDuration(duration_ms).into());
        }
        if amount == 0 {
            return Err(LicenseError::InvalidAmount(amount).into());
        }

        let now = now_ms();
        QuotaService::new(self.db)
            .check(guild_id, amount, now)
            .await?;

        let valid_until = now
            .checked_add(duration_ms)
            .ok_or(LicenseError::InvalidDuration(duration_ms))?;
        let created_at = from_millis(now)
            .ok_or_else(|| Error::InternalError(format!("current time {} out of range", now)))?;

        let keys = generate_keys(amount as usize);
        let history = keys
            .iter()
            .map(|key| NewHistoryEntry {
                guild_id,
                license_key: key.clone(),
                action: LicenseAction::Create,
                actor_id: Some(author_id),
                target_id: Some(role_id),
                details: Some(format!(
                    "Role: <@&{}> | Created by <@{}>",
                    role_id, author_id
                )),
            })
            .collect();
        let new_licenses = keys
            .into_iter()
            .map(|key| NewLicense {
                guild_id,
                key,
                role_id,
                author_id,
                valid_until,
                template_id: None,
                created_at,
            })
            .collect();

        let txn = self.db.begin().await?;
        let licenses = insert_batch(&txn, new_licenses, history).await?;
        txn.commit().await?;

        tracing::info!(guild_id, role_id, count = licenses.len(), "Created licenses");

        self.events
            .license_created(LicenseCreated {
                guild_id,
                licenses: licenses.clone(),
                duration_label: format_duration(duration_ms),
            })
            .await;

        Ok(licenses)
    }

    /// Changes role and/or duration of a pending license
    ///
    /// A new duration replaces the old one, measured from the license's creation time.
    pub async fn edit(
        &self,
        guild_id: i64,
        key: &str,
        edit: LicenseEdit,
    ) -> Result<LicenseModel, Error> {
        if edit.role_id.is_none() && edit.duration_ms.is_none() {
            return Err(LicenseError::NothingToUpdate(key.to_string()).into());
        }
        if let Some(duration_ms) = edit.duration_ms {
            if duration_ms <= 0 {
                return Err(LicenseError::InvalidDuration(duration_ms).into());
            }
        }

        let license_repo = LicenseRepository::new(self.db);
        let license = self.find_in_state(guild_id, key, LicenseState::Pending, "edited").await?;

        let valid_until = match edit.duration_ms {
            Some(duration_ms) => Some(
                to_millis(license.created_at)
                    .checked_add(duration_ms)
                    .ok_or(LicenseError::InvalidDuration(duration_ms))?,
            ),
            None => None,
        };

        match license_repo
            .update_pending(guild_id, key, edit.role_id, valid_until)
            .await?
        {
            Some(license) => {
                tracing::info!(guild_id, key, "Edited pending license");
                Ok(license)
            }
            // Redeemed or deleted since it was read
            None => Err(self.transition_lost(guild_id, key, "edited").await),
        }
    }

    /// Redeems a pending license for `redeemer_id` and grants its role
    ///
    /// The role grant happens after the redemption is committed and never rolls it back; its
    /// failure is returned in [`RedeemOutcome::role_error`].
    pub async fn redeem(
        &self,
        guild_id: i64,
        key: &str,
        redeemer_id: i64,
    ) -> Result<RedeemOutcome, Error> {
        let txn = self.db.begin().await?;
        let license_repo = LicenseRepository::new(&txn);

        let license = license_repo
            .find(guild_id, key)
            .await?
            .ok_or_else(|| not_found(guild_id, key))?;

        if license.activated || license.redeemer_id.is_some() {
            return Err(LicenseError::AlreadyRedeemed(key.to_string()).into());
        }

        if !license_repo.redeem(guild_id, key, redeemer_id).await? {
            return Err(LicenseError::AlreadyRedeemed(key.to_string()).into());
        }

        let history = HistoryRepository::new(&txn)
            .append(NewHistoryEntry {
                guild_id,
                license_key: key.to_string(),
                action: LicenseAction::Redeem,
                actor_id: Some(redeemer_id),
                target_id: Some(license.author_id),
                details: Some(format!(
                    "Redeemed by <@{}> | Created by <@{}>",
                    redeemer_id, license.author_id
                )),
            })
            .await?;

        let license = license_repo
            .find(guild_id, key)
            .await?
            .ok_or_else(|| Error::InternalError(format!("redeemed license `{}` vanished", key)))?;

        txn.commit().await?;

        tracing::info!(guild_id, key, redeemer_id, "Redeemed license");

        let role_error = match self
            .gateway
            .add_role(guild_id, redeemer_id, license.role_id, "License redeemed.")
            .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    guild_id,
                    key,
                    redeemer_id,
                    role_id = license.role_id,
                    error = %e,
                    "Failed to grant role for redeemed license"
                );
                Some(e)
            }
        };

        self.events
            .license_redeemed(LicenseRedeemed {
                guild_id,
                license: license.clone(),
                redeemer_id,
                expiry_label: expiry_label(license.valid_until),
            })
            .await;

        Ok(RedeemOutcome {
            license,
            history,
            role_error,
        })
    }

    /// Pushes the deadline of an active license back by `add_ms`
    pub async fn extend(
        &self,
        guild_id: i64,
        key: &str,
        add_ms: i64,
    ) -> Result<LicenseModel, Error> {
        if add_ms <= 0 {
            return Err(LicenseError::InvalidDuration(add_ms).into());
        }

        let license_repo = LicenseRepository::new(self.db);
        let license = self.find_in_state(guild_id, key, LicenseState::Active, "extended").await?;

        if license.valid_until.checked_add(add_ms).is_none() {
            return Err(LicenseError::InvalidDuration(add_ms).into());
        }

        if !license_repo.extend(guild_id, key, add_ms).await? {
            return Err(self.transition_lost(guild_id, key, "extended").await);
        }

        tracing::info!(guild_id, key, add_ms, "Extended license");

        license_repo
            .find(guild_id, key)
            .await?
            .ok_or_else(|| not_found(guild_id, key))
    }

    /// Stops an active license, removing the role from its redeemer
    ///
    /// When the guild or the redeemer can no longer be resolved the license is deleted without
    /// any other side effect.
    pub async fn stop(
        &self,
        guild_id: i64,
        key: &str,
        actor_id: i64,
        locale: &str,
    ) -> Result<StopOutcome, Error> {
        let license_repo = LicenseRepository::new(self.db);
        let license = self.find_in_state(guild_id, key, LicenseState::Active, "stopped").await?;

        let member = match license.redeemer_id {
            Some(redeemer_id) => match self.gateway.fetch_guild(guild_id).await? {
                Some(_) => self.gateway.fetch_member(guild_id, redeemer_id).await?,
                None => None,
            },
            None => None,
        };

        let Some(member) = member else {
            license_repo.delete(guild_id, key).await?;
            tracing::info!(guild_id, key, "Deleted orphaned license on stop");

            return Ok(StopOutcome::Orphaned { license });
        };

        let role_removed = best_effort::revoke_role(
            self.gateway,
            guild_id,
            member.user_id,
            license.role_id,
            "License stopped.",
        )
        .await;

        // The reconciler may have deleted it meanwhile, the license is gone either way
        let result = license_repo.delete(guild_id, key).await?;
        if result.rows_affected == 0 {
            tracing::debug!(guild_id, key, "License was already deleted while stopping");
        }

        tracing::info!(guild_id, key, actor_id, role_removed, "Stopped license");

        self.events
            .license_stopped(LicenseStopped {
                guild_id,
                license: license.clone(),
                redeemer_id: member.user_id,
                actor_id,
                locale: locale.to_string(),
            })
            .await;

        Ok(StopOutcome::Stopped {
            license,
            role_removed,
        })
    }

    /// Deletes a pending license
    ///
    /// Losing a race against another delete is not an error.
    pub async fn delete(&self, guild_id: i64, key: &str) -> Result<LicenseModel, Error> {
        let license = self.find_in_state(guild_id, key, LicenseState::Pending, "deleted").await?;

        let result = LicenseRepository::new(self.db)
            .delete_pending(guild_id, key)
            .await?;

        if result.rows_affected == 0 {
            // Redeemed in the meantime is still a state error, deleted in the meantime is not
            if let Some(current) = LicenseRepository::new(self.db).find(guild_id, key).await? {
                return Err(LicenseError::InvalidState {
                    key: key.to_string(),
                    operation: "deleted",
                    state: LicenseState::of(&current),
                }
                .into());
            }
        }

        tracing::info!(guild_id, key, "Deleted pending license");

        Ok(license)
    }

    /// Deletes every pending license of the guild, returning how many were removed
    pub async fn delete_all_pending(&self, guild_id: i64) -> Result<u64, Error> {
        let result = LicenseRepository::new(self.db)
            .delete_all_pending(guild_id)
            .await?;

        tracing::info!(guild_id, count = result.rows_affected, "Deleted all pending licenses");

        Ok(result.rows_affected)
    }

    pub async fn info(&self, guild_id: i64, key: &str) -> Result<LicenseModel, Error> {
        LicenseRepository::new(self.db)
            .find(guild_id, key)
            .await?
            .ok_or_else(|| not_found(guild_id, key))
    }

    pub async fn list(
        &self,
        guild_id: i64,
        filter: LicenseFilter,
    ) -> Result<Vec<LicenseModel>, Error> {
        Ok(LicenseRepository::new(self.db)
            .list_by_guild(guild_id, filter)
            .await?)
    }

    /// Encodes every license of the guild as a downloadable file
    ///
    /// Fails with [`LicenseError::NothingToExport`] when the guild holds no licenses.
    pub async fn export(&self, guild_id: i64, format: ExportFormat) -> Result<LicenseExport, Error> {
        let licenses = self.list(guild_id, LicenseFilter::All).await?;
        if licenses.is_empty() {
            return Err(LicenseError::NothingToExport.into());
        }

        let rows: Vec<LicenseExportRow> = licenses.iter().map(LicenseExportRow::from).collect();
        let content = format.encode(&rows)?;

        tracing::info!(guild_id, count = rows.len(), ?format, "Exported licenses");

        Ok(LicenseExport {
            format,
            file_name: format!("licenses.{}", format.extension()),
            count: rows.len(),
            content,
        })
    }

    pub async fn history(
        &self,
        guild_id: i64,
        query: HistoryQuery,
    ) -> Result<Vec<LicenseHistoryModel>, Error> {
        Ok(HistoryRepository::new(self.db).query(guild_id, query).await?)
    }

    /// Grants the license role again to every redeemer of an active license who lost it
    pub async fn sync_roles(&self, guild_id: i64) -> Result<RoleSyncReport, Error> {
        let licenses = LicenseRepository::new(self.db)
            .list_by_guild(guild_id, LicenseFilter::Active)
            .await?;

        let mut report = RoleSyncReport::default();

        for license in licenses {
            let key = license.key.clone();

            let Some(redeemer_id) = license.redeemer_id else {
                report.no_redeemer.push(key);
                continue;
            };

            let member = match self.gateway.fetch_member(guild_id, redeemer_id).await {
                Ok(Some(member)) => member,
                Ok(None) => {
                    report.member_missing.push(key);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(guild_id, key = %key, error = %e, "Failed to fetch member for role sync");
                    report.failed.push(key);
                    continue;
                }
            };

            if member.has_role(license.role_id) {
                report.already_synced.push(key);
                continue;
            }

            match self
                .gateway
                .add_role(guild_id, redeemer_id, license.role_id, "License role sync")
                .await
            {
                Ok(()) => report.restored.push(key),
                Err(ExternalError::ResourceMissing(ExternalResource::Member)) => {
                    report.member_missing.push(key)
                }
                Err(ExternalError::ResourceMissing(_)) => report.role_missing.push(key),
                Err(ExternalError::PermissionDenied { .. }) => report.permission_denied.push(key),
                Err(e) => {
                    tracing::warn!(guild_id, key = %key, error = %e, "Failed to sync license role");
                    report.failed.push(key);
                }
            }
        }

        tracing::info!(
            guild_id,
            restored = report.restored.len(),
            failed = report.failed.len(),
            "Synced license roles"
        );

        Ok(report)
    }

    /// Finds a license and checks it is in `expected` state
    async fn find_in_state(
        &self,
        guild_id: i64,
        key: &str,
        expected: LicenseState,
        operation: &'static str,
    ) -> Result<LicenseModel, Error> {
        let license = LicenseRepository::new(self.db)
            .find(guild_id, key)
            .await?
            .ok_or_else(|| not_found(guild_id, key))?;

        let state = LicenseState::of(&license);
        if state != expected {
            return Err(LicenseError::InvalidState {
                key: key.to_string(),
                operation,
                state,
            }
            .into());
        }

        Ok(license)
    }

    /// Error for a guarded update that matched no row after the state check passed
    async fn transition_lost(&self, guild_id: i64, key: &str, operation: &'static str) -> Error {
        match LicenseRepository::new(self.db).find(guild_id, key).await {
            Ok(Some(license)) => LicenseError::InvalidState {
                key: key.to_string(),
                operation,
                state: LicenseState::of(&license),
            }
            .into(),
            Ok(None) => not_found(guild_id, key),
            Err(e) => e.into(),
        }
    }
}
