use sea_orm::{DatabaseConnection, SqlErr};

use crate::server::{
    data::manager::ManagerRepository,
    error::{access::AccessError, Error},
    model::{access::GateDecision, db::LicenseManagerModel},
};

/// Roles allowed to manage licenses and templates in a guild.
///
/// Administrators may always manage. Until a guild configures at least one manager role,
/// nobody else may.
pub struct ManagerService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ManagerService<'a> {
    /// Creates a new instance of [`ManagerService`]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn add(&self, guild_id: i64, role_id: i64) -> Result<LicenseManagerModel, Error> {
        let manager_repo = ManagerRepository::new(self.db);

        if manager_repo.find(guild_id, role_id).await?.is_some() {
            return Err(AccessError::ManagerExists(role_id).into());
        }

        let manager = manager_repo
            .create(guild_id, role_id)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Error::from(AccessError::ManagerExists(role_id))
                }
                _ => e.into(),
            })?;

        tracing::info!(guild_id, role_id, "Allowed role to manage licenses");

        Ok(manager)
    }

    pub async fn remove(&self, guild_id: i64, role_id: i64) -> Result<(), Error> {
        let result = ManagerRepository::new(self.db)
            .delete(guild_id, role_id)
            .await?;

        if result.rows_affected == 0 {
            return Err(AccessError::ManagerNotFound(role_id).into());
        }

        tracing::info!(guild_id, role_id, "Revoked role from managing licenses");

        Ok(())
    }

    /// Manager roles of the guild, oldest first
    pub async fn list(&self, guild_id: i64) -> Result<Vec<LicenseManagerModel>, Error> {
        Ok(ManagerRepository::new(self.db)
            .list_by_guild(guild_id)
            .await?)
    }

    /// Whether a member may manage licenses and templates
    ///
    /// `member_role_ids` are the roles the member holds, as reported by the platform.
    pub async fn can_manage(
        &self,
        guild_id: i64,
        is_administrator: bool,
        member_role_ids: &[i64],
    ) -> Result<GateDecision, Error> {
        if is_administrator {
            return Ok(GateDecision::Allow);
        }

        let managers = self.list(guild_id).await?;

        if managers.is_empty() {
            return Ok(GateDecision::Deny {
                reason: "Only administrators can manage licenses until manager roles are configured."
                    .to_string(),
            });
        }

        let has_manager_role = managers
            .iter()
            .any(|manager| member_role_ids.contains(&manager.role_id));

        if has_manager_role {
            Ok(GateDecision::Allow)
        } else {
            Ok(GateDecision::Deny {
                reason: "You must be an administrator or have a manager role to manage licenses."
                    .to_string(),
            })
        }
    }
}
