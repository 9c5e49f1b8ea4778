use sea_orm::{DatabaseConnection, DbErr, SqlErr, TransactionTrait};

use crate::server::{
    config::limits::MAX_TEMPLATE_NAME_LENGTH,
    data::{
        license::LicenseRepository,
        template::{NewTemplate, TemplateRepository, TemplateUpdate},
    },
    error::{template::TemplateError, Error},
    event::EventDispatcher,
    model::db::{LicenseModel, LicenseTemplateModel},
    service::allocator::TemplateAllocator,
};

/// Requested change to a template's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockChange {
    #[default]
    Keep,
    /// Cap total generation at this many licenses
    Limited(i32),
    Unlimited,
}

/// Changes applied to a template by [`TemplateService::edit`].
#[derive(Debug, Clone, Default)]
pub struct TemplateEdit {
    pub name: Option<String>,
    pub role_id: Option<i64>,
    pub duration_ms: Option<i64>,
    pub stock: StockChange,
}

/// Trims a template name and checks its length
fn normalize_name(name: &str) -> Result<String, TemplateError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(TemplateError::NameEmpty);
    }
    if name.chars().count() > MAX_TEMPLATE_NAME_LENGTH {
        return Err(TemplateError::NameTooLong);
    }

    Ok(name.to_string())
}

/// Maps a unique constraint violation on the guild's name key to [`TemplateError::NameTaken`]
fn map_name_taken(err: DbErr, name: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => TemplateError::NameTaken(name.to_string()).into(),
        _ => err.into(),
    }
}

pub struct TemplateService<'a> {
    db: &'a DatabaseConnection,
    events: &'a EventDispatcher,
}

impl<'a> TemplateService<'a> {
    /// Creates a new instance of [`TemplateService`]
    pub fn new(db: &'a DatabaseConnection, events: &'a EventDispatcher) -> Self {
        Self { db, events }
    }

    /// Creates a template, names are unique per guild ignoring case
    pub async fn create(
        &self,
        guild_id: i64,
        name: &str,
        role_id: i64,
        duration_ms: i64,
        stock: Option<i32>,
        created_by: i64,
    ) -> Result<LicenseTemplateModel, Error> {
        let name = normalize_name(name)?;

        if duration_ms <= 0 {
            return Err(TemplateError::InvalidDuration(duration_ms).into());
        }
        if let Some(stock) = stock {
            if stock <= 0 {
                return Err(TemplateError::InvalidStock(stock).into());
            }
        }

        let template_repo = TemplateRepository::new(self.db);

        if template_repo.find_by_name(guild_id, &name).await?.is_some() {
            return Err(TemplateError::NameTaken(name).into());
        }

        // A concurrent create can still win between the lookup and the insert
        let template = template_repo
            .create(NewTemplate {
                guild_id,
                name: name.clone(),
                role_id,
                duration_ms,
                stock,
                created_by,
            })
            .await
            .map_err(|e| map_name_taken(e, &name))?;

        tracing::info!(guild_id, template_id = template.id, "Created license template");

        Ok(template)
    }

    /// Edits a template found by name
    ///
    /// A limited stock below the number of licenses already generated is rejected.
    pub async fn edit(
        &self,
        guild_id: i64,
        name: &str,
        edit: TemplateEdit,
    ) -> Result<LicenseTemplateModel, Error> {
        let template = self.get(guild_id, name).await?;
        let template_repo = TemplateRepository::new(self.db);

        if edit.name.is_none()
            && edit.role_id.is_none()
            && edit.duration_ms.is_none()
            && edit.stock == StockChange::Keep
        {
            return Err(TemplateError::NothingToUpdate(template.name).into());
        }

        let new_name = match edit.name {
            Some(new_name) => {
                let new_name = normalize_name(&new_name)?;
                if let Some(existing) = template_repo.find_by_name(guild_id, &new_name).await? {
                    if existing.id != template.id {
                        return Err(TemplateError::NameTaken(new_name).into());
                    }
                }
                Some(new_name)
            }
            None => None,
        };

        if let Some(duration_ms) = edit.duration_ms {
            if duration_ms <= 0 {
                return Err(TemplateError::InvalidDuration(duration_ms).into());
            }
        }

        let stock = match edit.stock {
            StockChange::Keep => None,
            StockChange::Unlimited => Some(None),
            StockChange::Limited(stock) => {
                if stock <= 0 {
                    return Err(TemplateError::InvalidStock(stock).into());
                }
                if stock < template.generated_count {
                    return Err(TemplateError::StockBelowGenerated {
                        stock,
                        generated: template.generated_count,
                    }
                    .into());
                }
                Some(Some(stock))
            }
        };

        let taken_name = new_name.clone().unwrap_or_default();
        let updated = template_repo
            .update(
                template.id,
                TemplateUpdate {
                    name: new_name,
                    role_id: edit.role_id,
                    duration_ms: edit.duration_ms,
                    stock,
                },
            )
            .await
            .map_err(|e| map_name_taken(e, &taken_name))?;

        match updated {
            Some(updated) => {
                tracing::info!(guild_id, template_id = template.id, "Edited license template");
                Ok(updated)
            }
            // Licenses were generated past the new stock since the template was read
            None => match (edit.stock, template_repo.find_by_id(template.id).await?) {
                (StockChange::Limited(stock), Some(current)) => {
                    Err(TemplateError::StockBelowGenerated {
                        stock,
                        generated: current.generated_count,
                    }
                    .into())
                }
                _ => Err(TemplateError::NotFound(template.name).into()),
            },
        }
    }

    /// Raises the stock of a limited template by `amount`
    pub async fn add_stock(
        &self,
        guild_id: i64,
        name: &str,
        amount: i32,
    ) -> Result<LicenseTemplateModel, Error> {
        if amount <= 0 {
            return Err(TemplateError::InvalidAmount(amount).into());
        }

        let template = self.get(guild_id, name).await?;
        if template.stock.is_none() {
            return Err(TemplateError::UnlimitedStock(template.name).into());
        }

        let template_repo = TemplateRepository::new(self.db);
        if !template_repo.add_stock(template.id, amount).await? {
            return Err(TemplateError::UnlimitedStock(template.name).into());
        }

        tracing::info!(guild_id, template_id = template.id, amount, "Added template stock");

        template_repo
            .find_by_id(template.id)
            .await?
            .ok_or_else(|| TemplateError::NotFound(template.name).into())
    }

    /// Deletes a template, licenses generated from it are kept
    pub async fn delete(&self, guild_id: i64, name: &str) -> Result<LicenseTemplateModel, Error> {
        let template = self.get(guild_id, name).await?;

        let txn = self.db.begin().await?;
        LicenseRepository::new(&txn)
            .clear_template(template.id)
            .await?;
        TemplateRepository::new(&txn).delete(template.id).await?;
        txn.commit().await?;

        tracing::info!(guild_id, template_id = template.id, "Deleted license template");

        Ok(template)
    }

    pub async fn list(&self, guild_id: i64) -> Result<Vec<LicenseTemplateModel>, Error> {
        Ok(TemplateRepository::new(self.db)
            .list_by_guild(guild_id)
            .await?)
    }

    pub async fn get(&self, guild_id: i64, name: &str) -> Result<LicenseTemplateModel, Error> {
        TemplateRepository::new(self.db)
            .find_by_name(guild_id, name)
            .await?
            .ok_or_else(|| TemplateError::NotFound(name.trim().to_string()).into())
    }

    /// Resolves a template by name and generates `amount` licenses from it
    pub async fn generate(
        &self,
        guild_id: i64,
        name: &str,
        amount: u64,
        actor_id: i64,
    ) -> Result<Vec<LicenseModel>, Error> {
        let template = self.get(guild_id, name).await?;

        TemplateAllocator::new(self.db, self.events)
            .generate(&template, amount, actor_id)
            .await
    }
}
