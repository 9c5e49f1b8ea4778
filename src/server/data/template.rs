use chrono::Utc;
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, DeleteResult,
    EntityTrait, ExprTrait, QueryFilter, QueryOrder,
};

use crate::server::model::db::LicenseTemplateModel;

use entity::license_template::Column;

/// Key a template name is unique and looked up by within its guild
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Fields for a template about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub guild_id: i64,
    pub name: String,
    pub role_id: i64,
    pub duration_ms: i64,
    pub stock: Option<i32>,
    pub created_by: i64,
}

/// Column changes for a template. `stock` of `Some(None)` makes the stock unlimited.
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub role_id: Option<i64>,
    pub duration_ms: Option<i64>,
    pub stock: Option<Option<i32>>,
}

pub struct TemplateRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TemplateRepository<'a, C> {
    /// Creates a new instance of [`TemplateRepository`]
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts a template with a generated count of zero
    pub async fn create(&self, template: NewTemplate) -> Result<LicenseTemplateModel, DbErr> {
        let now = Utc::now().naive_utc();

        let template = entity::license_template::ActiveModel {
            guild_id: ActiveValue::Set(template.guild_id),
            name_key: ActiveValue::Set(name_key(&template.name)),
            name: ActiveValue::Set(template.name),
            role_id: ActiveValue::Set(template.role_id),
            duration_ms: ActiveValue::Set(template.duration_ms),
            stock: ActiveValue::Set(template.stock),
            generated_count: ActiveValue::Set(0),
            created_by: ActiveValue::Set(template.created_by),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };

        template.insert(self.db).await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<LicenseTemplateModel>, DbErr> {
        entity::prelude::LicenseTemplate::find_by_id(id)
            .one(self.db)
            .await
    }

    /// Finds a template by name, ignoring case and surrounding whitespace
    pub async fn find_by_name(
        &self,
        guild_id: i64,
        name: &str,
    ) -> Result<Option<LicenseTemplateModel>, DbErr> {
        entity::prelude::LicenseTemplate::find()
            .filter(Column::GuildId.eq(guild_id))
            .filter(Column::NameKey.eq(name_key(name)))
            .one(self.db)
            .await
    }

    pub async fn list_by_guild(&self, guild_id: i64) -> Result<Vec<LicenseTemplateModel>, DbErr> {
        entity::prelude::LicenseTemplate::find()
            .filter(Column::GuildId.eq(guild_id))
            .order_by_asc(Column::Name)
            .all(self.db)
            .await
    }

    /// Compare-and-swap advance of a template's generated count
    ///
    /// Sets `generated_count` to `next_generated_count` only if the row still holds exactly
    /// `expected_generated_count` and `expected_stock`. Returns whether the write applied;
    /// `false` means another writer changed the template since the snapshot was read.
    pub async fn conditional_increment(
        &self,
        template_id: i32,
        expected_generated_count: i32,
        expected_stock: Option<i32>,
        next_generated_count: i32,
    ) -> Result<bool, DbErr> {
        let stock_matches = match expected_stock {
            Some(stock) => Column::Stock.eq(stock),
            None => Column::Stock.is_null(),
        };

        let result = entity::prelude::LicenseTemplate::update_many()
            .col_expr(
                Column::GeneratedCount,
                Expr::value(next_generated_count),
            )
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(Column::Id.eq(template_id))
            .filter(Column::GeneratedCount.eq(expected_generated_count))
            .filter(stock_matches)
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Applies column changes to a template
    ///
    /// A limited `stock` is only written while `generated_count` does not exceed it; returns
    /// `Ok(None)` when the template is missing or that guard rejected the change.
    pub async fn update(
        &self,
        template_id: i32,
        changes: TemplateUpdate,
    ) -> Result<Option<LicenseTemplateModel>, DbErr> {
        let mut update = entity::prelude::LicenseTemplate::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(Column::Id.eq(template_id));

        if let Some(name) = changes.name {
            update = update
                .col_expr(Column::NameKey, Expr::value(name_key(&name)))
                .col_expr(Column::Name, Expr::value(name));
        }
        if let Some(role_id) = changes.role_id {
            update = update.col_expr(Column::RoleId, Expr::value(role_id));
        }
        if let Some(duration_ms) = changes.duration_ms {
            update = update.col_expr(Column::DurationMs, Expr::value(duration_ms));
        }
        match changes.stock {
            Some(Some(stock)) => {
                update = update
                    .col_expr(Column::Stock, Expr::value(Some(stock)))
                    .filter(Column::GeneratedCount.lte(stock));
            }
            Some(None) => {
                update = update.col_expr(Column::Stock, Expr::value(Option::<i32>::None));
            }
            None => {}
        }

        let result = update.exec(self.db).await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.find_by_id(template_id).await
    }

    /// Adds `amount` to a limited template's stock
    ///
    /// Returns `false` when the template is missing or has unlimited stock.
    pub async fn add_stock(&self, template_id: i32, amount: i32) -> Result<bool, DbErr> {
        let result = entity::prelude::LicenseTemplate::update_many()
            .col_expr(Column::Stock, Expr::col(Column::Stock).add(amount))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(Column::Id.eq(template_id))
            .filter(Column::Stock.is_not_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Deletes a template, licenses generated from it keep existing without a template
    pub async fn delete(&self, template_id: i32) -> Result<DeleteResult, DbErr> {
        entity::prelude::LicenseTemplate::delete_by_id(template_id)
            .exec(self.db)
            .await
    }
}
