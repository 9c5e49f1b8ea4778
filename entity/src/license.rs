use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "license")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub guild_id: i64,
    pub key: String,
    pub role_id: i64,
    pub author_id: i64,
    pub redeemer_id: Option<i64>,
    pub activated: bool,
    /// Absolute deadline in epoch milliseconds
    pub valid_until: i64,
    pub template_id: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::license_template::Entity",
        from = "Column::TemplateId",
        to = "super::license_template::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    LicenseTemplate,
}

impl Related<super::license_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LicenseTemplate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
