use sea_orm_migration::{prelude::*, schema::*};

static IDX_LICENSE_TEMPLATE_GUILD_ID_NAME_KEY: &str = "idx_license_template_guild_id_name_key";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LicenseTemplate::Table)
                    .if_not_exists()
                    .col(pk_auto(LicenseTemplate::Id))
                    .col(big_integer(LicenseTemplate::GuildId))
                    .col(string_len(LicenseTemplate::Name, 64))
                    .col(string_len(LicenseTemplate::NameKey, 64))
                    .col(big_integer(LicenseTemplate::RoleId))
                    .col(big_integer(LicenseTemplate::DurationMs))
                    .col(integer_null(LicenseTemplate::Stock))
                    .col(integer(LicenseTemplate::GeneratedCount).default(0))
                    .col(big_integer(LicenseTemplate::CreatedBy))
                    .col(timestamp(LicenseTemplate::CreatedAt))
                    .col(timestamp(LicenseTemplate::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_LICENSE_TEMPLATE_GUILD_ID_NAME_KEY)
                    .table(LicenseTemplate::Table)
                    .col(LicenseTemplate::GuildId)
                    .col(LicenseTemplate::NameKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_LICENSE_TEMPLATE_GUILD_ID_NAME_KEY)
                    .table(LicenseTemplate::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LicenseTemplate::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum LicenseTemplate {
    Table,
    Id,
    GuildId,
    Name,
    NameKey,
    RoleId,
    DurationMs,
    Stock,
    GeneratedCount,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
