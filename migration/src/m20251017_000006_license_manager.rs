use sea_orm_migration::{prelude::*, schema::*};

static IDX_LICENSE_MANAGER_GUILD_ID_ROLE_ID: &str = "idx_license_manager_guild_id_role_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LicenseManager::Table)
                    .if_not_exists()
                    .col(pk_auto(LicenseManager::Id))
                    .col(big_integer(LicenseManager::GuildId))
                    .col(big_integer(LicenseManager::RoleId))
                    .col(timestamp(LicenseManager::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_LICENSE_MANAGER_GUILD_ID_ROLE_ID)
                    .table(LicenseManager::Table)
                    .col(LicenseManager::GuildId)
                    .col(LicenseManager::RoleId)
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
                    .name(IDX_LICENSE_MANAGER_GUILD_ID_ROLE_ID)
                    .table(LicenseManager::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LicenseManager::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum LicenseManager {
    Table,
    Id,
    GuildId,
    RoleId,
    CreatedAt,
}
