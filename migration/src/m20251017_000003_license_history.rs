use sea_orm_migration::{prelude::*, schema::*};

static IDX_LICENSE_HISTORY_GUILD_ID_CREATED_AT: &str = "idx_license_history_guild_id_created_at";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LicenseHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(LicenseHistory::Id))
                    .col(big_integer(LicenseHistory::GuildId))
                    .col(string_len(LicenseHistory::LicenseKey, 32))
                    .col(string_len(LicenseHistory::Action, 16))
                    .col(big_integer_null(LicenseHistory::ActorId))
                    .col(big_integer_null(LicenseHistory::TargetId))
                    .col(text_null(LicenseHistory::Details))
                    .col(timestamp(LicenseHistory::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_LICENSE_HISTORY_GUILD_ID_CREATED_AT)
                    .table(LicenseHistory::Table)
                    .col(LicenseHistory::GuildId)
                    .col(LicenseHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_LICENSE_HISTORY_GUILD_ID_CREATED_AT)
                    .table(LicenseHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LicenseHistory::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum LicenseHistory {
    Table,
    Id,
    GuildId,
    LicenseKey,
    Action,
    ActorId,
    TargetId,
    Details,
    CreatedAt,
}
