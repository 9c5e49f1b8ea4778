use sea_orm_migration::{prelude::*, schema::*};

static IDX_LICENSE_BAN_GUILD_ID_USER_ID: &str = "idx_license_ban_guild_id_user_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LicenseBan::Table)
                    .if_not_exists()
                    .col(pk_auto(LicenseBan::Id))
                    .col(big_integer(LicenseBan::GuildId))
                    .col(big_integer(LicenseBan::UserId))
                    .col(text_null(LicenseBan::Reason))
                    .col(big_integer_null(LicenseBan::ExpiresAt))
                    .col(timestamp(LicenseBan::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_LICENSE_BAN_GUILD_ID_USER_ID)
                    .table(LicenseBan::Table)
                    .col(LicenseBan::GuildId)
                    .col(LicenseBan::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_LICENSE_BAN_GUILD_ID_USER_ID)
                    .table(LicenseBan::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LicenseBan::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum LicenseBan {
    Table,
    Id,
    GuildId,
    UserId,
    Reason,
    ExpiresAt,
    CreatedAt,
}
