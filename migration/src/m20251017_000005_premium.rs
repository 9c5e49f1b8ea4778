use sea_orm_migration::{prelude::*, schema::*};

static IDX_PREMIUM_GUILD_ID_USER_ID: &str = "idx_premium_guild_id_user_id";
static IDX_PREMIUM_VALID_UNTIL: &str = "idx_premium_valid_until";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Premium::Table)
                    .if_not_exists()
                    .col(pk_auto(Premium::Id))
                    .col(big_integer(Premium::UserId))
                    .col(big_integer(Premium::GuildId))
                    .col(big_integer(Premium::ValidUntil))
                    .col(timestamp(Premium::CreatedAt))
                    .col(timestamp(Premium::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_PREMIUM_GUILD_ID_USER_ID)
                    .table(Premium::Table)
                    .col(Premium::GuildId)
                    .col(Premium::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_PREMIUM_VALID_UNTIL)
                    .table(Premium::Table)
                    .col(Premium::ValidUntil)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_PREMIUM_VALID_UNTIL)
                    .table(Premium::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(IDX_PREMIUM_GUILD_ID_USER_ID)
                    .table(Premium::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Premium::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Premium {
    Table,
    Id,
    UserId,
    GuildId,
    ValidUntil,
    CreatedAt,
    UpdatedAt,
}
