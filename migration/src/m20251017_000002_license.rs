use sea_orm_migration::{prelude::*, schema::*};

use crate::m20251017_000001_license_template::LicenseTemplate;

static IDX_LICENSE_GUILD_ID_KEY: &str = "idx_license_guild_id_key";
static IDX_LICENSE_VALID_UNTIL: &str = "idx_license_valid_until";
static FK_LICENSE_TEMPLATE_ID: &str = "fk_license_template_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(License::Table)
                    .if_not_exists()
                    .col(pk_auto(License::Id))
                    .col(big_integer(License::GuildId))
                    .col(string_len(License::Key, 32))
                    .col(big_integer(License::RoleId))
                    .col(big_integer(License::AuthorId))
                    .col(big_integer_null(License::RedeemerId))
                    .col(boolean(License::Activated).default(false))
                    .col(big_integer(License::ValidUntil))
                    .col(integer_null(License::TemplateId))
                    .col(timestamp(License::CreatedAt))
                    .col(timestamp(License::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_LICENSE_GUILD_ID_KEY)
                    .table(License::Table)
                    .col(License::GuildId)
                    .col(License::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_LICENSE_VALID_UNTIL)
                    .table(License::Table)
                    .col(License::ValidUntil)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name(FK_LICENSE_TEMPLATE_ID)
                    .from_tbl(License::Table)
                    .from_col(License::TemplateId)
                    .to_tbl(LicenseTemplate::Table)
                    .to_col(LicenseTemplate::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name(FK_LICENSE_TEMPLATE_ID)
                    .table(License::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(IDX_LICENSE_VALID_UNTIL)
                    .table(License::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(IDX_LICENSE_GUILD_ID_KEY)
                    .table(License::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(License::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum License {
    Table,
    Id,
    GuildId,
    Key,
    RoleId,
    AuthorId,
    RedeemerId,
    Activated,
    ValidUntil,
    TemplateId,
    CreatedAt,
    UpdatedAt,
}
