use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 linked_identities 表 - 第三方外部身份
        manager
            .create_table(
                Table::create()
                    .table(LinkedIdentities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkedIdentities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LinkedIdentities::ProviderType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkedIdentities::ExternalId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkedIdentities::DisplayName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LinkedIdentities::AvatarUrl).string_len(350))
                    .col(ColumnDef::new(LinkedIdentities::AccessToken).text())
                    .col(ColumnDef::new(LinkedIdentities::RawProfile).text())
                    .col(ColumnDef::new(LinkedIdentities::Email).string_len(254))
                    .col(ColumnDef::new(LinkedIdentities::LinkedAccountId).integer())
                    .col(
                        ColumnDef::new(LinkedIdentities::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LinkedIdentities::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_linked_identities_account_id")
                            .from(LinkedIdentities::Table, LinkedIdentities::LinkedAccountId)
                            .to(LocalAccounts::Table, LocalAccounts::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一外部身份至多一条记录
        manager
            .create_index(
                Index::create()
                    .name("idx_linked_identities_provider_external")
                    .table(LinkedIdentities::Table)
                    .col(LinkedIdentities::ProviderType)
                    .col(LinkedIdentities::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_linked_identities_account_id")
                    .table(LinkedIdentities::Table)
                    .col(LinkedIdentities::LinkedAccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LinkedIdentities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LinkedIdentities {
    #[sea_orm(iden = "linked_identities")]
    Table,
    Id,
    ProviderType,
    ExternalId,
    DisplayName,
    AvatarUrl,
    AccessToken,
    RawProfile,
    Email,
    LinkedAccountId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LocalAccounts {
    #[sea_orm(iden = "local_accounts")]
    Table,
    Id,
}
