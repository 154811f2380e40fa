use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 oauth_configs 表 - 服务商接入配置
        manager
            .create_table(
                Table::create()
                    .table(OauthConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OauthConfigs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OauthConfigs::ProviderType)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(OauthConfigs::ClientId)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OauthConfigs::ClientSecret)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OauthConfigs::CallbackUrl)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OauthConfigs::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(OauthConfigs::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OauthConfigs::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_oauth_configs_enabled")
                    .table(OauthConfigs::Table)
                    .col(OauthConfigs::Enabled)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OauthConfigs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OauthConfigs {
    #[sea_orm(iden = "oauth_configs")]
    Table,
    Id,
    ProviderType,
    ClientId,
    ClientSecret,
    CallbackUrl,
    Enabled,
    CreatedAt,
    UpdatedAt,
}
