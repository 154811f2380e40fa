use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 local_accounts 表 - 站点自有账户
        manager
            .create_table(
                Table::create()
                    .table(LocalAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LocalAccounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LocalAccounts::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(LocalAccounts::Email).string_len(254))
                    .col(
                        ColumnDef::new(LocalAccounts::Source)
                            .string_len(20)
                            .not_null()
                            .default("register"),
                    )
                    .col(
                        ColumnDef::new(LocalAccounts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LocalAccounts::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 非空邮箱全表唯一；NULL 不参与唯一约束
        manager
            .create_index(
                Index::create()
                    .name("idx_local_accounts_email")
                    .table(LocalAccounts::Table)
                    .col(LocalAccounts::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LocalAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LocalAccounts {
    #[sea_orm(iden = "local_accounts")]
    Table,
    Id,
    Username,
    Email,
    Source,
    CreatedAt,
    UpdatedAt,
}
