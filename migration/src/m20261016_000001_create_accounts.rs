use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .decimal_len(30, 8)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::LastClaimTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // Set once at registration, never updated
                    .col(ColumnDef::new(Accounts::ReferredBy).uuid().null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_referred_by")
                            .from(Accounts::Table, Accounts::ReferredBy)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_referred_by")
                    .table(Accounts::Table)
                    .col(Accounts::ReferredBy)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Balance,
    LastClaimTime,
    ReferredBy,
    CreatedAt,
}
