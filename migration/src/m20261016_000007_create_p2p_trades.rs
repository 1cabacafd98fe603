use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Owned by the external trade flow; this service only counts rows
        manager
            .create_table(
                Table::create()
                    .table(P2pTrades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(P2pTrades::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(P2pTrades::Status).string_len(32).not_null())
                    .col(
                        ColumnDef::new(P2pTrades::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(P2pTrades::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_p2p_trades_status_created")
                    .table(P2pTrades::Table)
                    .col(P2pTrades::Status)
                    .col(P2pTrades::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(P2pTrades::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum P2pTrades {
    Table,
    Id,
    Status,
    CreatedAt,
    CompletedAt,
}
