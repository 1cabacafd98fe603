use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommissionRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommissionRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommissionRecords::ReferrerId).uuid().not_null())
                    .col(
                        ColumnDef::new(CommissionRecords::ReferredUserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::SourceEventId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::Amount)
                            .decimal_len(30, 8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::Type)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .check(Expr::col(CommissionRecords::Amount).gte(0))
                    .to_owned(),
            )
            .await?;

        // One commission per triggering event and type
        manager
            .create_index(
                Index::create()
                    .name("uq_commission_records_event_type")
                    .table(CommissionRecords::Table)
                    .col(CommissionRecords::SourceEventId)
                    .col(CommissionRecords::Type)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commission_records_referrer")
                    .table(CommissionRecords::Table)
                    .col(CommissionRecords::ReferrerId)
                    .col((CommissionRecords::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommissionRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommissionRecords {
    Table,
    Id,
    ReferrerId,
    ReferredUserId,
    SourceEventId,
    Amount,
    Type,
    CreatedAt,
}
