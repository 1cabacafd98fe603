use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailyPriceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyPriceRecords::Date)
                            .date()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DailyPriceRecords::OpeningPrice)
                            .decimal_len(20, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyPriceRecords::ClosingPrice)
                            .decimal_len(20, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyPriceRecords::DailyChangePercent)
                            .decimal_len(20, 6)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DailyPriceRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyPriceRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DailyPriceRecords {
    Table,
    Date,
    OpeningPrice,
    ClosingPrice,
    DailyChangePercent,
    UpdatedAt,
}
