use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PriceSamples::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceSamples::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PriceSamples::Price)
                            .decimal_len(20, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PriceSamples::ChangePercent)
                            .decimal_len(20, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PriceSamples::Strategy)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PriceSamples::ObservedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Latest-sample reads order by observed_at DESC
        manager
            .create_index(
                Index::create()
                    .name("idx_price_samples_observed_at")
                    .table(PriceSamples::Table)
                    .col((PriceSamples::ObservedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriceSamples::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PriceSamples {
    Table,
    Id,
    Price,
    ChangePercent,
    Strategy,
    ObservedAt,
}
