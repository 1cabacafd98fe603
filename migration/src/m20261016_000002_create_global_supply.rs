use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Singleton row (id = 1), seeded by the service on startup
        manager
            .create_table(
                Table::create()
                    .table(GlobalSupply::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GlobalSupply::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GlobalSupply::TotalClaimed)
                            .decimal_len(30, 8)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GlobalSupply::MaxSupply)
                            .decimal_len(30, 8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GlobalSupply::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .check(Expr::col(GlobalSupply::TotalClaimed).gte(0))
                    .check(Expr::col(GlobalSupply::TotalClaimed).lte(Expr::col(GlobalSupply::MaxSupply)))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GlobalSupply::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum GlobalSupply {
    Table,
    Id,
    TotalClaimed,
    MaxSupply,
    UpdatedAt,
}
