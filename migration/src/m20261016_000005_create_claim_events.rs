use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClaimEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ClaimEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ClaimEvents::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(ClaimEvents::Amount)
                            .decimal_len(30, 8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClaimEvents::ClaimedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claim_events_account")
                            .from(ClaimEvents::Table, ClaimEvents::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_claim_events_account_time")
                    .table(ClaimEvents::Table)
                    .col(ClaimEvents::AccountId)
                    .col((ClaimEvents::ClaimedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClaimEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ClaimEvents {
    Table,
    Id,
    AccountId,
    Amount,
    ClaimedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}
