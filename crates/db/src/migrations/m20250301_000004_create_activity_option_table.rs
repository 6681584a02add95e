//! Create activity option (global catalogue) table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityOption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityOption::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::Category)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::Label)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::Code)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ActivityOption::Position).integer().not_null())
                    .col(
                        ColumnDef::new(ActivityOption::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ActivityOption::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_option_category")
                    .table(ActivityOption::Table)
                    .col(ActivityOption::Category)
                    .col(ActivityOption::Position)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityOption::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivityOption {
    Table,
    Id,
    Category,
    Label,
    Code,
    Position,
    IsActive,
    CreatedAt,
}
