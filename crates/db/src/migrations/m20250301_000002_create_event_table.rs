//! Create event table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Event::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Event::OrganizerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Event::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Event::Description).text())
                    .col(
                        ColumnDef::new(Event::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Event::RegistrationDeadline)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Event::CapacityTotal).integer().not_null())
                    .col(ColumnDef::new(Event::CapacityFemale).integer())
                    .col(ColumnDef::new(Event::CapacityMale).integer())
                    .col(ColumnDef::new(Event::CapacityNonbinary).integer())
                    .col(ColumnDef::new(Event::MinAge).small_integer())
                    .col(ColumnDef::new(Event::MaxAge).small_integer())
                    .col(ColumnDef::new(Event::RequiredLanguage).string_len(8))
                    .col(
                        ColumnDef::new(Event::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Event::IsCancelled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Event::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_organizer")
                            .from(Event::Table, Event::OrganizerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: starts_at (for scheduler scans and listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_starts_at")
                    .table(Event::Table)
                    .col(Event::StartsAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    OrganizerId,
    Title,
    Description,
    StartsAt,
    RegistrationDeadline,
    CapacityTotal,
    CapacityFemale,
    CapacityMale,
    CapacityNonbinary,
    MinAge,
    MaxAge,
    RequiredLanguage,
    IsPublished,
    IsCancelled,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
