//! Create presentation slot and rating tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PresentationSlot::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PresentationSlot::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PresentationSlot::EventId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PresentationSlot::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PresentationSlot::Position).integer().not_null())
                    .col(
                        ColumnDef::new(PresentationSlot::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PresentationSlot::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PresentationSlot::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(PresentationSlot::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_presentation_slot_event")
                            .from(PresentationSlot::Table, PresentationSlot::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_presentation_slot_user")
                            .from(PresentationSlot::Table, PresentationSlot::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One slot per participant per event (queue init is idempotent)
        manager
            .create_index(
                Index::create()
                    .name("uq_presentation_slot_event_user")
                    .table(PresentationSlot::Table)
                    .col(PresentationSlot::EventId)
                    .col(PresentationSlot::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rating::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rating::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Rating::PresenterId).string_len(32).not_null())
                    .col(ColumnDef::new(Rating::RaterId).string_len(32).not_null())
                    .col(ColumnDef::new(Rating::Score).small_integer().not_null())
                    .col(
                        ColumnDef::new(Rating::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_event")
                            .from(Rating::Table, Rating::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_presenter")
                            .from(Rating::Table, Rating::PresenterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_rater")
                            .from(Rating::Table, Rating::RaterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one rating per (event, presenter, rater)
        manager
            .create_index(
                Index::create()
                    .name("uq_rating_event_presenter_rater")
                    .table(Rating::Table)
                    .col(Rating::EventId)
                    .col(Rating::PresenterId)
                    .col(Rating::RaterId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PresentationSlot::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PresentationSlot {
    Table,
    Id,
    EventId,
    UserId,
    Position,
    Status,
    StartedAt,
    CompletedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Rating {
    Table,
    Id,
    EventId,
    PresenterId,
    RaterId,
    Score,
    CreatedAt,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
