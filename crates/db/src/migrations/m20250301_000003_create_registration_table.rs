//! Create registration table migration.
//!
//! The partial unique index enforces at most one non-cancelled registration
//! per (event, user); cancelled rows stay behind as audit history.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Registration::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registration::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Registration::EventId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registration::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registration::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Registration::Pool).string_len(16))
                    .col(
                        ColumnDef::new(Registration::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Registration::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Registration::CancelledAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registration_event")
                            .from(Registration::Table, Registration::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registration_user")
                            .from(Registration::Table, Registration::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (event_id, status, created_at) covers capacity scans and
        // FIFO waitlist ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_registration_event_status_created")
                    .table(Registration::Table)
                    .col(Registration::EventId)
                    .col(Registration::Status)
                    .col(Registration::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registration_user_id")
                    .table(Registration::Table)
                    .col(Registration::UserId)
                    .to_owned(),
            )
            .await?;

        // Partial unique index: one active registration per (event, user)
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX uq_registration_event_user_active \
                 ON registration (event_id, user_id) \
                 WHERE status <> 'cancelled'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Registration::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Registration {
    Table,
    Id,
    EventId,
    UserId,
    Status,
    Pool,
    CreatedAt,
    UpdatedAt,
    CancelledAt,
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
