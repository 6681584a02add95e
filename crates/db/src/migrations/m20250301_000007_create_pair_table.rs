//! Create pair table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pair::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pair::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pair::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Pair::Round).integer().not_null())
                    .col(ColumnDef::new(Pair::User1Id).string_len(32).not_null())
                    .col(ColumnDef::new(Pair::User2Id).string_len(32).not_null())
                    .col(ColumnDef::new(Pair::MutualScore).double().not_null())
                    .col(
                        ColumnDef::new(Pair::IsTopMatch)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Pair::DurationMinutes).integer().not_null())
                    .col(ColumnDef::new(Pair::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Pair::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Pair::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pair_event")
                            .from(Pair::Table, Pair::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pair_user1")
                            .from(Pair::Table, Pair::User1Id)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pair_user2")
                            .from(Pair::Table, Pair::User2Id)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Uniqueness over (event, user1, user2, round); user ids are
        // normalized user1 < user2 before insert
        manager
            .create_index(
                Index::create()
                    .name("uq_pair_event_users_round")
                    .table(Pair::Table)
                    .col(Pair::EventId)
                    .col(Pair::User1Id)
                    .col(Pair::User2Id)
                    .col(Pair::Round)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pair_event_round")
                    .table(Pair::Table)
                    .col(Pair::EventId)
                    .col(Pair::Round)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pair::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Pair {
    Table,
    Id,
    EventId,
    Round,
    User1Id,
    User2Id,
    MutualScore,
    IsTopMatch,
    DurationMinutes,
    StartedAt,
    CompletedAt,
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
