//! Create voting session and activity vote tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VotingSession::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VotingSession::EventId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VotingSession::State)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingSession::ScheduledStartAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingSession::ScheduledEndAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotingSession::OpenedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(VotingSession::ClosedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(VotingSession::VotesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VotingSession::WinnerPresentationStyleId).string_len(32),
                    )
                    .col(ColumnDef::new(VotingSession::WinnerSpeedDatingTwistId).string_len(32))
                    .col(
                        ColumnDef::new(VotingSession::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VotingSession::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voting_session_event")
                            .from(VotingSession::Table, VotingSession::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityVote::EventId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityVote::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityVote::Category)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityVote::OptionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_vote_event")
                            .from(ActivityVote::Table, ActivityVote::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_vote_user")
                            .from(ActivityVote::Table, ActivityVote::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_vote_option")
                            .from(ActivityVote::Table, ActivityVote::OptionId)
                            .to(ActivityOption::Table, ActivityOption::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One vote per (event, user, category)
        manager
            .create_index(
                Index::create()
                    .name("uq_activity_vote_event_user_category")
                    .table(ActivityVote::Table)
                    .col(ActivityVote::EventId)
                    .col(ActivityVote::UserId)
                    .col(ActivityVote::Category)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_vote_event_option")
                    .table(ActivityVote::Table)
                    .col(ActivityVote::EventId)
                    .col(ActivityVote::OptionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityVote::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VotingSession::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VotingSession {
    Table,
    EventId,
    State,
    ScheduledStartAt,
    ScheduledEndAt,
    OpenedAt,
    ClosedAt,
    VotesCount,
    WinnerPresentationStyleId,
    WinnerSpeedDatingTwistId,
    Version,
    CreatedAt,
}

#[derive(Iden)]
enum ActivityVote {
    Table,
    Id,
    EventId,
    UserId,
    Category,
    OptionId,
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

#[derive(Iden)]
enum ActivityOption {
    Table,
    Id,
}
