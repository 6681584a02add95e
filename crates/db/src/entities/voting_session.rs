//! Voting session entity.
//!
//! One row per event, acting as the phase-1 state machine. The `version`
//! column is an optimistic-concurrency token: transitions update with a
//! version predicate so two organizers racing on `end()` cannot both win.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Voting session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[sea_orm(string_value = "notStarted")]
    NotStarted,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voting_session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: String,

    pub state: SessionState,

    /// Derived from event start plus the configured offset
    pub scheduled_start_at: DateTimeWithTimeZone,

    pub scheduled_end_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub opened_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub closed_at: Option<DateTimeWithTimeZone>,

    /// Running total across both categories
    pub votes_count: i32,

    #[sea_orm(nullable)]
    pub winner_presentation_style_id: Option<String>,

    #[sea_orm(nullable)]
    pub winner_speed_dating_twist_id: Option<String>,

    /// Optimistic concurrency token
    pub version: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
