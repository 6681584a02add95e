//! Speed-dating pair entity.
//!
//! Generated once per event from aggregated ratings. `user1_id < user2_id`
//! is normalized so the uniqueness constraint covers both directions; the
//! top-match flag is pair-level, shared by both members.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pair")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    /// 1-based round number
    pub round: i32,

    pub user1_id: String,

    pub user2_id: String,

    /// Averaged bidirectional rating; 0 when one side never rated
    pub mutual_score: f64,

    #[sea_orm(default_value = false)]
    pub is_top_match: bool,

    pub duration_minutes: i32,

    #[sea_orm(nullable)]
    pub started_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeWithTimeZone>,

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

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::User1Id",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User1,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::User2Id",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User2,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
