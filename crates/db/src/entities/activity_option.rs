//! Activity option entity.
//!
//! Globally-defined catalogue entries; per-event tallies live in
//! `activity_vote`, so the same catalogue is reused across events.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The two voting categories of the in-event programme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "camelCase")]
pub enum ActivityCategory {
    #[sea_orm(string_value = "presentationStyle")]
    PresentationStyle,
    #[sea_orm(string_value = "speedDatingTwist")]
    SpeedDatingTwist,
}

/// Machine tag of the twist that grants top-match pairs extended rounds.
pub const EXTENDED_TOP_MATCH_CODE: &str = "extended-top-match-time";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_option")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub category: ActivityCategory,

    pub label: String,

    /// Stable machine tag, unique across the catalogue
    #[sea_orm(unique)]
    pub code: String,

    /// Catalogue sort order
    pub position: i32,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activity_vote::Entity")]
    ActivityVote,
}

impl Related<super::activity_vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityVote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
