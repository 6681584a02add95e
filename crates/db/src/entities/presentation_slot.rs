//! Presentation slot entity.
//!
//! One slot per (event, confirmed participant), bulk-created in randomized
//! order when the voting session closes. Never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Slot progression during phase 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum SlotStatus {
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "presenting")]
    Presenting,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "skipped")]
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "presentation_slot")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    /// 1-based queue position
    pub position: i32,

    pub status: SlotStatus,

    #[sea_orm(nullable)]
    pub started_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Presentation duration in seconds, if both instants were recorded.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
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
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_duration_requires_both_instants() {
        let now = Utc::now();
        let mut slot = Model {
            id: "slot1".to_string(),
            event_id: "ev1".to_string(),
            user_id: "u1".to_string(),
            position: 1,
            status: SlotStatus::Completed,
            started_at: Some(now.into()),
            completed_at: None,
            created_at: now.into(),
        };
        assert_eq!(slot.duration_seconds(), None);

        slot.completed_at = Some((now + Duration::seconds(90)).into());
        assert_eq!(slot.duration_seconds(), Some(90));
    }
}
