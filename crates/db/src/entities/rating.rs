//! Rating entity.
//!
//! Anonymous 1-5 score from a rater to a presenter, at most one per
//! (event, presenter, rater). Responses never expose the rater to the
//! presenter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rating")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    #[sea_orm(indexed)]
    pub presenter_id: String,

    pub rater_id: String,

    /// 1..=5
    pub score: i16,

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
        from = "Column::PresenterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Presenter,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RaterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Rater,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
