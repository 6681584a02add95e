//! Event entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user::Gender;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub organizer_id: String,

    pub title: String,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    pub starts_at: DateTimeWithTimeZone,

    pub registration_deadline: DateTimeWithTimeZone,

    /// Aggregate cap across all pools
    pub capacity_total: i32,

    /// Per-pool caps; either all three are set or none is
    #[sea_orm(nullable)]
    pub capacity_female: Option<i32>,
    #[sea_orm(nullable)]
    pub capacity_male: Option<i32>,
    #[sea_orm(nullable)]
    pub capacity_nonbinary: Option<i32>,

    #[sea_orm(nullable)]
    pub min_age: Option<i16>,
    #[sea_orm(nullable)]
    pub max_age: Option<i16>,

    /// Language participants must speak, if any
    #[sea_orm(nullable)]
    pub required_language: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_published: bool,

    #[sea_orm(default_value = false)]
    pub is_cancelled: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether per-gender sub-capacities apply to this event.
    ///
    /// The schema invariant is all-or-nothing; `all three set` is the
    /// authoritative test.
    #[must_use]
    pub const fn gender_limits_active(&self) -> bool {
        self.capacity_female.is_some()
            && self.capacity_male.is_some()
            && self.capacity_nonbinary.is_some()
    }

    /// Cap for one pool, when gender limits are active.
    #[must_use]
    pub const fn pool_capacity(&self, pool: Gender) -> Option<i32> {
        match pool {
            Gender::Female => self.capacity_female,
            Gender::Male => self.capacity_male,
            Gender::Nonbinary => self.capacity_nonbinary,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OrganizerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Organizer,

    #[sea_orm(has_many = "super::registration::Entity")]
    Registration,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizer.def()
    }
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
