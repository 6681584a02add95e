//! User entity.
//!
//! Kept deliberately small: profile management lives elsewhere, this crate
//! only needs what auth, eligibility, and capacity-pool derivation read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gender used for capacity-pool derivation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    #[sea_orm(string_value = "female")]
    Female,
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "nonbinary")]
    Nonbinary,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub display_name: String,

    /// Gender from the profile; determines the capacity pool at registration
    #[sea_orm(nullable)]
    pub gender: Option<Gender>,

    /// Used by the eligibility age check
    #[sea_orm(nullable)]
    pub birth_date: Option<Date>,

    /// Preferred language code (e.g. "de", "en")
    #[sea_orm(nullable)]
    pub language: Option<String>,

    /// Bearer token for API access
    #[sea_orm(unique, nullable)]
    pub api_token: Option<String>,

    pub is_organizer: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::registration::Entity")]
    Registration,

    #[sea_orm(has_many = "super::event::Entity")]
    Event,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registration.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
