//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_user_table;
mod m20250301_000002_create_event_table;
mod m20250301_000003_create_registration_table;
mod m20250301_000004_create_activity_option_table;
mod m20250301_000005_create_voting_tables;
mod m20250301_000006_create_presentation_tables;
mod m20250301_000007_create_pair_table;
mod m20250301_000008_create_notification_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_user_table::Migration),
            Box::new(m20250301_000002_create_event_table::Migration),
            Box::new(m20250301_000003_create_registration_table::Migration),
            Box::new(m20250301_000004_create_activity_option_table::Migration),
            Box::new(m20250301_000005_create_voting_tables::Migration),
            Box::new(m20250301_000006_create_presentation_tables::Migration),
            Box::new(m20250301_000007_create_pair_table::Migration),
            Box::new(m20250301_000008_create_notification_table::Migration),
        ]
    }
}
