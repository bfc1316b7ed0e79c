//! SeaORM database migrations.
//!
//! Written with the schema builder so the same set runs on PostgreSQL and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_issues;
mod m20250301_000003_create_tags;
mod m20250301_000004_create_issue_tags;
mod m20250301_000005_create_comments;
mod m20250301_000006_create_attachments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_issues::Migration),
            Box::new(m20250301_000003_create_tags::Migration),
            Box::new(m20250301_000004_create_issue_tags::Migration),
            Box::new(m20250301_000005_create_comments::Migration),
            Box::new(m20250301_000006_create_attachments::Migration),
        ]
    }
}
