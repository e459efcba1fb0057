//! Database migrations for the audience schema.

pub use sea_orm_migration::prelude::*;

mod m20260815_000001_create_user_profiles;

/// The migrator that runs all migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260815_000001_create_user_profiles::Migration)]
    }

    fn migration_table_name() -> SeaRc<dyn Iden> {
        SeaRc::new(Alias::new("audience_migrations"))
    }
}
