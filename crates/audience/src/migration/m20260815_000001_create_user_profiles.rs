//! Initial migration to create the profile cache schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    // Internal
                    .col(
                        ColumnDef::new(UserProfiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Identity
                    .col(
                        ColumnDef::new(UserProfiles::Repository)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserProfiles::Username).string().not_null())
                    // Profile fields
                    .col(ColumnDef::new(UserProfiles::Name).text().null())
                    .col(ColumnDef::new(UserProfiles::Email).text().null())
                    .col(ColumnDef::new(UserProfiles::Website).text().null())
                    .col(
                        ColumnDef::new(UserProfiles::Organization)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(UserProfiles::Location).text().null())
                    // Tracking
                    .col(
                        ColumnDef::new(UserProfiles::CachedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (repository, username) - the upsert target
        manager
            .create_index(
                Index::create()
                    .name("idx_user_profiles_repository_username")
                    .table(UserProfiles::Table)
                    .col(UserProfiles::Repository)
                    .col(UserProfiles::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on repository for bulk loads
        manager
            .create_index(
                Index::create()
                    .name("idx_user_profiles_repository")
                    .table(UserProfiles::Table)
                    .col(UserProfiles::Repository)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Id,
    Repository,
    Username,
    Name,
    Email,
    Website,
    Organization,
    Location,
    CachedAt,
}
