//! UserProfile entity - the local profile cache.
//!
//! One row per (repository, username) pair. A username appearing in two
//! repositories' audiences is cached twice, so dropping one repository's
//! rows never loses data for another.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cached profile model, keyed by repository slug and username.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// The `owner/name` slug of the repository whose audience this row
    /// belongs to.
    pub repository: String,

    /// GitHub username.
    pub username: String,

    /// Display name, if set on the profile.
    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,

    /// Public email, if set on the profile.
    #[sea_orm(column_type = "Text", nullable)]
    pub email: Option<String>,

    /// Blog or website URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub website: Option<String>,

    /// Company or organization affiliation.
    #[sea_orm(column_type = "Text", nullable)]
    pub organization: Option<String>,

    /// Free-form location.
    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,

    /// When this row was last written.
    pub cached_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
