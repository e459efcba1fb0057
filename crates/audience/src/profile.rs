//! The enriched user profile record.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user_profile;

/// An enriched user record keyed by username.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub organization: Option<String>,
    pub location: Option<String>,
}

impl UserProfile {
    /// A profile with only the username populated.
    pub fn bare(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            email: None,
            website: None,
            organization: None,
            location: None,
        }
    }

    /// Whether a usable email address was discovered.
    ///
    /// The API reports hidden emails as null or an empty string; both
    /// count as absent.
    pub fn has_email(&self) -> bool {
        self.email
            .as_deref()
            .is_some_and(|email| !email.trim().is_empty())
    }

    /// Build a profile from its persisted form.
    pub fn from_model(model: &user_profile::Model) -> Self {
        Self {
            username: model.username.clone(),
            name: model.name.clone(),
            email: model.email.clone(),
            website: model.website.clone(),
            organization: model.organization.clone(),
            location: model.location.clone(),
        }
    }

    /// Build the persisted form for a repository's cache partition.
    pub fn to_active_model(&self, repository: &str) -> user_profile::ActiveModel {
        user_profile::ActiveModel {
            id: Set(Uuid::new_v4()),
            repository: Set(repository.to_string()),
            username: Set(self.username.clone()),
            name: Set(self.name.clone()),
            email: Set(self.email.clone()),
            website: Set(self.website.clone()),
            organization: Set(self.organization.clone()),
            location: Set(self.location.clone()),
            cached_at: Set(Utc::now().fixed_offset()),
        }
    }
}
