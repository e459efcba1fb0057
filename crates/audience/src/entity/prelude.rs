//! Common re-exports for convenient entity usage.

pub use super::user_profile::{
    ActiveModel as UserProfileActiveModel, Column as UserProfileColumn, Entity as UserProfileEntity,
    Model as UserProfileModel,
};
