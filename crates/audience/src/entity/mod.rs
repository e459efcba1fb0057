//! SeaORM entity definitions for the audience database schema.

pub mod prelude;
pub mod user_profile;
