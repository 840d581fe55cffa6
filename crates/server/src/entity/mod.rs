//! SeaORM entities backing the user store.

pub mod application_role;
pub mod user;
