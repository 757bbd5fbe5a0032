pub mod auth;
pub mod health_record;
pub mod profile;
pub mod reminder;
pub mod user;
