pub mod datetime;
pub mod health_statistics;
pub mod parse_user;
pub mod password;
pub mod reminder_schedule;
