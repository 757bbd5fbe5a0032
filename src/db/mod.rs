pub mod health_records;
pub mod password_resets;
pub mod profiles;
pub mod reminders;
pub mod users;
