pub mod auth_handler;
pub mod backend_health_handler;
pub mod health_data;
pub mod password_handler;
pub mod profile;
pub mod registration_handler;
pub mod reminder_handler;
pub mod wechat_handler;
