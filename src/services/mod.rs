pub mod password_reset;
pub mod redis_service;
pub mod wechat_client;

pub use redis_service::RedisService;
pub use wechat_client::WechatClient;
