use serde::Deserialize;
use secrecy::SecretString;

/// Mini-program credentials used for the `jscode2session` exchange.
#[derive(Debug, Deserialize, Clone)]
pub struct WechatSettings {
    pub app_id: String,
    pub app_secret: SecretString,
    pub api_base_url: String,
    pub timeout_secs: u64,
}
