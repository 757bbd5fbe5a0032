use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::config::wechat::WechatSettings;

/// Raw `jscode2session` payload. WeChat omits `errcode` on success.
/// Only the openid is kept, the session key is never needed.
#[derive(Debug, Deserialize)]
pub struct Code2SessionResponse {
    #[serde(default)]
    pub openid: Option<String>,
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: Option<String>,
}

#[derive(Debug)]
pub struct WechatSession {
    pub openid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WechatError {
    #[error("WeChat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid WeChat API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected WeChat response: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("WeChat login failed: {errmsg}")]
    Api { errcode: i64, errmsg: String },

    #[error("WeChat login failed: no openid returned")]
    MissingOpenid,
}

impl TryFrom<Code2SessionResponse> for WechatSession {
    type Error = WechatError;

    fn try_from(response: Code2SessionResponse) -> Result<Self, Self::Error> {
        if response.errcode != 0 {
            return Err(WechatError::Api {
                errcode: response.errcode,
                errmsg: response.errmsg.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        let openid = response
            .openid
            .filter(|openid| !openid.is_empty())
            .ok_or(WechatError::MissingOpenid)?;

        Ok(WechatSession { openid })
    }
}

#[derive(Debug, Clone)]
pub struct WechatClient {
    base_url: String,
    app_id: String,
    app_secret: SecretString,
    client: Client,
}

impl WechatClient {
    pub fn new(settings: &WechatSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            app_id: settings.app_id.clone(),
            app_secret: settings.app_secret.clone(),
            client,
        })
    }

    fn code2session_url(&self, code: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &format!("{}/sns/jscode2session", self.base_url),
            &[
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.expose_secret()),
                ("js_code", code),
                ("grant_type", "authorization_code"),
            ],
        )
    }

    /// Exchange a mini-program login `code` for the user's openid.
    pub async fn code_to_session(&self, code: &str) -> Result<WechatSession, WechatError> {
        let url = self.code2session_url(code)?;

        tracing::debug!("Calling WeChat jscode2session for app {}", self.app_id);

        let response = self.client.get(url).send().await?.error_for_status()?;

        // WeChat answers with text/plain, so decode the body explicitly
        let body = response.text().await?;
        let payload: Code2SessionResponse = serde_json::from_str(&body)?;

        let session = WechatSession::try_from(payload)?;
        tracing::info!("WeChat session established for openid {}", session.openid);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WechatClient {
        WechatClient::new(&WechatSettings {
            app_id: "wx123".to_string(),
            app_secret: SecretString::new("s3cret".to_string().into_boxed_str()),
            api_base_url: "https://api.weixin.qq.com/".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn url_carries_credentials_and_code() {
        let url = client().code2session_url("abc&def").unwrap();
        assert_eq!(url.path(), "/sns/jscode2session");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("appid".into(), "wx123".into())));
        assert!(pairs.contains(&("js_code".into(), "abc&def".into())));
        assert!(pairs.contains(&("grant_type".into(), "authorization_code".into())));
    }

    #[test]
    fn errcode_is_reported() {
        let payload: Code2SessionResponse =
            serde_json::from_str(r#"{"errcode":40029,"errmsg":"invalid code"}"#).unwrap();
        match WechatSession::try_from(payload) {
            Err(WechatError::Api { errcode, errmsg }) => {
                assert_eq!(errcode, 40029);
                assert_eq!(errmsg, "invalid code");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_openid_is_an_error() {
        let payload: Code2SessionResponse =
            serde_json::from_str(r#"{"session_key":"k"}"#).unwrap();
        assert!(matches!(
            WechatSession::try_from(payload),
            Err(WechatError::MissingOpenid)
        ));
    }

    #[test]
    fn success_yields_openid() {
        let payload: Code2SessionResponse =
            serde_json::from_str(r#"{"openid":"o-1","session_key":"k","errcode":0}"#).unwrap();
        let session = WechatSession::try_from(payload).unwrap();
        assert_eq!(session.openid, "o-1");
    }
}
