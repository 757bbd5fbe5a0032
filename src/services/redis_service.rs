use std::sync::Arc;
use secrecy::ExposeSecret;
use redis::{AsyncCommands, Client, RedisError};

use crate::auth::jwt::Claims;
use crate::config::redis::RedisSettings;

const REVOKED_TOKEN_PREFIX: &str = "revoked_token";

/// Redis-backed token revocation list.
///
/// Without a client the list is always empty: logout still answers
/// successfully and tokens simply live until `exp`.
#[derive(Clone, Debug, Default)]
pub struct RedisService {
    pub client: Option<Arc<Client>>,
}

impl RedisService {
    pub fn new(client: Option<Arc<Client>>) -> Self {
        Self { client }
    }

    pub fn open(settings: &RedisSettings) -> Self {
        let client = match Client::open(settings.get_redis_url().expose_secret()) {
            Ok(client) => {
                tracing::info!("Redis client created successfully");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!("Failed to create Redis client: {}. Token revocation is disabled.", e);
                None
            }
        };
        Self { client }
    }

    fn revoked_key(jti: &str) -> String {
        format!("{}:{}", REVOKED_TOKEN_PREFIX, jti)
    }

    /// Revoke a token until its natural expiry.
    pub async fn revoke_token(&self, claims: &Claims) -> Result<(), RedisError> {
        let Some(client) = &self.client else {
            tracing::warn!("Redis not configured, token {} not revoked", claims.jti);
            return Ok(());
        };

        let ttl = claims.remaining_lifetime_secs();
        if ttl == 0 {
            return Ok(());
        }

        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(Self::revoked_key(&claims.jti), 1, ttl as usize)
            .await?;

        tracing::debug!("Revoked token {} for {}s", claims.jti, ttl);
        Ok(())
    }

    /// Lookup failures count as "not revoked" so an outage never locks users out.
    pub async fn is_token_revoked(&self, jti: &str) -> bool {
        let Some(client) = &self.client else {
            return false;
        };

        match Self::lookup(client, jti).await {
            Ok(revoked) => revoked,
            Err(e) => {
                tracing::warn!("Token revocation lookup failed: {}", e);
                false
            }
        }
    }

    async fn lookup(client: &Client, jti: &str) -> Result<bool, RedisError> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        conn.exists(Self::revoked_key(jti)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[tokio::test]
    async fn without_client_nothing_is_revoked() {
        let service = RedisService::default();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            username: "erin".into(),
            token_type: TokenType::Access,
            jti: "abc".into(),
            iat: 0,
            exp: usize::MAX / 2,
        };

        assert!(service.revoke_token(&claims).await.is_ok());
        assert!(!service.is_token_revoked(&claims.jti).await);
    }

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(RedisService::revoked_key("42"), "revoked_token:42");
    }
}
