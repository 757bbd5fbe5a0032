use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

const RESET_TOKEN_LENGTH: usize = 48;

/// A freshly minted reset token. Only `hash` is ever persisted.
pub struct ResetToken {
    pub token: String,
    pub hash: String,
}

pub fn generate_reset_token() -> ResetToken {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let hash = hash_reset_token(&token);
    ResetToken { token, hash }
}

pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Delivery hook for reset tokens. There is no mailer, the token goes to the debug log.
pub fn deliver_reset_token(email: &str, token: &str) {
    tracing::info!("Password reset requested for {}", email);
    tracing::debug!("Password reset token for {}: {}", email, token);
}
