use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hashed = hash_password("testpass123").unwrap();
        assert!(verify_password("testpass123", &hashed));
        assert!(!verify_password("wrongpass", &hashed));
        assert!(!verify_password("testpass123", "not-a-bcrypt-hash"));
    }
}
