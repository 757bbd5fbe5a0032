use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::error::AppError;

/// Resolve the authenticated user's id from the request claims.
pub fn parse_user_id(claims: &Claims) -> Result<Uuid, AppError> {
    claims.user_id().ok_or_else(|| {
        tracing::error!("Failed to parse user ID from token subject: {}", claims.sub);
        AppError::Unauthorized("Invalid token subject".to_string())
    })
}
