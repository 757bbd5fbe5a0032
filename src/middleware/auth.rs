// src/middleware/auth.rs
use std::future::{ready, Ready};
use std::rc::Rc;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform}, http::header, web, Error, HttpMessage
};
use futures_util::future::LocalBoxFuture;

pub use crate::auth::jwt::Claims;
use crate::auth::jwt::{decode_token, TokenType};
use crate::config::jwt::JwtSettings;
use crate::error::AppError;
use crate::services::redis_service::RedisService;

fn unauthorized(message: &str) -> Error {
    AppError::Unauthorized(message.to_string()).into()
}

/// Extract and validate the bearer access token of a request.
pub fn validate_jwt_from_request(req: &ServiceRequest) -> Result<Claims, Error> {
    let jwt_settings = req.app_data::<web::Data<JwtSettings>>()
        .ok_or_else(|| AppError::Internal("JWT settings not registered".to_string()))?;

    let auth_header = req.headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Authentication credentials were not provided"))?
        .to_str()
        .map_err(|_| unauthorized("Invalid authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid authorization header format"))?;

    let claims = decode_token(token, jwt_settings).map_err(|e| {
        tracing::info!("Rejected token: {:?}", e);
        unauthorized("Invalid or expired token")
    })?;

    if claims.token_type != TokenType::Access {
        return Err(unauthorized("Refresh tokens cannot be used for authentication"));
    }

    Ok(claims)
}

// Create the middleware
pub struct AuthMiddleware;

// Middleware factory
impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service: Rc::new(service) }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let claims = validate_jwt_from_request(&req)?;

            // The revocation check needs Redis, so it runs inside the future
            if let Some(redis) = req.app_data::<web::Data<RedisService>>() {
                if redis.is_token_revoked(&claims.jti).await {
                    tracing::info!("Rejected revoked token {}", claims.jti);
                    return Err(unauthorized("Token has been revoked"));
                }
            }

            // Store the claims in the request extensions for handlers to access
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
