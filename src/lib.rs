use actix_web::{http, web, App, HttpServer};
use actix_web::dev::Server;
use tracing_actix_web::TracingLogger;
use sqlx::PgPool;
use std::net::TcpListener;
use actix_cors::Cors;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
mod handlers;
mod middleware;
pub mod models;
mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;

use crate::config::settings::Settings;
use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::routes::init_routes;
use crate::services::redis_service::RedisService;
use crate::services::wechat_client::WechatClient;

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    settings: &Settings,
    redis_service: RedisService,
) -> Result<Server, std::io::Error> {
    let wechat_client = WechatClient::new(&settings.wechat)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    // Wrap using web::Data, which boils down to an Arc smart pointer
    let db_pool_data = web::Data::new(db_pool);
    let jwt_settings = web::Data::new(settings.jwt.clone());
    let redis_service = web::Data::new(redis_service);
    let wechat_client = web::Data::new(wechat_client);
    let reset_settings = web::Data::new(settings.password_reset.clone());
    let allowed_origins = settings.application.cors_allowed_origins.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            // Get a pointer copy and attach it to the application state
            .app_data(db_pool_data.clone())
            .app_data(jwt_settings.clone())
            .app_data(redis_service.clone())
            .app_data(wechat_client.clone())
            .app_data(reset_settings.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
