use actix_web::web;

pub mod auth;
pub mod backend_health;
pub mod health_records;
pub mod profile;
pub mod registration;
pub mod reminders;

use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    cfg.service(
        web::scope("/api")
            // Public
            .service(registration::register)
            .service(auth::login)
            .service(auth::refresh)
            .service(auth::wechat)
            .service(auth::request_password_reset)
            .service(auth::reset_password)
            // Current user (require authentication)
            .service(
                web::scope("/users/me")
                    .wrap(AuthMiddleware)
                    .service(profile::current_user)
                    .service(profile::update_current_user)
                    .service(profile::profile)
                    .service(profile::update_profile)
                    .service(profile::change_password)
            )
            .service(
                web::scope("/users/logout")
                    .wrap(AuthMiddleware)
                    .service(auth::logout)
            )
            // Health records; fixed paths before `{record_id}`
            .service(
                web::scope("/health-records")
                    .wrap(AuthMiddleware)
                    .service(health_records::list_records)
                    .service(health_records::create_record)
                    .service(health_records::batch_create_records)
                    .service(health_records::statistics)
                    .service(health_records::get_record)
                    .service(health_records::replace_record)
                    .service(health_records::patch_record)
                    .service(health_records::delete_record)
            )
            .service(
                web::scope("/reminders")
                    .wrap(AuthMiddleware)
                    .service(reminders::list_reminders)
                    .service(reminders::create_reminder)
                    .service(reminders::reminders_today)
                    .service(reminders::get_reminder)
                    .service(reminders::replace_reminder)
                    .service(reminders::patch_reminder)
                    .service(reminders::delete_reminder)
            )
    );
}
