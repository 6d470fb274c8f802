pub mod auth;
pub mod expenses;
pub mod friends;
pub mod health;
pub mod swagger;

use actix_web::web;
use serde::{Deserialize, Serialize};

use crate::{middleware::auth::AuthMiddleware, utils::AppError};

/// `{ "message": ... }` body used for acknowledgements and errors
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        MessageResponse {
            message: message.to_string(),
        }
    }
}

/// Registers every route. Shared by `main` and the route tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    // Health check
    .route("/health", web::get().to(health::health_check))
    // Users: registration and login are public
    .service(
        web::scope("/api/users")
            .route("", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .service(
                web::resource("/profile")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::get_profile)),
            ),
    )
    // Expenses - Requires JWT
    .service(
        web::scope("/api/expenses")
            .wrap(AuthMiddleware)
            .route("", web::post().to(expenses::create_expense))
            .route("", web::get().to(expenses::list_expenses))
            .route("/{id}", web::get().to(expenses::get_expense))
            .route("/{id}/pay", web::put().to(expenses::mark_paid))
            .route("/{id}/remind/{user_id}", web::post().to(expenses::send_reminder)),
    )
    // Friends - Requires JWT
    .service(
        web::scope("/api/friends")
            .wrap(AuthMiddleware)
            .route("", web::post().to(friends::add_friend))
            .route("", web::get().to(friends::list_friends))
            .route("/{id}", web::delete().to(friends::remove_friend)),
    );
}
