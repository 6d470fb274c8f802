use actix_web::{web, HttpResponse, ResponseError};
use crate::middleware::auth::Claims;
use crate::services::auth_service::{self, AuthResponse, LoginRequest, RegisterRequest};
use crate::models::UserSummary;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Missing field or user already exists", body = super::MessageResponse)
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    let email_str = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /users - email: {}", email_str);

    match auth_service::register(state.repo(), &state.auth, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", response.user.email);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email_str, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = super::MessageResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /users/login - email: {}", request.email);

    match auth_service::login(state.repo(), &state.auth, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    tag = "Users",
    responses(
        (status = 200, description = "User information retrieved", body = UserSummary),
        (status = 401, description = "Unauthorized", body = super::MessageResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
) -> HttpResponse {
    log::info!("👤 GET /users/profile - user {}", user.sub);

    match auth_service::get_current_user(state.repo(), &user.sub).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => {
            log::warn!("❌ Failed to get user {}: {}", user.sub, e);
            e.error_response()
        }
    }
}
