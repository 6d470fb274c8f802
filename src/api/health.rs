use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub storage: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service and storage are reachable", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let storage = state.repo().ping().await;

    let response = HealthResponse {
        status: if storage.is_ok() { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: match &storage {
            Ok(()) => "ok".to_string(),
            Err(e) => e.to_string(),
        },
        timestamp: chrono::Utc::now().timestamp(),
    };

    match storage {
        Ok(()) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(response)
        }
    }
}
