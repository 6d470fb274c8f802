use actix_web::{web, HttpResponse, ResponseError};
use crate::{
    middleware::auth::Claims,
    models::UserSummary,
    services::friend_service::{self, AddFriendRequest},
    state::AppState,
};
use super::MessageResponse;

#[utoipa::path(
    post,
    path = "/api/friends",
    tag = "Friends",
    request_body = AddFriendRequest,
    responses(
        (status = 200, description = "Friend added", body = MessageResponse),
        (status = 400, description = "Self-friending or already friends", body = MessageResponse),
        (status = 404, description = "No user with that email", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_friend(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    request: web::Json<AddFriendRequest>,
) -> HttpResponse {
    log::info!("🤝 POST /friends - user {} adds {}", user.sub, request.email);

    match friend_service::add_friend(state.repo(), &user.sub, &request.email).await {
        Ok(_) => HttpResponse::Ok().json(MessageResponse::new("Friend added successfully")),
        Err(e) => {
            log::warn!("❌ Failed to add friend {}: {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/friends",
    tag = "Friends",
    responses(
        (status = 200, description = "Friends of the caller", body = Vec<UserSummary>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_friends(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
) -> HttpResponse {
    log::info!("📋 GET /friends - user {}", user.sub);

    match friend_service::list_friends(state.repo(), &user.sub).await {
        Ok(friends) => HttpResponse::Ok().json(friends),
        Err(e) => {
            log::error!("❌ Error listing friends: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/friends/{id}",
    tag = "Friends",
    params(("id" = String, Path, description = "Friend user id")),
    responses(
        (status = 200, description = "Friend removed", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_friend(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    friend_id: web::Path<String>,
) -> HttpResponse {
    log::info!("🗑️  DELETE /friends/{} - user {}", friend_id, user.sub);

    match friend_service::remove_friend(state.repo(), &user.sub, &friend_id).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Friend removed successfully")),
        Err(e) => {
            log::warn!("❌ Failed to remove friend: {}", e);
            e.error_response()
        }
    }
}
