use actix_web::{web, HttpResponse, ResponseError};
use crate::{
    middleware::auth::Claims,
    models::{CreateExpenseRequest, ExpenseListResponse, ExpenseView},
    services::{expense_service, settlement_service},
    state::AppState,
};
use super::MessageResponse;

/// POST /api/expenses - Creates an expense split evenly with the creator
#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = ExpenseView),
        (status = 400, description = "Invalid expense", body = MessageResponse),
        (status = 404, description = "Participant not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_expense(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    request: web::Json<CreateExpenseRequest>,
) -> HttpResponse {
    let user_id = &user.sub;

    log::info!("📝 POST /expenses - '{}' by user {}", request.title, user_id);

    let result = match expense_service::create_expense(state.repo(), user_id, request.into_inner()).await {
        Ok(expense) => expense_service::populate_one(state.repo(), expense).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => HttpResponse::Created().json(view),
        Err(e) => {
            log::warn!("❌ Failed to create expense: {}", e);
            e.error_response()
        }
    }
}

/// GET /api/expenses - Expenses created by and shared with the caller
#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Expenses",
    responses(
        (status = 200, description = "Expenses of the caller", body = ExpenseListResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_expenses(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
) -> HttpResponse {
    log::info!("📋 GET /expenses - user {}", user.sub);

    match expense_service::list_expense_views(state.repo(), &user.sub).await {
        Ok(response) => {
            log::info!(
                "✅ Listed {} created / {} participated",
                response.created.len(),
                response.participated.len()
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::error!("❌ Error listing expenses: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/expenses/{id}",
    tag = "Expenses",
    params(("id" = String, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense", body = ExpenseView),
        (status = 403, description = "Caller is neither creator nor participant", body = MessageResponse),
        (status = 404, description = "Expense not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_expense(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    expense_id: web::Path<String>,
) -> HttpResponse {
    log::info!("🔎 GET /expenses/{} - user {}", expense_id, user.sub);

    let result = match expense_service::get_expense(state.repo(), &user.sub, &expense_id).await {
        Ok(expense) => expense_service::populate_one(state.repo(), expense).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            log::warn!("❌ GET /expenses/{} failed: {}", expense_id, e);
            e.error_response()
        }
    }
}

/// PUT /api/expenses/{id}/pay - The caller pays their own share
#[utoipa::path(
    put,
    path = "/api/expenses/{id}/pay",
    tag = "Expenses",
    params(("id" = String, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Updated expense", body = ExpenseView),
        (status = 400, description = "Caller is not a participant", body = MessageResponse),
        (status = 404, description = "Expense not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_paid(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    expense_id: web::Path<String>,
) -> HttpResponse {
    log::info!("💳 PUT /expenses/{}/pay - user {}", expense_id, user.sub);

    let result = match settlement_service::mark_paid(state.repo(), &user.sub, &expense_id).await {
        Ok(expense) => expense_service::populate_one(state.repo(), expense).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            log::warn!("❌ Payment update failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/expenses/{id}/remind/{user_id}",
    tag = "Expenses",
    params(
        ("id" = String, Path, description = "Expense id"),
        ("user_id" = String, Path, description = "Participant to remind")
    ),
    responses(
        (status = 200, description = "Reminder sent", body = MessageResponse),
        (status = 400, description = "Not a participant or already paid", body = MessageResponse),
        (status = 403, description = "Only the creator can send reminders", body = MessageResponse),
        (status = 404, description = "Expense not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_reminder(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (expense_id, target_id) = path.into_inner();

    log::info!("📨 POST /expenses/{}/remind/{} - user {}", expense_id, target_id, user.sub);

    match settlement_service::send_reminder(
        state.repo(),
        state.notifier.as_ref(),
        &user.sub,
        &expense_id,
        &target_id,
    )
    .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Reminder sent successfully")),
        Err(e) => {
            log::warn!("❌ Reminder failed: {}", e);
            e.error_response()
        }
    }
}
