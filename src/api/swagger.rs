use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bill Split Service API",
        version = "1.0.0",
        description = "Share expenses with friends and track who paid.\n\n**Authentication:** everything except registration, login and the health check requires a JWT Bearer token.\n\n**Errors:** failures answer `{\"message\": ...}`."
    ),
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::get_profile,

        crate::api::expenses::create_expense,
        crate::api::expenses::list_expenses,
        crate::api::expenses::get_expense,
        crate::api::expenses::mark_paid,
        crate::api::expenses::send_reminder,

        crate::api::friends::add_friend,
        crate::api::friends::list_friends,
        crate::api::friends::remove_friend,

        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::friend_service::AddFriendRequest,
            crate::models::UserSummary,
            crate::models::UserRef,
            crate::models::CreateExpenseRequest,
            crate::models::ParticipantView,
            crate::models::ExpenseView,
            crate::models::ExpenseListResponse,
            crate::api::MessageResponse,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Users", description = "Registration, login and profile."),
        (name = "Expenses", description = "Shared expenses, payments and reminders. Shares are the amount divided evenly between the participants and the creator."),
        (name = "Friends", description = "Symmetric friend list of the caller."),
        (name = "Health", description = "Liveness and storage reachability."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/users or /api/users/login"))
                        .build()
                ),
            );
        }
    }
}
