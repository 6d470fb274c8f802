use crate::{
    config::AuthSettings,
    database::Repository,
    models::{new_id, normalize_email, User, UserSummary},
    utils::AppError,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user_id
    pub email: String,
    pub name: String,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `{token, _id, name, email}`: the user summary flattened next to the token
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub token: String,
    #[serde(flatten)]
    pub user: UserSummary,
}

// Generate JWT token
pub fn generate_jwt(user: &User, settings: &AuthSettings) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(settings.token_ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: settings.jwt_audience.clone(),
        iss: settings.jwt_issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, settings: &AuthSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.jwt_audience.as_str()]);
    validation.set_issuer(&[settings.jwt_issuer.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Not authorized, token failed: {}", e)))
}

fn required(field: &Option<String>, label: &str) -> Result<String, AppError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{} is required", label)))
}

// User registration
pub async fn register(
    repo: &dyn Repository,
    settings: &AuthSettings,
    request: &RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let name = required(&request.name, "Name")?;
    let email = normalize_email(&required(&request.email, "Email")?);
    // Passwords are taken verbatim, only emptiness is checked
    let password = request
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;

    if repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let hashed_password = hash(password, settings.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let new_user = User {
        _id: None,
        user_id: new_id(),
        name,
        email,
        password: hashed_password,
        friends: vec![],
        created_at: Utc::now(),
    };

    // The unique index still catches a concurrent registration of the same email
    repo.insert_user(&new_user).await?;

    let token = generate_jwt(&new_user, settings)?;

    log::info!("✅ User registered successfully: {}", new_user.email);

    Ok(AuthResponse {
        token,
        user: UserSummary::from(&new_user),
    })
}

// User login
pub async fn login(
    repo: &dyn Repository,
    settings: &AuthSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = repo
        .find_user_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(invalid());
    }

    let token = generate_jwt(&user, settings)?;

    Ok(AuthResponse {
        token,
        user: UserSummary::from(&user),
    })
}

// Get current user
pub async fn get_current_user(
    repo: &dyn Repository,
    user_id: &str,
) -> Result<UserSummary, AppError> {
    repo.find_user_by_id(user_id)
        .await?
        .map(|user| UserSummary::from(&user))
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
