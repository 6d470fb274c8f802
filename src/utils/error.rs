use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

/// Coarse classification used to pick the HTTP status of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    Unauthorized,
    Internal,
}

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NoParticipants,
    SelfFriend,
    NotAParticipant(String),
    NotFound(String),
    Forbidden(String),
    DuplicateEmail,
    AlreadyFriends,
    AlreadyPaid,
    Unauthorized(String),
    DatabaseError(String),
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_)
            | AppError::NoParticipants
            | AppError::SelfFriend
            | AppError::NotAParticipant(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::DuplicateEmail | AppError::AlreadyFriends | AppError::AlreadyPaid => {
                ErrorKind::Conflict
            }
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::DatabaseError(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::NoParticipants => write!(f, "At least one participant is required"),
            AppError::SelfFriend => write!(f, "Cannot add yourself as a friend"),
            AppError::NotAParticipant(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::DuplicateEmail => write!(f, "User already exists"),
            AppError::AlreadyFriends => write!(f, "Already friends with this user"),
            AppError::AlreadyPaid => write!(f, "This user has already paid"),
            AppError::Unauthorized(msg) => write!(f, "{}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self.kind() {
            ErrorKind::Internal => {
                log::error!("❌ {}", self);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn conflicts_and_validation_map_to_400() {
        assert_eq!(AppError::AlreadyPaid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoParticipants.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::SelfFriend.kind(), ErrorKind::Validation);
        assert_eq!(AppError::DuplicateEmail.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn access_errors_keep_their_status() {
        assert_eq!(
            AppError::Forbidden("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("who".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let res = AppError::DatabaseError("connection reset".into()).error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(res.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }
}
