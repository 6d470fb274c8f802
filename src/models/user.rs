use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Registered user as stored in the `users` collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: String,  // PRIMARY IDENTIFIER
    pub name: String,
    pub email: String,
    /// bcrypt hash, never the plain password
    pub password: String,
    #[serde(default)]
    pub friends: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_friend_of(&self, other_id: &str) -> bool {
        self.friends.iter().any(|id| id == other_id)
    }
}

/// Public view of a user (no credentials, no friend list)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.user_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Emails are compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn new_id() -> String {
    ObjectId::new().to_hex()
}
