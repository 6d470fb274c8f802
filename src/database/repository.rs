//! Persistence seam between the services and a concrete store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Expense, User};
use crate::utils::AppError;

/// Record store for users and expenses.
///
/// Every method touches a single document and is atomic on it. There is no
/// transaction spanning several calls, so callers that need two writes to
/// agree (friend links) must compensate themselves.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Round trip to the backing store, used by the health check.
    async fn ping(&self) -> Result<(), AppError>;

    /// Insert a new user. Fails with `DuplicateEmail` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Users whose id is in `ids`, in no particular order. Unknown ids are skipped.
    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError>;

    /// Add `friend_id` to the friend set of `user_id` (no-op if present).
    async fn add_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError>;

    /// Remove `friend_id` from the friend set of `user_id` (no-op if absent).
    async fn remove_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError>;

    async fn insert_expense(&self, expense: &Expense) -> Result<(), AppError>;

    async fn find_expense(&self, expense_id: &str) -> Result<Option<Expense>, AppError>;

    async fn find_expenses_by_creator(&self, user_id: &str) -> Result<Vec<Expense>, AppError>;

    async fn find_expenses_by_participant(&self, user_id: &str) -> Result<Vec<Expense>, AppError>;

    /// Marks the share of `user_id` paid and settles the expense once no
    /// share is outstanding, without overwriting concurrent changes to other
    /// records. Returns the expense as stored afterwards, `None` when it has
    /// no record for `user_id`.
    async fn record_payment(
        &self,
        expense_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Expense>, AppError>;

    /// Flags a reminder on the share of `user_id` if it is still unpaid.
    /// Returns `false` when no unpaid record matched.
    async fn record_reminder(
        &self,
        expense_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
}
