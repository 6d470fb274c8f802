//! In-process store used for local development (`STORAGE_BACKEND=memory`)
//! and by the test suites. Data lives only as long as the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::Repository;
use crate::models::{Expense, User};
use crate::utils::AppError;

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<Vec<User>>,
    expenses: RwLock<HashMap<String, Expense>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on the stored expense while holding the write lock
    async fn update_expense<R>(
        &self,
        expense_id: &str,
        f: impl FnOnce(&mut Expense) -> R,
    ) -> Result<R, AppError> {
        let mut expenses = self.expenses.write().await;
        let expense = expenses
            .get_mut(expense_id)
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))?;
        Ok(f(expense))
    }
}

#[async_trait]
impl Repository for InMemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail);
        }
        if users.iter().any(|u| u.user_id == user.user_id) {
            return Err(AppError::DatabaseError(format!(
                "duplicate user_id {}",
                user.user_id
            )));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| ids.contains(&u.user_id))
            .cloned()
            .collect())
    }

    async fn add_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !user.is_friend_of(friend_id) {
            user.friends.push(friend_id.to_string());
        }
        Ok(())
    }

    async fn remove_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
            user.friends.retain(|id| id != friend_id);
        }
        Ok(())
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<(), AppError> {
        let mut expenses = self.expenses.write().await;
        if expenses.contains_key(&expense.expense_id) {
            return Err(AppError::DatabaseError(format!(
                "duplicate expense_id {}",
                expense.expense_id
            )));
        }
        expenses.insert(expense.expense_id.clone(), expense.clone());
        Ok(())
    }

    async fn find_expense(&self, expense_id: &str) -> Result<Option<Expense>, AppError> {
        Ok(self.expenses.read().await.get(expense_id).cloned())
    }

    async fn find_expenses_by_creator(&self, user_id: &str) -> Result<Vec<Expense>, AppError> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .values()
            .filter(|e| e.is_creator(user_id))
            .cloned()
            .collect())
    }

    async fn find_expenses_by_participant(&self, user_id: &str) -> Result<Vec<Expense>, AppError> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .values()
            .filter(|e| e.is_participant(user_id))
            .cloned()
            .collect())
    }

    async fn record_payment(
        &self,
        expense_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Expense>, AppError> {
        self.update_expense(expense_id, |expense| {
            expense.record_payment(user_id, at).then(|| expense.clone())
        })
        .await
    }

    async fn record_reminder(
        &self,
        expense_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        self.update_expense(expense_id, |expense| expense.record_reminder(user_id, at))
            .await
    }
}
