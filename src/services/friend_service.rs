use crate::{
    database::Repository,
    models::{normalize_email, User, UserSummary},
    utils::AppError,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddFriendRequest {
    pub email: String,
}

async fn load_user(repo: &dyn Repository, user_id: &str) -> Result<User, AppError> {
    repo.find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Links the caller and the user owning `friend_email` in both directions.
///
/// The two writes are independent documents. When the second one fails the
/// first is undone, so the pair is left unlinked rather than one-sided.
pub async fn add_friend(
    repo: &dyn Repository,
    user_id: &str,
    friend_email: &str,
) -> Result<UserSummary, AppError> {
    let friend = repo
        .find_user_by_email(&normalize_email(friend_email))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if friend.user_id == user_id {
        return Err(AppError::SelfFriend);
    }

    let user = load_user(repo, user_id).await?;

    if user.is_friend_of(&friend.user_id) {
        return Err(AppError::AlreadyFriends);
    }

    repo.add_friend_link(&user.user_id, &friend.user_id).await?;

    if let Err(e) = repo.add_friend_link(&friend.user_id, &user.user_id).await {
        log::error!(
            "❌ Failed to link {} -> {}, undoing {} -> {}: {}",
            friend.user_id, user.user_id, user.user_id, friend.user_id, e
        );
        if let Err(undo) = repo.remove_friend_link(&user.user_id, &friend.user_id).await {
            log::error!(
                "❌ Compensation failed, friendship {} <-> {} is asymmetric: {}",
                user.user_id, friend.user_id, undo
            );
        }
        return Err(e);
    }

    log::info!("🤝 {} and {} are now friends", user.user_id, friend.user_id);

    Ok(UserSummary::from(&friend))
}

/// Unlinks both directions. Succeeds when the link is already gone.
pub async fn remove_friend(
    repo: &dyn Repository,
    user_id: &str,
    friend_id: &str,
) -> Result<(), AppError> {
    let user = load_user(repo, user_id).await?;

    repo.remove_friend_link(&user.user_id, friend_id).await?;

    if repo.find_user_by_id(friend_id).await?.is_some() {
        repo.remove_friend_link(friend_id, &user.user_id).await?;
    }

    log::info!("👋 {} removed friend {}", user.user_id, friend_id);

    Ok(())
}

pub async fn list_friends(
    repo: &dyn Repository,
    user_id: &str,
) -> Result<Vec<UserSummary>, AppError> {
    let user = load_user(repo, user_id).await?;
    let friends = repo.find_users_by_ids(&user.friends).await?;

    // Keep the order in which friends were added
    Ok(user
        .friends
        .iter()
        .filter_map(|id| friends.iter().find(|f| &f.user_id == id))
        .map(UserSummary::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::models::Expense;
    use crate::services::auth_service::tests::register_user;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    #[tokio::test]
    async fn add_friend_links_both_sides() {
        let store = InMemoryStore::new();
        let alice = register_user(&store, "Alice").await.user;
        let bob = register_user(&store, "Bob").await.user;

        let added = add_friend(&store, &alice.id, "bob@example.com").await.unwrap();
        assert_eq!(added, bob);

        assert_eq!(list_friends(&store, &alice.id).await.unwrap(), vec![bob.clone()]);
        assert_eq!(list_friends(&store, &bob.id).await.unwrap(), vec![alice.clone()]);
    }

    #[tokio::test]
    async fn add_friend_error_cases() {
        let store = InMemoryStore::new();
        let alice = register_user(&store, "Alice").await.user;
        register_user(&store, "Bob").await;

        let err = add_friend(&store, &alice.id, "nobody@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = add_friend(&store, &alice.id, "ALICE@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::SelfFriend));

        add_friend(&store, &alice.id, "bob@example.com").await.unwrap();
        let err = add_friend(&store, &alice.id, "bob@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyFriends));
    }

    #[tokio::test]
    async fn remove_friend_unlinks_both_sides_idempotently() {
        let store = InMemoryStore::new();
        let alice = register_user(&store, "Alice").await.user;
        let bob = register_user(&store, "Bob").await.user;
        let carol = register_user(&store, "Carol").await.user;

        add_friend(&store, &alice.id, "bob@example.com").await.unwrap();
        add_friend(&store, &alice.id, "carol@example.com").await.unwrap();

        remove_friend(&store, &alice.id, &bob.id).await.unwrap();
        assert_eq!(list_friends(&store, &alice.id).await.unwrap(), vec![carol]);
        assert!(list_friends(&store, &bob.id).await.unwrap().is_empty());

        remove_friend(&store, &alice.id, &bob.id).await.unwrap();
        remove_friend(&store, &alice.id, "no-such-user").await.unwrap();
    }

    /// Store whose reverse friend link write always fails
    struct FailingReverseLink {
        inner: InMemoryStore,
        failing_user: String,
    }

    #[async_trait]
    impl Repository for FailingReverseLink {
        async fn ping(&self) -> Result<(), AppError> {
            self.inner.ping().await
        }
        async fn insert_user(&self, user: &User) -> Result<(), AppError> {
            self.inner.insert_user(user).await
        }
        async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
            self.inner.find_user_by_id(user_id).await
        }
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
            self.inner.find_user_by_email(email).await
        }
        async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
            self.inner.find_users_by_ids(ids).await
        }
        async fn add_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError> {
            if user_id == self.failing_user {
                return Err(AppError::DatabaseError("write failed".to_string()));
            }
            self.inner.add_friend_link(user_id, friend_id).await
        }
        async fn remove_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError> {
            self.inner.remove_friend_link(user_id, friend_id).await
        }
        async fn insert_expense(&self, expense: &Expense) -> Result<(), AppError> {
            self.inner.insert_expense(expense).await
        }
        async fn find_expense(&self, expense_id: &str) -> Result<Option<Expense>, AppError> {
            self.inner.find_expense(expense_id).await
        }
        async fn find_expenses_by_creator(&self, user_id: &str) -> Result<Vec<Expense>, AppError> {
            self.inner.find_expenses_by_creator(user_id).await
        }
        async fn find_expenses_by_participant(&self, user_id: &str) -> Result<Vec<Expense>, AppError> {
            self.inner.find_expenses_by_participant(user_id).await
        }
        async fn record_payment(
            &self,
            expense_id: &str,
            user_id: &str,
            at: DateTime<Utc>,
        ) -> Result<Option<Expense>, AppError> {
            self.inner.record_payment(expense_id, user_id, at).await
        }
        async fn record_reminder(
            &self,
            expense_id: &str,
            user_id: &str,
            at: DateTime<Utc>,
        ) -> Result<bool, AppError> {
            self.inner.record_reminder(expense_id, user_id, at).await
        }
    }

    #[tokio::test]
    async fn failed_reverse_link_is_compensated() {
        let inner = InMemoryStore::new();
        let alice = register_user(&inner, "Alice").await.user;
        let bob = register_user(&inner, "Bob").await.user;

        let store = FailingReverseLink {
            inner,
            failing_user: bob.id.clone(),
        };

        let err = add_friend(&store, &alice.id, "bob@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));

        assert!(list_friends(&store, &alice.id).await.unwrap().is_empty());
        assert!(list_friends(&store, &bob.id).await.unwrap().is_empty());
    }
}
