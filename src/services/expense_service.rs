use crate::{
    database::Repository,
    models::{
        CreateExpenseRequest, Expense, ExpenseListResponse, ExpenseView, ParticipantView,
        UserRef, UserSummary,
    },
    services::access,
    utils::AppError,
};
use chrono::Utc;
use std::collections::HashMap;

/// Expense request that passed validation
#[derive(Debug)]
struct ValidExpense {
    title: String,
    description: Option<String>,
    amount: f64,
    participants: Vec<String>,
}

/// Validates the request and collapses repeated participant ids, keeping
/// the first occurrence.
fn validate_request(
    creator_id: &str,
    request: CreateExpenseRequest,
) -> Result<ValidExpense, AppError> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(AppError::Validation(
            "Amount must be a positive number".to_string(),
        ));
    }

    if request.participants.is_empty() {
        return Err(AppError::NoParticipants);
    }

    let mut participants: Vec<String> = Vec::with_capacity(request.participants.len());
    for id in request.participants {
        let id = id.trim().to_string();
        if id == creator_id {
            return Err(AppError::Validation(
                "The creator is included in the split automatically".to_string(),
            ));
        }
        if !participants.contains(&id) {
            participants.push(id);
        }
    }

    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(ValidExpense {
        title,
        description,
        amount: request.amount,
        participants,
    })
}

pub async fn create_expense(
    repo: &dyn Repository,
    creator_id: &str,
    request: CreateExpenseRequest,
) -> Result<Expense, AppError> {
    let valid = validate_request(creator_id, request)?;

    let found = repo.find_users_by_ids(&valid.participants).await?;
    if let Some(missing) = valid
        .participants
        .iter()
        .find(|id| !found.iter().any(|u| &u.user_id == *id))
    {
        return Err(AppError::NotFound(format!(
            "User with ID {} not found",
            missing
        )));
    }

    let expense = Expense::new(
        creator_id,
        valid.title,
        valid.description,
        valid.amount,
        valid.participants,
        Utc::now(),
    );

    repo.insert_expense(&expense).await?;

    log::info!(
        "🧾 Expense {} created by {}: {:.2} split {} ways",
        expense.expense_id,
        creator_id,
        expense.amount,
        expense.participants.len() + 1
    );

    Ok(expense)
}

/// Expenses the user created and expenses the user takes part in, newest first.
pub async fn list_expenses(
    repo: &dyn Repository,
    user_id: &str,
) -> Result<(Vec<Expense>, Vec<Expense>), AppError> {
    let mut created = repo.find_expenses_by_creator(user_id).await?;
    let mut participated = repo.find_expenses_by_participant(user_id).await?;

    created.sort_by(|a, b| b.date.cmp(&a.date));
    participated.sort_by(|a, b| b.date.cmp(&a.date));

    Ok((created, participated))
}

pub async fn get_expense(
    repo: &dyn Repository,
    requester_id: &str,
    expense_id: &str,
) -> Result<Expense, AppError> {
    let expense = load_expense(repo, expense_id).await?;
    access::ensure_can_view(&expense, requester_id)?;
    Ok(expense)
}

pub(crate) async fn load_expense(
    repo: &dyn Repository,
    expense_id: &str,
) -> Result<Expense, AppError> {
    repo.find_expense(expense_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))
}

// ==================== VIEWS ====================

fn to_view(expense: Expense, users: &HashMap<String, UserSummary>) -> ExpenseView {
    let user_ref = |id: &str| {
        users
            .get(id)
            .map(UserRef::from)
            .unwrap_or_else(|| UserRef::bare(id))
    };

    ExpenseView {
        creator: user_ref(&expense.creator),
        participants: expense
            .participants
            .iter()
            .map(|p| ParticipantView {
                user: user_ref(&p.user),
                amount: p.amount,
                paid: p.paid,
                paid_at: p.paid_at,
                reminder_sent: p.reminder_sent,
                last_reminder_sent: p.last_reminder_sent,
            })
            .collect(),
        id: expense.expense_id,
        title: expense.title,
        description: expense.description,
        amount: expense.amount,
        date: expense.date,
        settled: expense.settled,
    }
}

/// Resolves creator and participant ids to user summaries.
pub async fn populate(
    repo: &dyn Repository,
    expenses: Vec<Expense>,
) -> Result<Vec<ExpenseView>, AppError> {
    let mut ids: Vec<String> = Vec::new();
    for expense in &expenses {
        for id in std::iter::once(&expense.creator).chain(expense.participants.iter().map(|p| &p.user)) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }

    let users: HashMap<String, UserSummary> = repo
        .find_users_by_ids(&ids)
        .await?
        .iter()
        .map(|u| (u.user_id.clone(), UserSummary::from(u)))
        .collect();

    Ok(expenses.into_iter().map(|e| to_view(e, &users)).collect())
}

pub async fn populate_one(repo: &dyn Repository, expense: Expense) -> Result<ExpenseView, AppError> {
    populate(repo, vec![expense])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Expense lost while populating".to_string()))
}

pub async fn list_expense_views(
    repo: &dyn Repository,
    user_id: &str,
) -> Result<ExpenseListResponse, AppError> {
    let (created, participated) = list_expenses(repo, user_id).await?;
    Ok(ExpenseListResponse {
        created: populate(repo, created).await?,
        participated: populate(repo, participated).await?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::services::auth_service::tests::register_user;

    pub(crate) fn request(title: &str, amount: f64, participants: &[&str]) -> CreateExpenseRequest {
        CreateExpenseRequest {
            title: title.to_string(),
            description: None,
            amount,
            participants: participants.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn dinner_is_split_three_ways() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;
        let b = register_user(&store, "B").await.user;
        let c = register_user(&store, "C").await.user;
        let d = register_user(&store, "D").await.user;

        let expense = create_expense(&store, &a.id, request("Dinner", 90.0, &[b.id.as_str(), c.id.as_str()]))
            .await
            .unwrap();

        assert_eq!(expense.participants.len(), 2);
        assert!(expense.participants.iter().all(|p| (p.amount - 30.0).abs() < 1e-9));
        assert!(!expense.settled);

        assert!(get_expense(&store, &b.id, &expense.expense_id).await.is_ok());
        assert!(get_expense(&store, &a.id, &expense.expense_id).await.is_ok());
        let err = get_expense(&store, &d.id, &expense.expense_id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn uneven_amount_is_not_rounded() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;
        let b = register_user(&store, "B").await.user;
        let c = register_user(&store, "C").await.user;

        let expense = create_expense(&store, &a.id, request("Cab", 100.0, &[b.id.as_str(), c.id.as_str()]))
            .await
            .unwrap();

        let share = expense.participants[0].amount;
        assert_eq!(share, 100.0 / 3.0);
        assert!((share * 3.0 - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_participants_is_a_validation_error() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;

        let err = create_expense(&store, &a.id, request("Solo", 10.0, &[])).await.unwrap_err();
        assert!(matches!(err, AppError::NoParticipants));
        assert_eq!(err.kind(), crate::utils::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;
        let b = register_user(&store, "B").await.user;

        for bad in [
            request("  ", 10.0, &[b.id.as_str()]),
            request("Lunch", 0.0, &[b.id.as_str()]),
            request("Lunch", -5.0, &[b.id.as_str()]),
            request("Lunch", f64::NAN, &[b.id.as_str()]),
            request("Lunch", 10.0, &[a.id.as_str()]),
        ] {
            let err = create_expense(&store, &a.id, bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
        }

        let err = create_expense(&store, &a.id, request("Lunch", 10.0, &[b.id.as_str(), "unknown"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_participants_get_one_record() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;
        let b = register_user(&store, "B").await.user;

        let expense = create_expense(&store, &a.id, request("Coffee", 8.0, &[b.id.as_str(), b.id.as_str()]))
            .await
            .unwrap();
        assert_eq!(expense.participants.len(), 1);
        assert_eq!(expense.participants[0].amount, 4.0);
    }

    #[tokio::test]
    async fn list_splits_created_and_participated() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;
        let b = register_user(&store, "B").await.user;

        create_expense(&store, &a.id, request("One", 10.0, &[b.id.as_str()])).await.unwrap();
        create_expense(&store, &b.id, request("Two", 20.0, &[a.id.as_str()])).await.unwrap();

        let listed = list_expense_views(&store, &a.id).await.unwrap();
        assert_eq!(listed.created.len(), 1);
        assert_eq!(listed.created[0].title, "One");
        assert_eq!(listed.participated.len(), 1);
        assert_eq!(listed.participated[0].title, "Two");

        let view = &listed.participated[0];
        assert_eq!(view.creator.name.as_deref(), Some("B"));
        assert_eq!(view.participants[0].user.email.as_deref(), Some("a@example.com"));
    }

    #[tokio::test]
    async fn lists_are_newest_first() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;
        let b = register_user(&store, "B").await.user;
        let now = Utc::now();

        for (title, hours_ago) in [("Middle", 2), ("Newest", 1), ("Oldest", 3)] {
            let expense = Expense::new(
                &a.id,
                title.to_string(),
                None,
                10.0,
                vec![b.id.clone()],
                now - chrono::Duration::hours(hours_ago),
            );
            store.insert_expense(&expense).await.unwrap();
        }

        let (created, participated) = list_expenses(&store, &a.id).await.unwrap();
        let titles: Vec<&str> = created.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
        assert!(participated.is_empty());

        let (_, participated) = list_expenses(&store, &b.id).await.unwrap();
        let titles: Vec<&str> = participated.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
    }

    #[tokio::test]
    async fn unknown_users_are_returned_as_bare_ids() {
        let store = InMemoryStore::new();
        let b = register_user(&store, "B").await.user;

        let expense = Expense::new(
            "gone",
            "Rent".to_string(),
            None,
            1000.0,
            vec![b.id.clone(), "also-gone".to_string()],
            Utc::now(),
        );

        let view = populate_one(&store, expense).await.unwrap();
        assert_eq!(view.creator, UserRef::bare("gone"));
        assert_eq!(view.participants[0].user, UserRef::from(&b));
        assert_eq!(view.participants[1].user, UserRef::bare("also-gone"));

        let json = serde_json::to_value(&view.creator).unwrap();
        assert_eq!(json, serde_json::json!({ "_id": "gone" }));
    }

    #[tokio::test]
    async fn missing_expense_is_not_found() {
        let store = InMemoryStore::new();
        let a = register_user(&store, "A").await.user;
        let err = get_expense(&store, &a.id, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
