pub mod memory;
pub mod repository;

pub use memory::InMemoryStore;
pub use repository::Repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

use crate::models::{Expense, User};
use crate::utils::AppError;

const USERS: &str = "users";
const EXPENSES: &str = "expenses";
const DUPLICATE_KEY: i32 = 11000;
// Default name MongoDB gives the unique index on `users.email`
const EMAIL_INDEX: &str = "email_1";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = database_name(uri);
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the queries and uniqueness rules rely on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let users = self.collection::<mongodb::bson::Document>(USERS);
        let expenses = self.collection::<mongodb::bson::Document>(EXPENSES);

        let indexes = [
            (&users, "users(user_id)", IndexModel::builder().keys(doc! { "user_id": 1 }).options(unique()).build()),
            (&users, "users(email)", IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build()),
            (&expenses, "expenses(expense_id)", IndexModel::builder().keys(doc! { "expense_id": 1 }).options(unique()).build()),
            (&expenses, "expenses(creator)", IndexModel::builder().keys(doc! { "creator": 1 }).build()),
            (&expenses, "expenses(participants.user)", IndexModel::builder().keys(doc! { "participants.user": 1 }).build()),
        ];

        for (collection, label, index) in indexes {
            match collection.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: {}", label),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    fn users(&self) -> Collection<User> {
        self.collection(USERS)
    }

    fn expenses(&self) -> Collection<Expense> {
        self.collection(EXPENSES)
    }
}

fn database_name(uri: &str) -> &str {
    uri.rsplit('/')
        .next()
        .and_then(|s| s.split('?').next())
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .unwrap_or("BillSplit")
}

/// Duplicate key error raised by the unique index named `index`
fn is_duplicate_key_on(err: &mongodb::error::Error, index: &str) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => {
            e.code == DUPLICATE_KEY && names_index(&e.message, index)
        }
        _ => false,
    }
}

/// E11000 messages read `... collection: db.users index: email_1 dup key: {...}`
fn names_index(message: &str, index: &str) -> bool {
    message
        .split_whitespace()
        .skip_while(|word| *word != "index:")
        .nth(1)
        == Some(index)
}

#[async_trait]
impl Repository for MongoDB {
    async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.users().insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_on(&e, EMAIL_INDEX) => Err(AppError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "user_id": user_id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .users()
            .find(doc! { "user_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn add_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError> {
        let result = self
            .users()
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$addToSet": { "friends": friend_id } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn remove_friend_link(&self, user_id: &str, friend_id: &str) -> Result<(), AppError> {
        self.users()
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$pull": { "friends": friend_id } },
            )
            .await?;
        Ok(())
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<(), AppError> {
        self.expenses().insert_one(expense).await?;
        Ok(())
    }

    async fn find_expense(&self, expense_id: &str) -> Result<Option<Expense>, AppError> {
        Ok(self
            .expenses()
            .find_one(doc! { "expense_id": expense_id })
            .await?)
    }

    async fn find_expenses_by_creator(&self, user_id: &str) -> Result<Vec<Expense>, AppError> {
        let cursor = self.expenses().find(doc! { "creator": user_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_expenses_by_participant(&self, user_id: &str) -> Result<Vec<Expense>, AppError> {
        let cursor = self
            .expenses()
            .find(doc! { "participants.user": user_id })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn record_payment(
        &self,
        expense_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Expense>, AppError> {
        let paid_at = timestamp(&at)?;
        let result = self
            .expenses()
            .update_one(
                doc! { "expense_id": expense_id, "participants.user": user_id },
                doc! { "$set": {
                    "participants.$.paid": true,
                    "participants.$.paid_at": paid_at,
                } },
            )
            .await?;

        if result.matched_count == 0 {
            return Ok(None);
        }

        // Whichever payment lands last finds no unpaid record left
        self.expenses()
            .update_one(
                doc! {
                    "expense_id": expense_id,
                    "settled": false,
                    "participants": { "$not": { "$elemMatch": { "paid": false } } },
                },
                doc! { "$set": { "settled": true } },
            )
            .await?;

        self.find_expense(expense_id).await
    }

    async fn record_reminder(
        &self,
        expense_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let reminded_at = timestamp(&at)?;
        let result = self
            .expenses()
            .update_one(
                doc! {
                    "expense_id": expense_id,
                    "participants": { "$elemMatch": { "user": user_id, "paid": false } },
                },
                doc! { "$set": {
                    "participants.$.reminder_sent": true,
                    "participants.$.last_reminder_sent": reminded_at,
                } },
            )
            .await?;

        Ok(result.matched_count > 0)
    }
}

/// Same encoding serde gives `DateTime<Utc>` fields of stored documents
fn timestamp(at: &DateTime<Utc>) -> Result<Bson, AppError> {
    to_bson(at).map_err(|e| AppError::Internal(format!("Failed to encode timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_comes_from_uri_path() {
        assert_eq!(database_name("mongodb://localhost:27017/splits"), "splits");
        assert_eq!(
            database_name("mongodb+srv://u:p@cluster.example.net/splits?retryWrites=true"),
            "splits"
        );
        assert_eq!(database_name("mongodb://localhost:27017"), "BillSplit");
        assert_eq!(database_name("mongodb://localhost:27017/"), "BillSplit");
    }

    #[test]
    fn only_the_email_index_means_duplicate_email() {
        let email = "E11000 duplicate key error collection: BillSplit.users index: email_1 dup key: { email: \"a@x.io\" }";
        let user_id = "E11000 duplicate key error collection: BillSplit.users index: user_id_1 dup key: { user_id: \"65f0\" }";

        assert!(names_index(email, EMAIL_INDEX));
        assert!(!names_index(user_id, EMAIL_INDEX));
        assert!(!names_index("E11000 duplicate key error", EMAIL_INDEX));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/bill_split_test".to_string());

        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
    }
}
