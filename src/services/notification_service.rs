use async_trait::async_trait;

/// Outbound payment reminder channel.
///
/// Called after the reminder is persisted; an error is logged by the caller
/// and never undoes the stored reminder.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: &str, expense_id: &str) -> Result<(), String>;
}

/// Writes reminders to the application log instead of delivering them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: &str, expense_id: &str) -> Result<(), String> {
        log::info!("🔔 Payment reminder for user {} on expense {}", user_id, expense_id);
        Ok(())
    }
}
