use crate::{
    database::Repository,
    models::Expense,
    services::{access, expense_service::load_expense, notification_service::Notifier},
    utils::AppError,
};
use chrono::Utc;

const PAYER_NOT_PARTICIPANT: &str = "You are not a participant in this expense";
const TARGET_NOT_PARTICIPANT: &str = "User is not a participant in this expense";

/// The caller pays their own share. Re-marking refreshes `paid_at`.
///
/// Checks run against a snapshot; the write itself is a single atomic
/// update of the one payment record, so concurrent payments on the same
/// expense all survive and the last one settles it.
pub async fn mark_paid(
    repo: &dyn Repository,
    requester_id: &str,
    expense_id: &str,
) -> Result<Expense, AppError> {
    let snapshot = load_expense(repo, expense_id).await?;
    access::participant(&snapshot, requester_id, PAYER_NOT_PARTICIPANT)?;

    let expense = repo
        .record_payment(expense_id, requester_id, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotAParticipant(PAYER_NOT_PARTICIPANT.to_string()))?;

    log::info!("💸 {} paid their share of expense {}", requester_id, expense_id);
    if expense.settled && !snapshot.settled {
        log::info!("✅ Expense {} is settled", expense_id);
    } else {
        log::debug!("   {} still outstanding on {}", expense.outstanding(), expense_id);
    }

    Ok(expense)
}

pub async fn send_reminder(
    repo: &dyn Repository,
    notifier: &dyn Notifier,
    requester_id: &str,
    expense_id: &str,
    target_id: &str,
) -> Result<(), AppError> {
    let snapshot = load_expense(repo, expense_id).await?;
    access::ensure_creator(&snapshot, requester_id)?;

    if access::participant(&snapshot, target_id, TARGET_NOT_PARTICIPANT)?.paid {
        return Err(AppError::AlreadyPaid);
    }

    // Records are never removed, so a miss here means the share got paid meanwhile
    if !repo.record_reminder(expense_id, target_id, Utc::now()).await? {
        return Err(AppError::AlreadyPaid);
    }

    log::info!("📨 Reminder recorded for {} on expense {}", target_id, expense_id);

    if let Err(e) = notifier.notify(target_id, expense_id).await {
        log::warn!("⚠️ Reminder notification failed for {}: {}", target_id, e);
    }

    Ok(())
}
