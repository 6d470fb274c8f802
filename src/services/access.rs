//! Authorization checks gating ledger reads and settlement writes.

use crate::{
    models::{Expense, ParticipantPayment},
    utils::AppError,
};

/// Creator or participant may read an expense.
pub fn ensure_can_view(expense: &Expense, user_id: &str) -> Result<(), AppError> {
    if expense.is_creator(user_id) || expense.is_participant(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to access this expense".to_string(),
        ))
    }
}

pub fn ensure_creator(expense: &Expense, user_id: &str) -> Result<(), AppError> {
    if expense.is_creator(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the creator can send reminders".to_string(),
        ))
    }
}

/// Payment record of `user_id`, `NotAParticipant` carrying `message` otherwise.
pub fn participant<'a>(
    expense: &'a Expense,
    user_id: &str,
    message: &str,
) -> Result<&'a ParticipantPayment, AppError> {
    expense
        .participant(user_id)
        .ok_or_else(|| AppError::NotAParticipant(message.to_string()))
}
