use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::user::{new_id, UserSummary};

/// Payment record of one participant inside an expense
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantPayment {
    /// user_id of the participant
    pub user: String,

    /// Share owed by this participant
    pub amount: f64,

    #[serde(default)]
    pub paid: bool,

    pub paid_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub reminder_sent: bool,

    pub last_reminder_sent: Option<DateTime<Utc>>,
}

impl ParticipantPayment {
    pub fn new(user: String, amount: f64) -> Self {
        ParticipantPayment {
            user,
            amount,
            paid: false,
            paid_at: None,
            reminder_sent: false,
            last_reminder_sent: None,
        }
    }
}

/// Shared expense (stored in the `expenses` collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub expense_id: String,

    pub title: String,

    pub description: Option<String>,

    /// Total amount, creator share included
    pub amount: f64,

    /// user_id of the creator. The creator is never listed as a participant.
    pub creator: String,

    pub date: DateTime<Utc>,

    #[serde(default)]
    pub settled: bool,

    pub participants: Vec<ParticipantPayment>,
}

/// Equal share of `amount` over the participants plus the creator.
///
/// Plain float division: shares are not rounded, so they may not add up to
/// `amount` to the cent.
pub fn equal_share(amount: f64, participant_count: usize) -> f64 {
    amount / (participant_count + 1) as f64
}

impl Expense {
    /// Builds a pending expense with one unpaid record per participant.
    /// Callers validate the inputs first.
    pub fn new(
        creator: &str,
        title: String,
        description: Option<String>,
        amount: f64,
        participant_ids: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let share = equal_share(amount, participant_ids.len());
        let participants = participant_ids
            .into_iter()
            .map(|user| ParticipantPayment::new(user, share))
            .collect();

        Expense {
            _id: None,
            expense_id: new_id(),
            title,
            description,
            amount,
            creator: creator.to_string(),
            date: now,
            settled: false,
            participants,
        }
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator == user_id
    }

    pub fn participant(&self, user_id: &str) -> Option<&ParticipantPayment> {
        self.participants.iter().find(|p| p.user == user_id)
    }

    pub fn participant_mut(&mut self, user_id: &str) -> Option<&mut ParticipantPayment> {
        self.participants.iter_mut().find(|p| p.user == user_id)
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participant(user_id).is_some()
    }

    /// Marks the share of `user_id` paid and recomputes `settled`.
    /// Returns false when `user_id` has no payment record. Marking an
    /// already paid share again only refreshes `paid_at`.
    pub fn record_payment(&mut self, user_id: &str, at: DateTime<Utc>) -> bool {
        let Some(participant) = self.participant_mut(user_id) else {
            return false;
        };
        participant.paid = true;
        participant.paid_at = Some(at);

        // Pending -> Settled only; nothing un-pays a share
        self.settled = self.settled || self.all_paid();
        true
    }

    /// Flags a reminder on the unpaid share of `user_id`.
    /// Returns false when there is no unpaid record for `user_id`.
    pub fn record_reminder(&mut self, user_id: &str, at: DateTime<Utc>) -> bool {
        match self.participant_mut(user_id) {
            Some(participant) if !participant.paid => {
                participant.reminder_sent = true;
                participant.last_reminder_sent = Some(at);
                true
            }
            _ => false,
        }
    }

    pub fn all_paid(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(|p| p.paid)
    }

    pub fn outstanding(&self) -> f64 {
        self.participants
            .iter()
            .filter(|p| !p.paid)
            .map(|p| p.amount)
            .sum()
    }
}

// ==================== REQUESTS / RESPONSES ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    /// user ids of the participants (creator excluded)
    pub participants: Vec<String>,
}

/// User reference inside an expense response. Name and email are filled in
/// when the user still exists.
#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserRef {
    pub fn bare(id: &str) -> Self {
        UserRef {
            id: id.to_string(),
            name: None,
            email: None,
        }
    }
}

impl From<&UserSummary> for UserRef {
    fn from(summary: &UserSummary) -> Self {
        UserRef {
            id: summary.id.clone(),
            name: Some(summary.name.clone()),
            email: Some(summary.email.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub user: UserRef,
    pub amount: f64,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub last_reminder_sent: Option<DateTime<Utc>>,
}

/// Expense as returned by the API: `_id` and camelCase keys, users populated
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub creator: UserRef,
    pub date: DateTime<Utc>,
    pub settled: bool,
    pub participants: Vec<ParticipantView>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ExpenseListResponse {
    pub created: Vec<ExpenseView>,
    pub participated: Vec<ExpenseView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dinner() -> Expense {
        Expense::new(
            "alice",
            "Dinner".to_string(),
            None,
            90.0,
            vec!["bob".to_string(), "carol".to_string()],
            Utc::now(),
        )
    }

    #[test]
    fn creator_takes_an_implicit_share() {
        let expense = dinner();
        assert_eq!(expense.participants.len(), 2);
        for p in &expense.participants {
            assert_eq!(p.amount, 30.0);
            assert!(!p.paid);
            assert!(p.paid_at.is_none());
            assert!(!p.reminder_sent);
        }
        assert!(!expense.settled);
        assert!(!expense.is_participant("alice"));
        assert!(expense.is_creator("alice"));
    }

    #[test]
    fn shares_sum_to_total_within_tolerance() {
        for (amount, k) in [(100.0, 2usize), (10.0, 6), (0.01, 1), (1234.56, 4)] {
            let share = equal_share(amount, k);
            let total = share * (k + 1) as f64;
            assert!((total - amount).abs() < 1e-9, "{} over {}", amount, k);
        }
    }

    #[test]
    fn settles_once_every_share_is_paid() {
        let mut expense = dinner();
        let now = Utc::now();

        assert!(expense.record_payment("bob", now));
        assert!(!expense.settled);
        assert!(!expense.record_payment("alice", now));
        assert!(expense.record_payment("carol", now));
        assert!(expense.settled);
        assert!(expense.participants.iter().all(|p| p.paid_at == Some(now)));
    }

    #[test]
    fn reminders_only_reach_unpaid_shares() {
        let mut expense = dinner();
        let now = Utc::now();

        assert!(expense.record_reminder("bob", now));
        assert_eq!(expense.participant("bob").unwrap().last_reminder_sent, Some(now));

        expense.record_payment("carol", now);
        assert!(!expense.record_reminder("carol", now));
        assert!(!expense.participant("carol").unwrap().reminder_sent);
        assert!(!expense.record_reminder("alice", now));
    }

    #[test]
    fn outstanding_excludes_paid_records() {
        let mut expense = dinner();
        expense.participant_mut("bob").unwrap().paid = true;
        assert_eq!(expense.outstanding(), 30.0);
        assert!(!expense.all_paid());
    }
}
