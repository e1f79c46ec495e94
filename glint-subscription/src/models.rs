use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use glint_booking::policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One recurring visit instance under a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionAppointment {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    /// Derived from the 24-hour policy; advisory snapshot, recomputed on
    /// read where it matters.
    pub can_reschedule: bool,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionAppointment {
    pub fn new(subscription_id: Uuid, scheduled_for: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            scheduled_for,
            can_reschedule: policy::evaluate_at(scheduled_for, None, now).can_reschedule,
            created_at: now,
        }
    }

    pub fn refresh_can_reschedule(&mut self, now: DateTime<Utc>) {
        self.can_reschedule = policy::evaluate_at(self.scheduled_for, None, now).can_reschedule;
    }
}

/// Change-request status: pending is initial, approved/rejected terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestStatus::Pending => "PENDING",
            ChangeRequestStatus::Approved => "APPROVED",
            ChangeRequestStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown change request status: {0}")]
pub struct UnknownChangeRequestStatus(pub String);

impl FromStr for ChangeRequestStatus {
    type Err = UnknownChangeRequestStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ChangeRequestStatus::Pending),
            "APPROVED" => Ok(ChangeRequestStatus::Approved),
            "REJECTED" => Ok(ChangeRequestStatus::Rejected),
            other => Err(UnknownChangeRequestStatus(other.to_string())),
        }
    }
}

/// A customer request to move a subscription visit.
///
/// Once reviewed, the record is immutable evidence of the decision.
/// `reviewed_by` is a weak reference: deleting the reviewer account clears
/// it but the stamped review itself is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub subscription_appointment_id: Uuid,
    pub requested_date: NaiveDate,
    pub requested_time: Option<NaiveTime>,
    pub reason: Option<String>,
    pub status: ChangeRequestStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChangeRequest {
    pub fn new(
        subscription_appointment_id: Uuid,
        requested_date: NaiveDate,
        requested_time: Option<NaiveTime>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_appointment_id,
            requested_date,
            requested_time,
            reason,
            status: ChangeRequestStatus::Pending,
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_reviewed(&self) -> bool {
        self.status != ChangeRequestStatus::Pending
    }
}
