use crate::models::{ChangeRequest, ChangeRequestStatus};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome a reviewer can record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn as_status(&self) -> ChangeRequestStatus {
        match self {
            ReviewDecision::Approved => ChangeRequestStatus::Approved,
            ReviewDecision::Rejected => ChangeRequestStatus::Rejected,
        }
    }
}

/// State machine for customer reschedule requests on subscription visits.
///
/// pending → approved | rejected, exactly once. Applying the approved date
/// to the underlying visit is the caller's concern; the request record is
/// immutable evidence of the decision.
pub struct ChangeRequestWorkflow {
    requests: HashMap<Uuid, ChangeRequest>,
}

impl ChangeRequestWorkflow {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
        }
    }

    /// Customer submits a reschedule request; it starts out pending.
    pub fn submit(
        &mut self,
        subscription_appointment_id: Uuid,
        requested_date: NaiveDate,
        requested_time: Option<NaiveTime>,
        reason: Option<String>,
    ) -> &ChangeRequest {
        let request = ChangeRequest::new(
            subscription_appointment_id,
            requested_date,
            requested_time,
            reason,
        );
        let id = request.id;
        self.requests.insert(id, request);
        &self.requests[&id]
    }

    pub fn get(&self, id: &Uuid) -> Option<&ChangeRequest> {
        self.requests.get(id)
    }

    /// Review transition: stamps the decision, the reviewer, and the
    /// review time. Terminal; a second review attempt fails.
    pub fn review(
        &mut self,
        id: &Uuid,
        decision: ReviewDecision,
        reviewed_by: Uuid,
        review_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&ChangeRequest, ChangeRequestError> {
        let request = self
            .requests
            .get_mut(id)
            .ok_or_else(|| ChangeRequestError::NotFound(id.to_string()))?;

        if request.is_reviewed() {
            return Err(ChangeRequestError::AlreadyReviewed {
                id: id.to_string(),
                status: request.status.to_string(),
            });
        }

        request.status = decision.as_status();
        request.reviewed_at = Some(now);
        request.reviewed_by = Some(reviewed_by);
        request.review_notes = review_notes;
        Ok(&self.requests[id])
    }

    /// Requests for one subscription visit, most recent first.
    pub fn list_for(&self, subscription_appointment_id: &Uuid) -> Vec<&ChangeRequest> {
        let mut requests: Vec<&ChangeRequest> = self
            .requests
            .values()
            .filter(|r| r.subscription_appointment_id == *subscription_appointment_id)
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }

    /// Clear the reviewer reference on every review stamped by `user_id`,
    /// preserving the decisions themselves. Returns how many records were
    /// touched. Mirrors the ON DELETE SET NULL column in storage.
    pub fn detach_reviewer(&mut self, user_id: &Uuid) -> usize {
        let mut detached = 0;
        for request in self.requests.values_mut() {
            if request.reviewed_by == Some(*user_id) {
                request.reviewed_by = None;
                detached += 1;
            }
        }
        detached
    }
}

impl Default for ChangeRequestWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChangeRequestError {
    #[error("Change request not found: {0}")]
    NotFound(String),

    #[error("Change request {id} already reviewed ({status})")]
    AlreadyReviewed { id: String, status: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn requested_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn test_submit_then_approve() {
        let mut workflow = ChangeRequestWorkflow::new();
        let visit_id = Uuid::new_v4();
        let reviewer = Uuid::new_v4();

        let id = workflow
            .submit(visit_id, requested_date(), None, Some("holiday".to_string()))
            .id;

        let now = Utc::now();
        let reviewed = workflow
            .review(
                &id,
                ReviewDecision::Approved,
                reviewer,
                Some("moved to requested slot".to_string()),
                now,
            )
            .unwrap();

        assert_eq!(reviewed.status, ChangeRequestStatus::Approved);
        assert_eq!(reviewed.reviewed_at, Some(now));
        assert_eq!(reviewed.reviewed_by, Some(reviewer));
        assert_eq!(reviewed.review_notes.as_deref(), Some("moved to requested slot"));
    }

    #[test]
    fn test_reject_stamps_review_fields() {
        let mut workflow = ChangeRequestWorkflow::new();
        let id = workflow.submit(Uuid::new_v4(), requested_date(), None, None).id;

        let reviewed = workflow
            .review(&id, ReviewDecision::Rejected, Uuid::new_v4(), None, Utc::now())
            .unwrap();
        assert_eq!(reviewed.status, ChangeRequestStatus::Rejected);
        assert!(reviewed.reviewed_at.is_some());
    }

    #[test]
    fn test_second_review_is_rejected() {
        let mut workflow = ChangeRequestWorkflow::new();
        let id = workflow.submit(Uuid::new_v4(), requested_date(), None, None).id;
        let reviewer = Uuid::new_v4();

        workflow
            .review(&id, ReviewDecision::Approved, reviewer, None, Utc::now())
            .unwrap();

        let err = workflow
            .review(&id, ReviewDecision::Rejected, reviewer, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ChangeRequestError::AlreadyReviewed { .. }));

        // First decision untouched.
        assert_eq!(
            workflow.get(&id).unwrap().status,
            ChangeRequestStatus::Approved
        );
    }

    #[test]
    fn test_listing_is_most_recent_first() {
        let mut workflow = ChangeRequestWorkflow::new();
        let visit_id = Uuid::new_v4();

        let first = workflow.submit(visit_id, requested_date(), None, None).id;
        let second = workflow.submit(visit_id, requested_date(), None, None).id;

        // Force distinct creation times.
        if let Some(r) = workflow.requests.get_mut(&second) {
            r.created_at = r.created_at + Duration::seconds(5);
        }
        // A request on another visit must not appear.
        workflow.submit(Uuid::new_v4(), requested_date(), None, None);

        let listed: Vec<Uuid> = workflow.list_for(&visit_id).iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![second, first]);
    }

    #[test]
    fn test_detach_reviewer_preserves_decision() {
        let mut workflow = ChangeRequestWorkflow::new();
        let reviewer = Uuid::new_v4();
        let id = workflow.submit(Uuid::new_v4(), requested_date(), None, None).id;
        let reviewed_at = Utc::now();
        workflow
            .review(&id, ReviewDecision::Approved, reviewer, Some("ok".to_string()), reviewed_at)
            .unwrap();

        assert_eq!(workflow.detach_reviewer(&reviewer), 1);

        let request = workflow.get(&id).unwrap();
        assert_eq!(request.reviewed_by, None);
        assert_eq!(request.status, ChangeRequestStatus::Approved);
        assert_eq!(request.reviewed_at, Some(reviewed_at));
        assert_eq!(request.review_notes.as_deref(), Some("ok"));
    }
}
