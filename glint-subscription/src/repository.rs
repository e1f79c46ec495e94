use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ChangeRequest, SubscriptionAppointment};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for subscription visit instances
#[async_trait]
pub trait SubscriptionAppointmentRepository: Send + Sync {
    async fn create(&self, visit: &SubscriptionAppointment) -> Result<Uuid, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<SubscriptionAppointment>, RepoError>;

    async fn update_schedule(
        &self,
        id: Uuid,
        scheduled_for: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), RepoError>;
}

/// Repository trait for change requests
#[async_trait]
pub trait ChangeRequestRepository: Send + Sync {
    async fn create(&self, request: &ChangeRequest) -> Result<Uuid, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<ChangeRequest>, RepoError>;

    /// Requests for one subscription visit, most recent first.
    async fn list_for_subscription_appointment(
        &self,
        subscription_appointment_id: Uuid,
    ) -> Result<Vec<ChangeRequest>, RepoError>;

    /// Persist the stamped review fields of a freshly reviewed request.
    /// Only a still-pending row is transitioned; returns whether the
    /// transition happened, so a concurrent review loses instead of
    /// silently overwriting the first decision.
    async fn record_review(&self, request: &ChangeRequest) -> Result<bool, RepoError>;

    /// Clear `reviewed_by` wherever it references `user_id`; returns the
    /// number of rows touched.
    async fn detach_reviewer(&self, user_id: Uuid) -> Result<u64, RepoError>;
}
