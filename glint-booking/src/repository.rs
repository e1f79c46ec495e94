use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, CompletionPhoto, CustomerAppointment, Order, OrderStatus,
};
use crate::policy::PolicyDecision;

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for appointment data access
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create_appointment(&self, appointment: &Appointment) -> Result<Uuid, RepoError>;

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, RepoError>;

    /// Appointments whose start time falls within [from, to] and whose
    /// status is one of `statuses`.
    async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, RepoError>;

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<(), RepoError>;

    async fn add_completion_photo(
        &self,
        id: Uuid,
        photo: &CompletionPhoto,
    ) -> Result<(), RepoError>;
}

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<Uuid, RepoError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError>;

    /// All confirmed orders, items included.
    async fn list_confirmed_orders(&self) -> Result<Vec<Order>, RepoError>;

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), RepoError>;
}

/// Repository trait for the customer-facing booking records
#[async_trait]
pub trait CustomerAppointmentRepository: Send + Sync {
    /// Whether a booking record already exists for (appointment, customer).
    async fn exists_for(&self, appointment_id: Uuid, customer_id: Uuid)
        -> Result<bool, RepoError>;

    async fn create(&self, booking: &CustomerAppointment) -> Result<Uuid, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<CustomerAppointment>, RepoError>;

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerAppointment>, RepoError>;

    /// Persist a freshly computed policy triple back onto the record.
    async fn update_policy_snapshot(
        &self,
        id: Uuid,
        decision: &PolicyDecision,
    ) -> Result<(), RepoError>;
}

/// Collaborator that delivers a booking reminder. Returns whether anything
/// was actually sent; `false` means no recipient could be resolved.
#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send_booking_reminder(&self, appointment: &Appointment) -> Result<bool, RepoError>;
}
