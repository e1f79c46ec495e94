use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub customer_appointment_id: Uuid,
    pub appointment_id: Uuid,
    pub customer_id: Uuid,
    pub order_number: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub customer_appointment_id: Uuid,
    pub appointment_id: Uuid,
    pub customer_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReminderSentEvent {
    pub appointment_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ChangeRequestReviewedEvent {
    pub change_request_id: Uuid,
    pub subscription_appointment_id: Uuid,
    pub decision: String,
    pub reviewed_by: Option<Uuid>,
    pub timestamp: i64,
}
