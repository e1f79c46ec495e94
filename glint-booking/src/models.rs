use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::policy::{self, PolicyDecision};

/// Appointment status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown status value: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Photo taken by staff on visit completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionPhoto {
    pub url: String,
    pub storage_path: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A single scheduled service occurrence. Never deleted, only
/// status-transitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub completion_photos: Vec<CompletionPhoto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(service_id: Uuid, staff_id: Option<Uuid>, start_time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            service_id,
            staff_id,
            start_time,
            status: AppointmentStatus::Pending,
            completion_photos: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: AppointmentStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn add_completion_photo(&mut self, photo: CompletionPhoto) {
        self.completion_photos.push(photo);
        self.updated_at = Utc::now();
    }
}

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Payment status carried on orders and booking records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// An individual purchased service within an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub appointment_id: Option<Uuid>,
    pub total_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn new(
        order_id: Uuid,
        service_id: Uuid,
        service_name: String,
        appointment_id: Option<Uuid>,
        total_price_cents: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            service_id,
            service_name,
            appointment_id,
            total_price_cents,
            created_at: Utc::now(),
        }
    }
}

/// A customer purchase grouping one or more appointments.
///
/// `customer_id = None` marks a guest order; guest orders are excluded
/// from booking-record reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub cancellation_policy_hours: Option<i32>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(customer_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number: generate_order_number(now),
            customer_id,
            status: OrderStatus::Pending,
            payment_status: None,
            cancellation_policy_hours: None,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_item(&mut self, item: OrderItem) {
        self.items.push(item);
        self.updated_at = Utc::now();
    }

    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn total_cents(&self) -> i64 {
        self.items.iter().map(|item| item.total_price_cents).sum()
    }
}

/// Order numbers are `ORD-YYYYMMDD-XXXXXX` with a random six-digit suffix.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("ORD-{}-{:06}", now.format("%Y%m%d"), suffix)
}

/// The customer-facing booking record linking a customer to an appointment.
///
/// At most one record exists per (appointment, customer) pair. The policy
/// triple stored here is a snapshot taken at write time; callers that gate
/// a cancel or reschedule action must recompute it against the current
/// clock instead of trusting storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAppointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub appointment_id: Uuid,
    pub number_of_persons: i32,
    pub total_price_cents: i64,
    pub payment_status: PaymentStatus,
    pub cancellation_policy_hours: i32,
    pub can_cancel: bool,
    pub can_reschedule: bool,
    pub cancellation_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CustomerAppointment {
    /// Build the booking record the reconciler creates for a confirmed
    /// order item, evaluating the cancellation policy at `now`.
    pub fn from_order_item(
        order: &Order,
        item: &OrderItem,
        customer_id: Uuid,
        appointment_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let appointment_id = item.appointment_id.unwrap_or_default();
        let decision =
            policy::evaluate_at(appointment_start, order.cancellation_policy_hours, now);
        Self {
            id: Uuid::new_v4(),
            customer_id,
            appointment_id,
            number_of_persons: 1,
            total_price_cents: item.total_price_cents,
            payment_status: order.payment_status.unwrap_or(PaymentStatus::Pending),
            cancellation_policy_hours: policy::resolve_policy_hours(
                order.cancellation_policy_hours,
            ),
            can_cancel: decision.can_cancel,
            can_reschedule: decision.can_reschedule,
            cancellation_deadline: decision.cancellation_deadline,
            created_at: now,
        }
    }

    /// Recompute the stored policy snapshot against the current clock.
    pub fn refresh_policy(&mut self, appointment_start: DateTime<Utc>, now: DateTime<Utc>) {
        let decision = policy::evaluate_at(
            appointment_start,
            Some(self.cancellation_policy_hours),
            now,
        );
        self.can_cancel = decision.can_cancel;
        self.can_reschedule = decision.can_reschedule;
        self.cancellation_deadline = decision.cancellation_deadline;
    }

    pub fn current_policy(
        &self,
        appointment_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> PolicyDecision {
        policy::evaluate_at(appointment_start, Some(self.cancellation_policy_hours), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("ORD-20240110-"));
        assert_eq!(number.len(), "ORD-20240110-000000".len());
        let suffix = &number["ORD-20240110-".len()..];
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_booking_record_from_order_item() {
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 9, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let customer_id = Uuid::new_v4();

        let mut order = Order::new(Some(customer_id));
        order.payment_status = Some(PaymentStatus::Paid);
        let item = OrderItem::new(
            order.id,
            Uuid::new_v4(),
            "Deep Clean".to_string(),
            Some(Uuid::new_v4()),
            12000,
        );
        order.add_item(item.clone());

        let booking = CustomerAppointment::from_order_item(&order, &item, customer_id, start, now);

        assert_eq!(booking.number_of_persons, 1);
        assert_eq!(booking.total_price_cents, 12000);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.cancellation_policy_hours, 24);
        assert_eq!(booking.cancellation_deadline, start - Duration::hours(24));
        assert!(booking.can_cancel);
        assert!(booking.can_reschedule);
    }

    #[test]
    fn test_booking_record_defaults_payment_to_pending() {
        let now = Utc::now();
        let customer_id = Uuid::new_v4();
        let order = Order::new(Some(customer_id));
        let item = OrderItem::new(
            order.id,
            Uuid::new_v4(),
            "Move-out Clean".to_string(),
            Some(Uuid::new_v4()),
            8000,
        );

        let booking = CustomerAppointment::from_order_item(
            &order,
            &item,
            customer_id,
            now + Duration::days(3),
            now,
        );
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_refresh_policy_goes_stale_to_false() {
        let customer_id = Uuid::new_v4();
        let order = Order::new(Some(customer_id));
        let item = OrderItem::new(
            order.id,
            Uuid::new_v4(),
            "Standard Clean".to_string(),
            Some(Uuid::new_v4()),
            5000,
        );

        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let booked_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut booking =
            CustomerAppointment::from_order_item(&order, &item, customer_id, start, booked_at);
        assert!(booking.can_cancel);

        // The snapshot is stale once the deadline passes.
        let later = Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap();
        booking.refresh_policy(start, later);
        assert!(!booking.can_cancel);
        assert!(!booking.can_reschedule);
    }
}
