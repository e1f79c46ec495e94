//! In-memory store backing tests and local development. Implements every
//! repository trait over RwLock-protected maps; behavior matches the
//! Postgres repositories including (appointment, customer) uniqueness.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use glint_booking::models::{
    Appointment, AppointmentStatus, CompletionPhoto, CustomerAppointment, Order, OrderStatus,
};
use glint_booking::policy::PolicyDecision;
use glint_booking::repository::{
    AppointmentRepository, CustomerAppointmentRepository, OrderRepository, RepoError,
};
use glint_subscription::models::{ChangeRequest, SubscriptionAppointment};
use glint_subscription::repository::{ChangeRequestRepository, SubscriptionAppointmentRepository};

#[derive(Default)]
pub struct MemoryStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    bookings: RwLock<HashMap<Uuid, CustomerAppointment>>,
    visits: RwLock<HashMap<Uuid, SubscriptionAppointment>>,
    change_requests: RwLock<HashMap<Uuid, ChangeRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn create_appointment(&self, appointment: &Appointment) -> Result<Uuid, RepoError> {
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(appointment.id)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, RepoError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, RepoError> {
        let mut matched: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.start_time >= from && a.start_time <= to && statuses.contains(&a.status))
            .cloned()
            .collect();
        matched.sort_by_key(|a| a.start_time);
        Ok(matched)
    }

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<(), RepoError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&id)
            .ok_or_else(|| format!("appointment {} not found", id))?;
        appointment.update_status(status);
        Ok(())
    }

    async fn add_completion_photo(
        &self,
        id: Uuid,
        photo: &CompletionPhoto,
    ) -> Result<(), RepoError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&id)
            .ok_or_else(|| format!("appointment {} not found", id))?;
        appointment.add_completion_photo(photo.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(&self, order: &Order) -> Result<Uuid, RepoError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order.id)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_confirmed_orders(&self) -> Result<Vec<Order>, RepoError> {
        let mut confirmed: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.status == OrderStatus::Confirmed)
            .cloned()
            .collect();
        confirmed.sort_by_key(|o| o.created_at);
        Ok(confirmed)
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), RepoError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| format!("order {} not found", id))?;
        order.update_status(status);
        Ok(())
    }
}

#[async_trait]
impl CustomerAppointmentRepository for MemoryStore {
    async fn exists_for(
        &self,
        appointment_id: Uuid,
        customer_id: Uuid,
    ) -> Result<bool, RepoError> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .any(|b| b.appointment_id == appointment_id && b.customer_id == customer_id))
    }

    async fn create(&self, booking: &CustomerAppointment) -> Result<Uuid, RepoError> {
        let mut bookings = self.bookings.write().await;
        // Same semantics as the unique index + DO NOTHING in Postgres.
        let duplicate = bookings
            .values()
            .any(|b| b.appointment_id == booking.appointment_id && b.customer_id == booking.customer_id);
        if !duplicate {
            bookings.insert(booking.id, booking.clone());
        }
        Ok(booking.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CustomerAppointment>, RepoError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerAppointment>, RepoError> {
        let mut mine: Vec<CustomerAppointment> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn update_policy_snapshot(
        &self,
        id: Uuid,
        decision: &PolicyDecision,
    ) -> Result<(), RepoError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| format!("booking {} not found", id))?;
        booking.can_cancel = decision.can_cancel;
        booking.can_reschedule = decision.can_reschedule;
        booking.cancellation_deadline = decision.cancellation_deadline;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionAppointmentRepository for MemoryStore {
    async fn create(&self, visit: &SubscriptionAppointment) -> Result<Uuid, RepoError> {
        self.visits.write().await.insert(visit.id, visit.clone());
        Ok(visit.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubscriptionAppointment>, RepoError> {
        Ok(self.visits.read().await.get(&id).cloned())
    }

    async fn update_schedule(
        &self,
        id: Uuid,
        scheduled_for: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut visits = self.visits.write().await;
        let visit = visits
            .get_mut(&id)
            .ok_or_else(|| format!("subscription appointment {} not found", id))?;
        visit.scheduled_for = scheduled_for;
        Ok(())
    }
}

#[async_trait]
impl ChangeRequestRepository for MemoryStore {
    async fn create(&self, request: &ChangeRequest) -> Result<Uuid, RepoError> {
        self.change_requests
            .write()
            .await
            .insert(request.id, request.clone());
        Ok(request.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChangeRequest>, RepoError> {
        Ok(self.change_requests.read().await.get(&id).cloned())
    }

    async fn list_for_subscription_appointment(
        &self,
        subscription_appointment_id: Uuid,
    ) -> Result<Vec<ChangeRequest>, RepoError> {
        let mut requests: Vec<ChangeRequest> = self
            .change_requests
            .read()
            .await
            .values()
            .filter(|r| r.subscription_appointment_id == subscription_appointment_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn record_review(&self, request: &ChangeRequest) -> Result<bool, RepoError> {
        let mut requests = self.change_requests.write().await;
        let stored = requests
            .get_mut(&request.id)
            .ok_or_else(|| format!("change request {} not found", request.id))?;
        // Same semantics as the `status = 'PENDING'` predicate in Postgres.
        if stored.is_reviewed() {
            return Ok(false);
        }
        stored.status = request.status;
        stored.reviewed_at = request.reviewed_at;
        stored.reviewed_by = request.reviewed_by;
        stored.review_notes = request.review_notes.clone();
        Ok(true)
    }

    async fn detach_reviewer(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let mut detached = 0;
        for request in self.change_requests.write().await.values_mut() {
            if request.reviewed_by == Some(user_id) {
                request.reviewed_by = None;
                detached += 1;
            }
        }
        Ok(detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use glint_subscription::models::ChangeRequestStatus;

    fn pending_request() -> ChangeRequest {
        ChangeRequest::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            None,
            None,
        )
    }

    fn reviewed(mut request: ChangeRequest, status: ChangeRequestStatus) -> ChangeRequest {
        request.status = status;
        request.reviewed_at = Some(Utc::now());
        request.reviewed_by = Some(Uuid::new_v4());
        request
    }

    #[tokio::test]
    async fn test_record_review_transitions_pending_once() {
        let store = MemoryStore::new();
        let request = pending_request();
        ChangeRequestRepository::create(&store, &request).await.unwrap();

        let approved = reviewed(request.clone(), ChangeRequestStatus::Approved);
        assert!(store.record_review(&approved).await.unwrap());

        let stored = ChangeRequestRepository::get(&store, request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ChangeRequestStatus::Approved);
        assert_eq!(stored.reviewed_by, approved.reviewed_by);
    }

    #[tokio::test]
    async fn test_record_review_does_not_overwrite_terminal_decision() {
        let store = MemoryStore::new();
        let request = pending_request();
        ChangeRequestRepository::create(&store, &request).await.unwrap();

        let approved = reviewed(request.clone(), ChangeRequestStatus::Approved);
        assert!(store.record_review(&approved).await.unwrap());

        // A racing reviewer loses; the first decision is preserved.
        let rejected = reviewed(request.clone(), ChangeRequestStatus::Rejected);
        assert!(!store.record_review(&rejected).await.unwrap());

        let stored = ChangeRequestRepository::get(&store, request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ChangeRequestStatus::Approved);
        assert_eq!(stored.reviewed_by, approved.reviewed_by);
    }

    #[tokio::test]
    async fn test_duplicate_booking_create_is_suppressed() {
        let store = MemoryStore::new();
        let customer_id = Uuid::new_v4();
        let appointment =
            Appointment::new(Uuid::new_v4(), None, Utc::now() + chrono::Duration::days(2));
        store.create_appointment(&appointment).await.unwrap();

        let order = Order::new(Some(customer_id));
        let item = glint_booking::models::OrderItem::new(
            order.id,
            appointment.service_id,
            "Standard Clean".to_string(),
            Some(appointment.id),
            7000,
        );
        let first = CustomerAppointment::from_order_item(
            &order,
            &item,
            customer_id,
            appointment.start_time,
            Utc::now(),
        );
        let mut second = first.clone();
        second.id = Uuid::new_v4();

        CustomerAppointmentRepository::create(&store, &first).await.unwrap();
        CustomerAppointmentRepository::create(&store, &second).await.unwrap();

        assert_eq!(
            store.list_for_customer(customer_id).await.unwrap().len(),
            1
        );
    }
}
