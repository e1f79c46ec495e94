use std::sync::Arc;

use chrono::Utc;
use glint_shared::models::events::BookingCreatedEvent;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{CustomerAppointment, Order, OrderItem};
use crate::repository::{
    AppointmentRepository, CustomerAppointmentRepository, OrderRepository, RepoError,
};

/// Counts reported after a reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub skipped_no_customer: usize,
    pub skipped_has_booking: usize,
    pub errors: usize,
}

/// Backfills missing customer booking records for confirmed orders.
///
/// Idempotent repair job: orders confirmed before booking records existed
/// get one record per (appointment, customer), deduplicated by an
/// existence check. Safe to re-run; a second sweep over the same data
/// creates nothing.
pub struct BookingReconciler {
    orders: Arc<dyn OrderRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    bookings: Arc<dyn CustomerAppointmentRepository>,
}

impl BookingReconciler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        bookings: Arc<dyn CustomerAppointmentRepository>,
    ) -> Self {
        Self {
            orders,
            appointments,
            bookings,
        }
    }

    /// Single synchronous sweep over all confirmed orders. One bad row is
    /// logged and counted, never aborts the batch.
    pub async fn run(&self, dry_run: bool) -> Result<ReconcileSummary, RepoError> {
        let orders = self.orders.list_confirmed_orders().await?;
        let mut summary = ReconcileSummary::default();

        for order in &orders {
            for item in &order.items {
                let Some(appointment_id) = item.appointment_id else {
                    continue;
                };

                match self.reconcile_item(order, item, appointment_id, dry_run).await {
                    Ok(outcome) => match outcome {
                        ItemOutcome::Created => summary.created += 1,
                        ItemOutcome::NoCustomer => summary.skipped_no_customer += 1,
                        ItemOutcome::HasBooking => summary.skipped_has_booking += 1,
                    },
                    Err(e) => {
                        summary.errors += 1;
                        error!(
                            order_number = %order.order_number,
                            appointment_id = %appointment_id,
                            "Failed to reconcile booking record: {}",
                            e
                        );
                    }
                }
            }
        }

        info!(
            dry_run,
            created = summary.created,
            skipped_no_customer = summary.skipped_no_customer,
            skipped_has_booking = summary.skipped_has_booking,
            errors = summary.errors,
            "Booking reconciliation finished"
        );
        Ok(summary)
    }

    async fn reconcile_item(
        &self,
        order: &Order,
        item: &OrderItem,
        appointment_id: Uuid,
        dry_run: bool,
    ) -> Result<ItemOutcome, RepoError> {
        let Some(customer_id) = order.customer_id else {
            // Guest order; booking records are customer-facing only.
            return Ok(ItemOutcome::NoCustomer);
        };

        if self.bookings.exists_for(appointment_id, customer_id).await? {
            return Ok(ItemOutcome::HasBooking);
        }

        let appointment = self
            .appointments
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| format!("appointment {} not found", appointment_id))?;

        let booking = CustomerAppointment::from_order_item(
            order,
            item,
            customer_id,
            appointment.start_time,
            Utc::now(),
        );

        if dry_run {
            warn!(
                order_number = %order.order_number,
                appointment_id = %appointment_id,
                customer_id = %customer_id,
                "[dry-run] would create booking record"
            );
        } else {
            self.bookings.create(&booking).await?;
            let event = BookingCreatedEvent {
                customer_appointment_id: booking.id,
                appointment_id,
                customer_id,
                order_number: Some(order.order_number.clone()),
                timestamp: booking.created_at.timestamp(),
            };
            info!(event = ?event, "Created booking record");
        }

        Ok(ItemOutcome::Created)
    }
}

enum ItemOutcome {
    Created,
    NoCustomer,
    HasBooking,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Appointment, AppointmentStatus, CompletionPhoto, OrderStatus, PaymentStatus,
    };
    use crate::policy::PolicyDecision;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct FakeOrders {
        orders: RwLock<Vec<Order>>,
    }

    #[async_trait]
    impl OrderRepository for FakeOrders {
        async fn create_order(&self, order: &Order) -> Result<Uuid, RepoError> {
            self.orders.write().await.push(order.clone());
            Ok(order.id)
        }

        async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
            Ok(self.orders.read().await.iter().find(|o| o.id == id).cloned())
        }

        async fn list_confirmed_orders(&self) -> Result<Vec<Order>, RepoError> {
            Ok(self
                .orders
                .read()
                .await
                .iter()
                .filter(|o| o.status == OrderStatus::Confirmed)
                .cloned()
                .collect())
        }

        async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), RepoError> {
            for order in self.orders.write().await.iter_mut() {
                if order.id == id {
                    order.status = status;
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAppointments {
        appointments: RwLock<HashMap<Uuid, Appointment>>,
    }

    #[async_trait]
    impl AppointmentRepository for FakeAppointments {
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
            Ok(self
                .appointments
                .read()
                .await
                .values()
                .filter(|a| {
                    a.start_time >= from && a.start_time <= to && statuses.contains(&a.status)
                })
                .cloned()
                .collect())
        }

        async fn update_status(
            &self,
            id: Uuid,
            status: AppointmentStatus,
        ) -> Result<(), RepoError> {
            if let Some(a) = self.appointments.write().await.get_mut(&id) {
                a.status = status;
            }
            Ok(())
        }

        async fn add_completion_photo(
            &self,
            id: Uuid,
            photo: &CompletionPhoto,
        ) -> Result<(), RepoError> {
            if let Some(a) = self.appointments.write().await.get_mut(&id) {
                a.completion_photos.push(photo.clone());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeBookings {
        bookings: RwLock<Vec<CustomerAppointment>>,
    }

    #[async_trait]
    impl CustomerAppointmentRepository for FakeBookings {
        async fn exists_for(
            &self,
            appointment_id: Uuid,
            customer_id: Uuid,
        ) -> Result<bool, RepoError> {
            Ok(self
                .bookings
                .read()
                .await
                .iter()
                .any(|b| b.appointment_id == appointment_id && b.customer_id == customer_id))
        }

        async fn create(&self, booking: &CustomerAppointment) -> Result<Uuid, RepoError> {
            self.bookings.write().await.push(booking.clone());
            Ok(booking.id)
        }

        async fn get(&self, id: Uuid) -> Result<Option<CustomerAppointment>, RepoError> {
            Ok(self.bookings.read().await.iter().find(|b| b.id == id).cloned())
        }

        async fn list_for_customer(
            &self,
            customer_id: Uuid,
        ) -> Result<Vec<CustomerAppointment>, RepoError> {
            Ok(self
                .bookings
                .read()
                .await
                .iter()
                .filter(|b| b.customer_id == customer_id)
                .cloned()
                .collect())
        }

        async fn update_policy_snapshot(
            &self,
            id: Uuid,
            decision: &PolicyDecision,
        ) -> Result<(), RepoError> {
            for b in self.bookings.write().await.iter_mut() {
                if b.id == id {
                    b.can_cancel = decision.can_cancel;
                    b.can_reschedule = decision.can_reschedule;
                    b.cancellation_deadline = decision.cancellation_deadline;
                }
            }
            Ok(())
        }
    }

    struct Harness {
        orders: Arc<FakeOrders>,
        appointments: Arc<FakeAppointments>,
        bookings: Arc<FakeBookings>,
        reconciler: BookingReconciler,
    }

    fn harness() -> Harness {
        let orders = Arc::new(FakeOrders::default());
        let appointments = Arc::new(FakeAppointments::default());
        let bookings = Arc::new(FakeBookings::default());
        let reconciler = BookingReconciler::new(
            orders.clone(),
            appointments.clone(),
            bookings.clone(),
        );
        Harness {
            orders,
            appointments,
            bookings,
            reconciler,
        }
    }

    async fn seed_confirmed_order(h: &Harness, customer_id: Option<Uuid>) -> Order {
        let appointment = Appointment::new(Uuid::new_v4(), None, Utc::now() + Duration::days(5));
        h.appointments.create_appointment(&appointment).await.unwrap();

        let mut order = Order::new(customer_id);
        order.status = OrderStatus::Confirmed;
        order.payment_status = Some(PaymentStatus::Paid);
        let item = OrderItem::new(
            order.id,
            appointment.service_id,
            "Standard Clean".to_string(),
            Some(appointment.id),
            9500,
        );
        order.add_item(item);
        h.orders.create_order(&order).await.unwrap();
        order
    }

    #[tokio::test]
    async fn test_creates_missing_booking_record() {
        let h = harness();
        let customer_id = Uuid::new_v4();
        let order = seed_confirmed_order(&h, Some(customer_id)).await;

        let summary = h.reconciler.run(false).await.unwrap();
        assert_eq!(
            summary,
            ReconcileSummary {
                created: 1,
                ..Default::default()
            }
        );

        let created = h.bookings.list_for_customer(customer_id).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].number_of_persons, 1);
        assert_eq!(created[0].total_price_cents, 9500);
        assert_eq!(created[0].payment_status, PaymentStatus::Paid);
        assert_eq!(created[0].appointment_id, order.items[0].appointment_id.unwrap());
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let h = harness();
        let customer_id = Uuid::new_v4();
        seed_confirmed_order(&h, Some(customer_id)).await;

        let first = h.reconciler.run(false).await.unwrap();
        assert_eq!(first.created, 1);

        let second = h.reconciler.run(false).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped_has_booking, 1);
        assert_eq!(second.errors, 0);

        // Still exactly one record per (appointment, customer).
        assert_eq!(h.bookings.list_for_customer(customer_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_guest_orders_are_skipped() {
        let h = harness();
        seed_confirmed_order(&h, None).await;

        let summary = h.reconciler.run(false).await.unwrap();
        assert_eq!(summary.created, 0);
        assert_eq!(summary.skipped_no_customer, 1);
        assert!(h.bookings.bookings.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_pending_orders_are_not_processed() {
        let h = harness();
        let customer_id = Uuid::new_v4();
        let order = seed_confirmed_order(&h, Some(customer_id)).await;
        h.orders
            .update_order_status(order.id, OrderStatus::Pending)
            .await
            .unwrap();

        let summary = h.reconciler.run(false).await.unwrap();
        assert_eq!(summary, ReconcileSummary::default());
    }

    #[tokio::test]
    async fn test_dry_run_creates_nothing() {
        let h = harness();
        let customer_id = Uuid::new_v4();
        seed_confirmed_order(&h, Some(customer_id)).await;

        let summary = h.reconciler.run(true).await.unwrap();
        assert_eq!(summary.created, 1);
        assert!(h.bookings.bookings.read().await.is_empty());

        // The real run afterwards still creates the record.
        let real = h.reconciler.run(false).await.unwrap();
        assert_eq!(real.created, 1);
    }

    #[tokio::test]
    async fn test_missing_appointment_counts_as_error_and_continues() {
        let h = harness();
        let customer_id = Uuid::new_v4();

        // Order item pointing at an appointment that was never stored.
        let mut broken = Order::new(Some(customer_id));
        broken.status = OrderStatus::Confirmed;
        let item = OrderItem::new(
            broken.id,
            Uuid::new_v4(),
            "Window Clean".to_string(),
            Some(Uuid::new_v4()),
            4000,
        );
        broken.add_item(item);
        h.orders.create_order(&broken).await.unwrap();

        // A healthy order behind it must still be processed.
        seed_confirmed_order(&h, Some(customer_id)).await;

        let summary = h.reconciler.run(false).await.unwrap();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.created, 1);
    }

    #[tokio::test]
    async fn test_items_without_appointment_are_ignored() {
        let h = harness();
        let customer_id = Uuid::new_v4();
        let mut order = Order::new(Some(customer_id));
        order.status = OrderStatus::Confirmed;
        order.add_item(OrderItem::new(
            order.id,
            Uuid::new_v4(),
            "Supplies".to_string(),
            None,
            1500,
        ));
        h.orders.create_order(&order).await.unwrap();

        let summary = h.reconciler.run(false).await.unwrap();
        assert_eq!(summary, ReconcileSummary::default());
    }
}
