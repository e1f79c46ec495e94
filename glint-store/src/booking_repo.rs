use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use glint_booking::models::{CustomerAppointment, PaymentStatus};
use glint_booking::policy::PolicyDecision;
use glint_booking::repository::{CustomerAppointmentRepository, RepoError};

pub struct PgCustomerAppointmentRepository {
    pool: PgPool,
}

impl PgCustomerAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    customer_id: Uuid,
    appointment_id: Uuid,
    number_of_persons: i32,
    total_price_cents: i64,
    payment_status: String,
    cancellation_policy_hours: i32,
    can_cancel: bool,
    can_reschedule: bool,
    cancellation_deadline: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<CustomerAppointment, RepoError> {
        let payment_status: PaymentStatus = self.payment_status.parse()?;
        Ok(CustomerAppointment {
            id: self.id,
            customer_id: self.customer_id,
            appointment_id: self.appointment_id,
            number_of_persons: self.number_of_persons,
            total_price_cents: self.total_price_cents,
            payment_status,
            cancellation_policy_hours: self.cancellation_policy_hours,
            can_cancel: self.can_cancel,
            can_reschedule: self.can_reschedule,
            cancellation_deadline: self.cancellation_deadline,
            created_at: self.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, customer_id, appointment_id, number_of_persons, total_price_cents, payment_status, cancellation_policy_hours, can_cancel, can_reschedule, cancellation_deadline, created_at";

#[async_trait]
impl CustomerAppointmentRepository for PgCustomerAppointmentRepository {
    async fn exists_for(
        &self,
        appointment_id: Uuid,
        customer_id: Uuid,
    ) -> Result<bool, RepoError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM customer_appointments WHERE appointment_id = $1 AND customer_id = $2)",
        )
        .bind(appointment_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, booking: &CustomerAppointment) -> Result<Uuid, RepoError> {
        // The unique (appointment_id, customer_id) index plus DO NOTHING
        // keeps concurrent reconciler runs from racing the existence check.
        sqlx::query(
            r#"
            INSERT INTO customer_appointments
                (id, customer_id, appointment_id, number_of_persons, total_price_cents,
                 payment_status, cancellation_policy_hours, can_cancel, can_reschedule,
                 cancellation_deadline, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (appointment_id, customer_id) DO NOTHING
            "#,
        )
        .bind(booking.id)
        .bind(booking.customer_id)
        .bind(booking.appointment_id)
        .bind(booking.number_of_persons)
        .bind(booking.total_price_cents)
        .bind(booking.payment_status.as_str())
        .bind(booking.cancellation_policy_hours)
        .bind(booking.can_cancel)
        .bind(booking.can_reschedule)
        .bind(booking.cancellation_deadline)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await?;

        Ok(booking.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CustomerAppointment>, RepoError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM customer_appointments WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerAppointment>, RepoError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM customer_appointments WHERE customer_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn update_policy_snapshot(
        &self,
        id: Uuid,
        decision: &PolicyDecision,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE customer_appointments
            SET can_cancel = $1, can_reschedule = $2, cancellation_deadline = $3
            WHERE id = $4
            "#,
        )
        .bind(decision.can_cancel)
        .bind(decision.can_reschedule)
        .bind(decision.cancellation_deadline)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
