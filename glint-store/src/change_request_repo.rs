use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use glint_subscription::models::{ChangeRequest, ChangeRequestStatus, SubscriptionAppointment};
use glint_subscription::repository::{
    ChangeRequestRepository, RepoError, SubscriptionAppointmentRepository,
};

pub struct PgSubscriptionAppointmentRepository {
    pool: PgPool,
}

impl PgSubscriptionAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: Uuid,
    subscription_id: Uuid,
    scheduled_for: DateTime<Utc>,
    can_reschedule: bool,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl SubscriptionAppointmentRepository for PgSubscriptionAppointmentRepository {
    async fn create(&self, visit: &SubscriptionAppointment) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_appointments (id, subscription_id, scheduled_for, can_reschedule, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(visit.id)
        .bind(visit.subscription_id)
        .bind(visit.scheduled_for)
        .bind(visit.can_reschedule)
        .bind(visit.created_at)
        .execute(&self.pool)
        .await?;

        Ok(visit.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubscriptionAppointment>, RepoError> {
        let row = sqlx::query_as::<_, VisitRow>(
            "SELECT id, subscription_id, scheduled_for, can_reschedule, created_at FROM subscription_appointments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| SubscriptionAppointment {
            id: row.id,
            subscription_id: row.subscription_id,
            scheduled_for: row.scheduled_for,
            can_reschedule: row.can_reschedule,
            created_at: row.created_at,
        }))
    }

    async fn update_schedule(
        &self,
        id: Uuid,
        scheduled_for: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        sqlx::query("UPDATE subscription_appointments SET scheduled_for = $1 WHERE id = $2")
            .bind(scheduled_for)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PgChangeRequestRepository {
    pool: PgPool,
}

impl PgChangeRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ChangeRequestRow {
    id: Uuid,
    subscription_appointment_id: Uuid,
    requested_date: NaiveDate,
    requested_time: Option<NaiveTime>,
    reason: Option<String>,
    status: String,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<Uuid>,
    review_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl ChangeRequestRow {
    fn into_request(self) -> Result<ChangeRequest, RepoError> {
        let status: ChangeRequestStatus = self.status.parse()?;
        Ok(ChangeRequest {
            id: self.id,
            subscription_appointment_id: self.subscription_appointment_id,
            requested_date: self.requested_date,
            requested_time: self.requested_time,
            reason: self.reason,
            status,
            reviewed_at: self.reviewed_at,
            reviewed_by: self.reviewed_by,
            review_notes: self.review_notes,
            created_at: self.created_at,
        })
    }
}

const CHANGE_REQUEST_COLUMNS: &str = "id, subscription_appointment_id, requested_date, requested_time, reason, status, reviewed_at, reviewed_by, review_notes, created_at";

#[async_trait]
impl ChangeRequestRepository for PgChangeRequestRepository {
    async fn create(&self, request: &ChangeRequest) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO change_requests
                (id, subscription_appointment_id, requested_date, requested_time, reason,
                 status, reviewed_at, reviewed_by, review_notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id)
        .bind(request.subscription_appointment_id)
        .bind(request.requested_date)
        .bind(request.requested_time)
        .bind(&request.reason)
        .bind(request.status.as_str())
        .bind(request.reviewed_at)
        .bind(request.reviewed_by)
        .bind(&request.review_notes)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(request.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChangeRequest>, RepoError> {
        let row = sqlx::query_as::<_, ChangeRequestRow>(&format!(
            "SELECT {} FROM change_requests WHERE id = $1",
            CHANGE_REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChangeRequestRow::into_request).transpose()
    }

    async fn list_for_subscription_appointment(
        &self,
        subscription_appointment_id: Uuid,
    ) -> Result<Vec<ChangeRequest>, RepoError> {
        let rows = sqlx::query_as::<_, ChangeRequestRow>(&format!(
            r#"
            SELECT {}
            FROM change_requests
            WHERE subscription_appointment_id = $1
            ORDER BY created_at DESC
            "#,
            CHANGE_REQUEST_COLUMNS
        ))
        .bind(subscription_appointment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChangeRequestRow::into_request).collect()
    }

    async fn record_review(&self, request: &ChangeRequest) -> Result<bool, RepoError> {
        // The status predicate makes the transition atomic; zero rows means
        // another reviewer got there first.
        let result = sqlx::query(
            r#"
            UPDATE change_requests
            SET status = $1, reviewed_at = $2, reviewed_by = $3, review_notes = $4
            WHERE id = $5 AND status = 'PENDING'
            "#,
        )
        .bind(request.status.as_str())
        .bind(request.reviewed_at)
        .bind(request.reviewed_by)
        .bind(&request.review_notes)
        .bind(request.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn detach_reviewer(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let result =
            sqlx::query("UPDATE change_requests SET reviewed_by = NULL WHERE reviewed_by = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
